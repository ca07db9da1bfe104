use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::PathBuf;
use tagpairs::{extract, Job, JobConfig, OutputFormat};
use tracing::{debug, error, trace};

/// Count hashtag co-occurrence pairs in tweet corpora
#[derive(Parser)]
#[command(name = "tagpairs")]
#[command(about = "Count hashtag co-occurrence pairs across tweet corpora", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a co-occurrence job over input files or directories
    Run {
        /// Input files or directories (walked recursively)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory for part files
        #[arg(short, long)]
        output: PathBuf,

        /// Path to a TOML job configuration
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Keep pairs whose total is strictly greater than this
        #[arg(long)]
        threshold: Option<u64>,

        /// Combine map output before the shuffle
        #[arg(long, overrides_with = "no_combine")]
        combine: bool,

        /// Disable partial aggregation even if the config enables it
        #[arg(long, overrides_with = "combine")]
        no_combine: bool,

        /// Number of reduce partitions
        #[arg(short = 'r', long)]
        reducers: Option<usize>,

        /// Maximum number of concurrent tasks
        #[arg(short = 'j', long)]
        max_parallel: Option<usize>,

        /// Output format for part files
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Replace the output directory if it exists
        #[arg(long, overrides_with = "no_overwrite")]
        overwrite: bool,

        /// Refuse an existing output directory even if the config allows replacing it
        #[arg(long, overrides_with = "overwrite")]
        no_overwrite: bool,

        /// Print the job summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the pair keys contributed by each record (reads stdin if none given)
    Extract {
        /// Records to extract from
        records: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2) // Show target module for -vv and above
        .with_thread_ids(cli.verbose >= 3) // Show thread IDs for -vvv
        .with_line_number(cli.verbose >= 3) // Show line numbers for -vvv
        .init();

    debug!("tagpairs started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    let result = match cli.command {
        Commands::Run {
            inputs,
            output,
            config,
            threshold,
            combine,
            no_combine,
            reducers,
            max_parallel,
            format,
            overwrite,
            no_overwrite,
            json,
        } => {
            let overrides = RunOverrides {
                threshold,
                combine: flag(combine, no_combine),
                reducers,
                max_parallel,
                format,
                overwrite: flag(overwrite, no_overwrite),
            };
            run_job(inputs, output, config, overrides, json).await
        }
        Commands::Extract { records } => run_extract(records),
    };

    if let Err(e) = result {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Resolve a `--x`/`--no-x` pair; `None` leaves the configured value alone
fn flag(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

struct RunOverrides {
    threshold: Option<u64>,
    combine: Option<bool>,
    reducers: Option<usize>,
    max_parallel: Option<usize>,
    format: Option<OutputFormat>,
    overwrite: Option<bool>,
}

impl RunOverrides {
    fn apply(self, config: &mut JobConfig) {
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(combine) = self.combine {
            config.enable_partial_aggregation = combine;
        }
        if let Some(reducers) = self.reducers {
            config.reducers = reducers;
        }
        if let Some(max_parallel) = self.max_parallel {
            config.max_parallel = max_parallel;
        }
        if let Some(format) = self.format {
            config.output_format = format;
        }
        if let Some(overwrite) = self.overwrite {
            config.overwrite = overwrite;
        }
    }
}

async fn run_job(
    inputs: Vec<PathBuf>,
    output: PathBuf,
    config_path: Option<PathBuf>,
    overrides: RunOverrides,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = match config_path {
        Some(path) => JobConfig::load(&path).await?,
        None => JobConfig::default(),
    };
    config.merge_env_vars()?;
    overrides.apply(&mut config);
    debug!("Job configuration: {:?}", config);

    let job = Job::new(config)?;
    let summary = job.run(&inputs, &output).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
    }
    Ok(())
}

fn run_extract(records: Vec<String>) -> anyhow::Result<()> {
    if !records.is_empty() {
        for record in &records {
            print_pairs(record);
        }
        return Ok(());
    }

    for line in std::io::stdin().lock().lines() {
        print_pairs(&line?);
    }
    Ok(())
}

fn print_pairs(record: &str) {
    for (key, value) in extract(record) {
        println!("{key}\t{value}");
    }
}
