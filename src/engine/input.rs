//! Input discovery and record reading
//!
//! Every input file is one split. Directories are walked recursively, hidden
//! and underscore-prefixed files (`_SUCCESS`, `_SUMMARY.json`, `.crc`) are
//! skipped, and `.gz` files are decompressed on the fly.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One unit of map-phase input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSplit {
    /// A text file, one record per line
    File(PathBuf),
    /// Records already held in memory
    Records { id: usize, records: Vec<String> },
}

impl InputSplit {
    /// Cut an in-memory record list into splits of at most `size` records
    pub fn chunked(records: Vec<String>, size: usize) -> Vec<InputSplit> {
        let size = size.max(1);
        let mut splits = Vec::with_capacity(records.len().div_ceil(size));
        let mut records = records.into_iter().peekable();
        while records.peek().is_some() {
            let chunk: Vec<String> = records.by_ref().take(size).collect();
            splits.push(InputSplit::Records {
                id: splits.len(),
                records: chunk,
            });
        }
        splits
    }

    /// Human-readable name for logs
    pub fn name(&self) -> String {
        match self {
            InputSplit::File(path) => path.display().to_string(),
            InputSplit::Records { id, records } => {
                format!("memory:{id} ({} records)", records.len())
            }
        }
    }

    /// Feed every record of the split to `handle`, returning how many were read
    pub fn for_each_record<F>(&self, mut handle: F) -> Result<u64>
    where
        F: FnMut(&str),
    {
        match self {
            InputSplit::Records { records, .. } => {
                for record in records {
                    handle(record);
                }
                Ok(records.len() as u64)
            }
            InputSplit::File(path) => {
                let mut reader = open_reader(path)?;
                read_lines(path, &mut reader, handle)
            }
        }
    }
}

fn open_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let reader: Box<dyn Read> = if is_gzip(path) {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(Box::new(BufReader::new(reader)))
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Read one record into `buf`, returning `false` at end of input
///
/// A record ends at LF, CR or CRLF; the terminator is not kept.
fn read_record<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<bool>
where
    R: BufRead + ?Sized,
{
    let mut read_any = false;
    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Ok(read_any);
        }
        read_any = true;

        match available.iter().position(|b| *b == b'\n' || *b == b'\r') {
            Some(end) => {
                let terminator = available[end];
                buf.extend_from_slice(&available[..end]);
                reader.consume(end + 1);
                // CRLF counts as one terminator, even across a buffer boundary
                if terminator == b'\r' && reader.fill_buf()?.first() == Some(&b'\n') {
                    reader.consume(1);
                }
                return Ok(true);
            }
            None => {
                let len = available.len();
                buf.extend_from_slice(available);
                reader.consume(len);
            }
        }
    }
}

fn read_lines<R, F>(path: &Path, reader: &mut R, mut handle: F) -> Result<u64>
where
    R: BufRead + ?Sized,
    F: FnMut(&str),
{
    let mut buf = Vec::new();
    let mut line_no = 0u64;
    loop {
        buf.clear();
        if !read_record(reader, &mut buf)? {
            break;
        }
        line_no += 1;

        let line = std::str::from_utf8(&buf).map_err(|_| Error::Decode {
            path: path.to_path_buf(),
            line: line_no,
        })?;
        handle(line);
    }
    Ok(line_no)
}

fn is_ignored(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.') || name.starts_with('_'))
}

/// Expand input paths into file splits, sorted for a stable processing order
pub fn discover_splits(inputs: &[PathBuf]) -> Result<Vec<InputSplit>> {
    collect_splits(inputs, None)
}

/// Like [`discover_splits`], but never descends into `excluded`
///
/// Keeps a job's own output directory out of its input when the output sits
/// inside an input directory. An input inside `excluded` is an error, since
/// replacing the output would delete it.
pub fn discover_splits_excluding(inputs: &[PathBuf], excluded: &Path) -> Result<Vec<InputSplit>> {
    match excluded.canonicalize() {
        Ok(excluded) => collect_splits(inputs, Some(&excluded)),
        // Nothing to skip when the directory doesn't exist yet
        Err(_) => collect_splits(inputs, None),
    }
}

fn is_within(path: &Path, excluded: Option<&Path>) -> bool {
    match (excluded, path.canonicalize()) {
        (Some(excluded), Ok(path)) => path.starts_with(excluded),
        _ => false,
    }
}

fn collect_splits(inputs: &[PathBuf], excluded: Option<&Path>) -> Result<Vec<InputSplit>> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.exists() {
            return Err(Error::InputNotFound(input.clone()));
        }
        if let Some(output) = excluded {
            if is_within(input, Some(output)) {
                return Err(Error::InputInsideOutput {
                    input: input.clone(),
                    output: output.to_path_buf(),
                });
            }
        }

        if input.is_file() {
            files.push(input.clone());
            continue;
        }

        let walker = WalkDir::new(input)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| {
                !(entry.file_type().is_dir() && is_within(entry.path(), excluded))
            });
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() && !is_ignored(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files.into_iter().map(InputSplit::File).collect())
}
