//! Chunked, append-only CSV writer
//!
//! Records are appended in fixed-size chunks. The header row is written at
//! most once per file: only when the file has no header yet at the time of
//! the call, and only in the first chunk of that call.

use crate::storage::traits::{CsvRecord, StorageError, StorageResult};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Line appended when a write call receives no records
pub const NO_DATA_SENTINEL: &str = "Operation completed - no data returned.";

/// Default number of records per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// What a single append call did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppendSummary {
    /// Data rows written (header excluded)
    pub rows_written: usize,

    /// Number of chunks flushed
    pub chunks: usize,

    /// Whether this call emitted the header row
    pub header_written: bool,
}

/// Appends `records` to the CSV file at `path`
///
/// # Behaviour
///
/// - The parent directory is created if needed.
/// - An empty batch appends [`NO_DATA_SENTINEL`] and never a header.
/// - A non-empty batch writes the header only if the file has none yet
///   (missing, zero-length, or holding nothing but sentinel lines).
/// - A file that is not zero-length but holds only sentinel or blank lines
///   still counts as headerless, so the first real batch adds the header.
/// - Records are written in chunks of `chunk_size`, each flushed before the
///   next one starts.
///
/// # Arguments
///
/// * `path` - Target file
/// * `records` - Rows to append, in order
/// * `chunk_size` - Rows per chunk (values below 1 are treated as 1)
///
/// # Returns
///
/// * `Ok(AppendSummary)` - What was written
/// * `Err(StorageError)` - Directory creation or file I/O failed
pub fn append_records<T: CsvRecord>(
    path: &Path,
    records: &[T],
    chunk_size: usize,
) -> StorageResult<AppendSummary> {
    ensure_parent_dir(path)?;

    if records.is_empty() {
        let mut file = open_append(path)?;
        writeln!(file, "{}", NO_DATA_SENTINEL).map_err(|e| StorageError::io(path, e))?;
        tracing::info!("Transaction completed {} (no data)", path.display());
        return Ok(AppendSummary::default());
    }

    let header_needed = needs_header(path)?;
    let file = open_append(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    let mut summary = AppendSummary::default();

    for (index, chunk) in records.chunks(chunk_size.max(1)).enumerate() {
        if header_needed && index == 0 {
            writer
                .write_record(T::HEADER)
                .map_err(|e| StorageError::csv(path, e))?;
            summary.header_written = true;
        }

        for record in chunk {
            writer
                .serialize(record)
                .map_err(|e| StorageError::csv(path, e))?;
        }
        writer.flush().map_err(|e| StorageError::io(path, e))?;

        summary.rows_written += chunk.len();
        summary.chunks += 1;
        tracing::debug!("Chunk {} written to {}", index + 1, path.display());
    }

    Ok(summary)
}

/// Truncates a file to zero length, leaving missing files alone
///
/// This is the explicit reset used before a from-scratch run.
pub fn clear_file(path: &Path) -> StorageResult<()> {
    if path.is_file() {
        File::create(path).map_err(|e| StorageError::io(path, e))?;
        tracing::info!("Cleared contents of {}", path.display());
    } else {
        tracing::debug!("Nothing to clear, {} does not exist", path.display());
    }
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> StorageResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| StorageError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })
        }
        _ => Ok(()),
    }
}

fn open_append(path: &Path) -> StorageResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| StorageError::io(path, e))
}

/// True when the file does not yet contain any structured row
fn needs_header(path: &Path) -> StorageResult<bool> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(StorageError::io(path, e)),
    };

    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| StorageError::io(path, e))?;
        let line = line.trim();
        if line.is_empty() || line == NO_DATA_SENTINEL {
            continue;
        }
        return Ok(false);
    }

    Ok(true)
}

/// Appends records to one file with a fixed chunk size
#[derive(Debug, Clone)]
pub struct ChunkedAppendWriter {
    path: PathBuf,
    chunk_size: usize,
}

impl ChunkedAppendWriter {
    pub fn new(path: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            path: path.into(),
            chunk_size,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append<T: CsvRecord>(&self, records: &[T]) -> StorageResult<AppendSummary> {
        append_records(&self.path, records, self.chunk_size)
    }
}

/// A writer shared between concurrent tasks
///
/// Every append to the underlying file goes through one mutex, so rows from
/// different tasks never interleave mid-chunk.
#[derive(Debug, Clone)]
pub struct SharedWriter {
    inner: Arc<Mutex<ChunkedAppendWriter>>,
    path: PathBuf,
}

impl SharedWriter {
    pub fn new(writer: ChunkedAppendWriter) -> Self {
        let path = writer.path().to_path_buf();
        Self {
            inner: Arc::new(Mutex::new(writer)),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append<T: CsvRecord>(&self, records: &[T]) -> StorageResult<AppendSummary> {
        let writer = self
            .inner
            .lock()
            .map_err(|_| StorageError::Poisoned(self.path.clone()))?;
        writer.append(records)
    }
}
