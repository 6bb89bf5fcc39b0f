//! Durable endpoint list for one dataset category
//!
//! The endpoint file is a CSV with an `endpoint` column. Once it holds at
//! least one row it is trusted as-is; discovery only runs again when the file
//! is missing or empty, or after an explicit reset.

use crate::crawler::DiscoveryError;
use crate::model::{Endpoint, EndpointRow};
use crate::storage::traits::{StorageError, StorageResult};
use crate::storage::writer::{append_records, clear_file, AppendSummary, NO_DATA_SENTINEL};
use crate::url::{is_valid_url, page_number};
use crate::ScrapeError;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

const ENDPOINT_COLUMN: &str = "endpoint";

/// Outcome of reading the endpoint file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointLoad {
    /// No usable rows yet; discovery has to run
    EmptyOrMissing,

    /// Valid endpoints in stored order
    Loaded(Vec<Endpoint>),
}

/// Endpoint persistence for a single category
#[derive(Debug, Clone)]
pub struct EndpointStore {
    path: PathBuf,
    chunk_size: usize,
}

impl EndpointStore {
    pub fn new(path: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            path: path.into(),
            chunk_size,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored endpoints
    ///
    /// Rows whose URL is not syntactically valid are dropped with a warning.
    ///
    /// # Returns
    ///
    /// * `Ok(EndpointLoad::EmptyOrMissing)` - File missing, empty, or holding
    ///   no endpoint rows
    /// * `Ok(EndpointLoad::Loaded(..))` - At least one valid endpoint
    /// * `Err(ScrapeError::Discovery(NoValidEndpoints))` - Rows exist but none
    ///   is a valid URL
    /// * `Err(ScrapeError::Storage(..))` - The file could not be read or parsed
    pub fn load(&self) -> Result<EndpointLoad, ScrapeError> {
        let candidates = match self.read_rows()? {
            Some(rows) if !rows.is_empty() => rows,
            _ => return Ok(EndpointLoad::EmptyOrMissing),
        };

        let total = candidates.len();
        let endpoints: Vec<Endpoint> = candidates
            .into_iter()
            .enumerate()
            .filter_map(|(position, url)| {
                if is_valid_url(&url) {
                    let page = page_number(&url).unwrap_or(position as u32 + 1);
                    Some(Endpoint::new(url, page))
                } else {
                    tracing::warn!(
                        "Dropping invalid endpoint '{}' from {}",
                        url,
                        self.path.display()
                    );
                    None
                }
            })
            .collect();

        if endpoints.is_empty() {
            return Err(DiscoveryError::NoValidEndpoints {
                path: self.path.clone(),
            }
            .into());
        }

        tracing::info!(
            "Loaded {} of {} endpoints from {}",
            endpoints.len(),
            total,
            self.path.display()
        );

        Ok(EndpointLoad::Loaded(endpoints))
    }

    /// Appends endpoints to the store
    pub fn save(&self, endpoints: &[Endpoint]) -> StorageResult<AppendSummary> {
        let rows: Vec<EndpointRow> = endpoints.iter().map(EndpointRow::from).collect();
        append_records(&self.path, &rows, self.chunk_size)
    }

    /// Truncates the store so the next load triggers discovery
    pub fn clear(&self) -> StorageResult<()> {
        clear_file(&self.path)
    }

    /// Reads raw URL cells; `None` when the file does not exist
    fn read_rows(&self) -> StorageResult<Option<Vec<String>>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut column: Option<usize> = None;
        let mut rows = Vec::new();

        for result in reader.records() {
            let record = result.map_err(|e| StorageError::csv(&self.path, e))?;

            if record.len() == 1 && record[0].trim() == NO_DATA_SENTINEL {
                continue;
            }

            match column {
                None => {
                    let index = record
                        .iter()
                        .position(|field| field.trim() == ENDPOINT_COLUMN)
                        .ok_or_else(|| StorageError::MissingColumn {
                            path: self.path.clone(),
                            column: ENDPOINT_COLUMN,
                        })?;
                    column = Some(index);
                }
                Some(index) => {
                    if let Some(value) = record.get(index) {
                        let value = value.trim();
                        if !value.is_empty() && value != ENDPOINT_COLUMN {
                            rows.push(value.to_string());
                        }
                    }
                }
            }
        }

        Ok(Some(rows))
    }
}
