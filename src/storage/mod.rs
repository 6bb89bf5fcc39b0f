//! Storage module for persisting scrape data
//!
//! This module handles every file the scraper touches:
//! - Chunked, append-only CSV writing with a once-per-file header
//! - The per-category endpoint list and its reload/validation rules
//! - Explicit reset of category files before a from-scratch run

mod endpoints;
mod traits;
mod writer;

pub use endpoints::{EndpointLoad, EndpointStore};
pub use traits::{CsvRecord, StorageError, StorageResult};
pub use writer::{
    append_records, clear_file, AppendSummary, ChunkedAppendWriter, SharedWriter,
    DEFAULT_CHUNK_SIZE, NO_DATA_SENTINEL,
};

use crate::config::CategoryConfig;
use std::path::Path;

/// Clears the endpoint and record files of a category
///
/// # Arguments
///
/// * `category` - The category whose files are reset
///
/// # Returns
///
/// * `Ok(())` - Both files are now empty or absent
/// * `Err(StorageError)` - A file could not be truncated
pub fn clear_category_files(category: &CategoryConfig) -> StorageResult<()> {
    tracing::info!("Clearing stored data for category '{}'", category.name);
    clear_file(Path::new(&category.endpoints_path))?;
    clear_file(Path::new(&category.records_path))?;
    Ok(())
}
