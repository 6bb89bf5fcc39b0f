//! Storage traits and error types
//!
//! This module defines the row trait implemented by everything the storage
//! layer persists, and the errors raised by file operations.

use serde::Serialize;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("IO error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("CSV error on {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("Missing '{column}' column in {path}")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("Writer for {0} was poisoned by a panicking task")]
    Poisoned(PathBuf),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    /// Returns the underlying I/O error kind, if this error came from the OS
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::CreateDir { source, .. } | Self::Io { source, .. } => Some(source.kind()),
            Self::Csv { source, .. } => match source.kind() {
                csv::ErrorKind::Io(e) => Some(e.kind()),
                _ => None,
            },
            Self::MissingColumn { .. } | Self::Poisoned(_) => None,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A row type that can be appended to a delimited file
///
/// The header is written by the storage layer, not by serde, so that it is
/// emitted at most once per file no matter how many appends happen.
pub trait CsvRecord: Serialize {
    /// Column names, in serialization order
    const HEADER: &'static [&'static str];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_kind_from_io_error() {
        let err = StorageError::io(
            "data/records.csv",
            io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        );
        assert_eq!(err.io_kind(), Some(io::ErrorKind::ConnectionRefused));
    }

    #[test]
    fn test_io_kind_absent_for_format_errors() {
        let err = StorageError::MissingColumn {
            path: PathBuf::from("endpoints.csv"),
            column: "endpoint",
        };
        assert_eq!(err.io_kind(), None);
        assert!(err.to_string().contains("endpoint"));
    }
}
