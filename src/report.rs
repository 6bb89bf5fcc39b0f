//! Error classification and reporting
//!
//! Every call site that absorbs an error instead of propagating it goes
//! through [`report_error`], so each failure is classified and logged the
//! same way.

use crate::ScrapeError;
use std::fmt;
use std::io::ErrorKind;

/// Message fragment that identifies an unreachable storage service
pub const OUTAGE_SIGNATURE: &str = "Can't connect to";

/// Broad class of a failure, deciding how far it propagates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Fetch retries exhausted; the endpoint is skipped
    TransientFetch,

    /// Endpoints could not be obtained; the category aborts
    Discovery,

    /// One product block is incomplete; only that product is skipped
    PartialExtraction,

    /// A page could not be extracted; only that page is lost
    StructuralExtraction,

    /// A file operation failed; only that write call is lost
    Persistence,

    /// Invalid configuration or URL
    Configuration,

    /// Task or state machine failure
    Internal,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransientFetch => "transient_fetch",
            Self::Discovery => "discovery",
            Self::PartialExtraction => "partial_extraction",
            Self::StructuralExtraction => "structural_extraction",
            Self::Persistence => "persistence",
            Self::Configuration => "configuration",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Maps an error onto its class
pub fn classify(err: &ScrapeError) -> ErrorClass {
    match err {
        ScrapeError::FetchExhausted { .. } => ErrorClass::TransientFetch,
        ScrapeError::Discovery(_) => ErrorClass::Discovery,
        ScrapeError::Extraction { source, .. } if source.is_partial() => {
            ErrorClass::PartialExtraction
        }
        ScrapeError::Extraction { .. } => ErrorClass::StructuralExtraction,
        ScrapeError::Storage(_) => ErrorClass::Persistence,
        ScrapeError::Config(_) | ScrapeError::UrlError(_) | ScrapeError::Reqwest(_) => {
            ErrorClass::Configuration
        }
        ScrapeError::InvalidTransition { .. } | ScrapeError::Join(_) => ErrorClass::Internal,
    }
}

/// Returns true if the error means the storage backend is unreachable
pub fn is_connectivity_outage(err: &ScrapeError) -> bool {
    let ScrapeError::Storage(storage) = err else {
        return false;
    };

    let kind_matches = matches!(
        storage.io_kind(),
        Some(
            ErrorKind::ConnectionRefused
                | ErrorKind::ConnectionReset
                | ErrorKind::NotConnected
                | ErrorKind::TimedOut
        )
    );

    kind_matches || storage.to_string().contains(OUTAGE_SIGNATURE)
}

/// Classifies an absorbed error and logs it
///
/// A storage outage additionally prints one operator-facing line to stderr.
/// The caller decides what "nothing usable" means for its own operation.
///
/// # Arguments
///
/// * `context` - What was being done, e.g. the endpoint URL
/// * `err` - The error being absorbed
///
/// # Returns
///
/// The error's class
pub fn report_error(context: &str, err: &ScrapeError) -> ErrorClass {
    let class = classify(err);

    match class {
        ErrorClass::TransientFetch | ErrorClass::PartialExtraction => {
            tracing::warn!("[{}] {}: {}", class, context, err);
        }
        _ => {
            tracing::error!("[{}] {}: {}", class, context, err);
        }
    }

    if is_connectivity_outage(err) {
        eprintln!(
            "Storage is unreachable while {}. Check that the data volume is mounted and reachable.",
            context
        );
    }

    class
}
