//! Output module for run reports
//!
//! This module handles:
//! - Counting what each category run did
//! - Aggregating category runs into one summary
//! - Printing the summary at the end of a run

mod summary;

pub use summary::{print_summary, CategoryReport, EndpointOutcome, RunOutcome, RunSummary};
