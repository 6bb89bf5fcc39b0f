//! State module for tracking category runs
//!
//! # Components
//!
//! - `PipelineState`: Lifecycle of one category run (idle, endpoints ready,
//!   fetching, done, skipped, failed)

mod pipeline_state;

pub use pipeline_state::PipelineState;
