/// Pipeline state definitions for one category run
///
/// A run moves `Idle -> EndpointsReady -> Fetching -> Done`. `Skipped` and
/// `Failed` are absorbing and may be entered from any non-terminal state
/// that allows them.
use std::fmt;

/// Represents where a category run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    // ===== Active States =====
    /// Nothing done yet
    Idle,

    /// Endpoints loaded or discovered, nothing fetched
    EndpointsReady,

    /// Endpoint tasks are running
    Fetching,

    // ===== Terminal States =====
    /// Every scheduled endpoint task finished
    Done,

    /// The category is disabled
    Skipped,

    /// Endpoints could not be obtained
    Failed,
}

impl PipelineState {
    /// Returns true if the run cannot move any further
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Skipped | Self::Failed)
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;

        matches!(
            (self, next),
            (Idle, EndpointsReady)
                | (Idle, Skipped)
                | (Idle, Failed)
                | (EndpointsReady, Fetching)
                | (EndpointsReady, Done)
                | (EndpointsReady, Failed)
                | (Fetching, Done)
        )
    }

    /// Lower-case name used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::EndpointsReady => "endpoints_ready",
            Self::Fetching => "fetching",
            Self::Done => "done",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::EndpointsReady,
            Self::Fetching,
            Self::Done,
            Self::Skipped,
            Self::Failed,
        ]
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
