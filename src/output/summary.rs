//! Per-category run reports and the end-of-run summary

use crate::state::PipelineState;

/// What happened to one endpoint task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointOutcome {
    /// Page fetched, extracted and written
    Written { records: usize },

    /// Every fetch attempt failed
    FetchFailed,

    /// The page was fetched but could not be turned into records
    ExtractionFailed,

    /// Records were extracted but the append failed
    WriteFailed,
}

/// Counters for one category run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryReport {
    pub endpoints_scheduled: usize,
    pub endpoints_fetched: usize,
    pub endpoints_failed: usize,
    pub pages_failed_extraction: usize,
    pub pages_failed_write: usize,
    pub records_written: usize,
}

impl CategoryReport {
    /// Folds one endpoint outcome into the counters
    pub fn record(&mut self, outcome: &EndpointOutcome) {
        match outcome {
            EndpointOutcome::Written { records } => {
                self.endpoints_fetched += 1;
                self.records_written += records;
            }
            EndpointOutcome::FetchFailed => self.endpoints_failed += 1,
            EndpointOutcome::ExtractionFailed => {
                self.endpoints_fetched += 1;
                self.pages_failed_extraction += 1;
            }
            EndpointOutcome::WriteFailed => {
                self.endpoints_fetched += 1;
                self.pages_failed_write += 1;
            }
        }
    }

    fn add(&mut self, other: &CategoryReport) {
        self.endpoints_scheduled += other.endpoints_scheduled;
        self.endpoints_fetched += other.endpoints_fetched;
        self.endpoints_failed += other.endpoints_failed;
        self.pages_failed_extraction += other.pages_failed_extraction;
        self.pages_failed_write += other.pages_failed_write;
        self.records_written += other.records_written;
    }
}

/// Final result of one category run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub category: String,
    pub state: PipelineState,
    pub report: CategoryReport,

    /// Why the run failed, when `state` is `Failed`
    pub failure: Option<String>,
}

impl RunOutcome {
    pub fn new(category: impl Into<String>, state: PipelineState) -> Self {
        Self {
            category: category.into(),
            state,
            report: CategoryReport::default(),
            failure: None,
        }
    }
}

/// Aggregate over every category of a run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub outcomes: Vec<RunOutcome>,
    pub totals: CategoryReport,
    pub categories_done: usize,
    pub categories_skipped: usize,
    pub categories_failed: usize,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: Vec<RunOutcome>) -> Self {
        let mut summary = Self::default();

        for outcome in &outcomes {
            summary.totals.add(&outcome.report);
            match outcome.state {
                PipelineState::Done => summary.categories_done += 1,
                PipelineState::Skipped => summary.categories_skipped += 1,
                PipelineState::Failed => summary.categories_failed += 1,
                _ => {}
            }
        }

        summary.outcomes = outcomes;
        summary
    }

    /// True when no category failed
    pub fn is_success(&self) -> bool {
        self.categories_failed == 0
    }
}

/// Prints the summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The summary to display
pub fn print_summary(summary: &RunSummary) {
    println!("=== Scrape Summary ===\n");

    for outcome in &summary.outcomes {
        println!("{} [{}]", outcome.category, outcome.state);
        if let Some(failure) = &outcome.failure {
            println!("  Failure: {}", failure);
        }
        if outcome.state == PipelineState::Skipped {
            println!();
            continue;
        }

        let report = &outcome.report;
        println!("  Endpoints scheduled: {}", report.endpoints_scheduled);
        println!("  Endpoints fetched: {}", report.endpoints_fetched);
        println!("  Endpoints failed: {}", report.endpoints_failed);
        if report.pages_failed_extraction > 0 {
            println!("  Pages failed extraction: {}", report.pages_failed_extraction);
        }
        if report.pages_failed_write > 0 {
            println!("  Pages failed write: {}", report.pages_failed_write);
        }
        println!("  Records written: {}", report.records_written);
        println!();
    }

    let totals = &summary.totals;
    let success_rate = if totals.endpoints_scheduled > 0 {
        (totals.endpoints_fetched as f64 / totals.endpoints_scheduled as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Categories: {} done, {} skipped, {} failed",
        summary.categories_done, summary.categories_skipped, summary.categories_failed
    );
    println!(
        "Fetch Rate: {:.1}% ({} / {} endpoints fetched)",
        success_rate, totals.endpoints_fetched, totals.endpoints_scheduled
    );
    println!("Records written: {}", totals.records_written);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_outcomes() {
        let mut report = CategoryReport {
            endpoints_scheduled: 4,
            ..CategoryReport::default()
        };

        report.record(&EndpointOutcome::Written { records: 25 });
        report.record(&EndpointOutcome::Written { records: 10 });
        report.record(&EndpointOutcome::FetchFailed);
        report.record(&EndpointOutcome::ExtractionFailed);

        assert_eq!(report.endpoints_fetched, 3);
        assert_eq!(report.endpoints_failed, 1);
        assert_eq!(report.pages_failed_extraction, 1);
        assert_eq!(report.records_written, 35);
    }

    #[test]
    fn test_summary_aggregates_categories() {
        let mut guitars = RunOutcome::new("electric-guitars", PipelineState::Done);
        guitars.report.endpoints_scheduled = 3;
        guitars.report.record(&EndpointOutcome::Written { records: 25 });

        let synths = RunOutcome::new("synthesizers", PipelineState::Skipped);

        let mut drums = RunOutcome::new("drums", PipelineState::Failed);
        drums.failure = Some("count not found".to_string());

        let summary = RunSummary::from_outcomes(vec![guitars, synths, drums]);

        assert_eq!(summary.categories_done, 1);
        assert_eq!(summary.categories_skipped, 1);
        assert_eq!(summary.categories_failed, 1);
        assert_eq!(summary.totals.endpoints_scheduled, 3);
        assert_eq!(summary.totals.records_written, 25);
        assert!(!summary.is_success());
        assert_eq!(summary.outcomes[0].category, "electric-guitars");
    }
}
