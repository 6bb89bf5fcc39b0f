//! Scrape coordinator - per-category pipeline orchestration
//!
//! This module drives one category through its run:
//! - Honouring `run-scraper` and the explicit reset (`--fresh`)
//! - Loading stored endpoints, or discovering them from the seed page
//! - Applying the depth limit
//! - Fetching, extracting and appending every endpoint under the
//!   concurrency ceiling
//! - Reporting what happened

use crate::config::{CategoryConfig, Config};
use crate::crawler::fetcher::{FetchPolicy, FetchResult, RenderedPageFetcher};
use crate::crawler::pagination::{count_strategies, DiscoveryError, PaginationDiscoverer};
use crate::crawler::parser::RecordExtractor;
use crate::crawler::render::{HttpRenderer, PageRenderer};
use crate::crawler::scheduler::{select_endpoints, AdmissionGate};
use crate::model::Endpoint;
use crate::output::{CategoryReport, EndpointOutcome, RunOutcome, RunSummary};
use crate::report::report_error;
use crate::state::PipelineState;
use crate::storage::{
    clear_category_files, ChunkedAppendWriter, EndpointLoad, EndpointStore, SharedWriter,
};
use crate::{ConfigError, ScrapeError};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Per-invocation switches
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Clear category files before running
    pub fresh: bool,

    /// Restrict the run to these categories (empty = all)
    pub only: Vec<String>,
}

/// Tracks the state of one category run and rejects illegal moves
struct CategoryRun<'a> {
    name: &'a str,
    state: PipelineState,
}

impl<'a> CategoryRun<'a> {
    fn new(name: &'a str) -> Self {
        Self {
            name,
            state: PipelineState::Idle,
        }
    }

    fn transition(&mut self, next: PipelineState) -> Result<(), ScrapeError> {
        if !self.state.can_transition_to(next) {
            return Err(ScrapeError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::debug!("Category '{}': {} -> {}", self.name, self.state, next);
        self.state = next;
        Ok(())
    }
}

/// Main scrape coordinator
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Arc<RenderedPageFetcher>,
    extractor: Arc<RecordExtractor>,
    discoverer: PaginationDiscoverer,
}

impl Coordinator {
    /// Creates a coordinator that loads pages over HTTP
    ///
    /// # Arguments
    ///
    /// * `config` - A validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(ScrapeError)` - HTTP client, selectors or count fields invalid
    pub fn new(config: Config) -> Result<Self, ScrapeError> {
        let renderer = HttpRenderer::new(&config.fetcher)?;
        Self::with_renderer(config, Arc::new(renderer))
    }

    /// Creates a coordinator around any page renderer
    pub fn with_renderer(
        config: Config,
        renderer: Arc<dyn PageRenderer>,
    ) -> Result<Self, ScrapeError> {
        let fetcher = Arc::new(RenderedPageFetcher::new(
            renderer,
            FetchPolicy::from(&config.fetcher),
        ));
        let extractor = Arc::new(RecordExtractor::from_config(&config.selectors)?);
        let discoverer = PaginationDiscoverer::new(
            fetcher.clone(),
            count_strategies(&config.scraper.count_fields)?,
            config.scraper.items_per_page,
        );

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            extractor,
            discoverer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one category to a terminal state
    ///
    /// Never returns an error: a category that cannot obtain endpoints ends
    /// `Failed` with the reason in `RunOutcome::failure`, and endpoint-level
    /// failures are counted in the report.
    pub async fn run_category(&self, category: &CategoryConfig, options: &RunOptions) -> RunOutcome {
        let mut run = CategoryRun::new(&category.name);
        let mut report = CategoryReport::default();

        let failure = match self.drive(category, options, &mut run, &mut report).await {
            Ok(()) => None,
            Err(e) => {
                report_error(&format!("running category '{}'", category.name), &e);
                if run.transition(PipelineState::Failed).is_err() {
                    tracing::error!(
                        "Category '{}' failed while {}",
                        category.name,
                        run.state
                    );
                }
                Some(e.to_string())
            }
        };

        tracing::info!(
            "Category '{}' finished as {} ({} records written)",
            category.name,
            run.state,
            report.records_written
        );

        RunOutcome {
            category: category.name.clone(),
            state: run.state,
            report,
            failure,
        }
    }

    async fn drive(
        &self,
        category: &CategoryConfig,
        options: &RunOptions,
        run: &mut CategoryRun<'_>,
        report: &mut CategoryReport,
    ) -> Result<(), ScrapeError> {
        if !category.should_run(&self.config.scraper) {
            tracing::info!("Scraper disabled for category '{}', skipping", category.name);
            return run.transition(PipelineState::Skipped);
        }

        if options.fresh {
            clear_category_files(category)?;
        }

        let store = EndpointStore::new(&category.endpoints_path, self.config.scraper.chunk_size);
        let endpoints = self.load_or_discover(category, &store).await?;
        run.transition(PipelineState::EndpointsReady)?;

        if endpoints.is_empty() {
            tracing::info!(
                "Category '{}': operation completed - no data returned",
                category.name
            );
            return run.transition(PipelineState::Done);
        }

        let endpoints = select_endpoints(endpoints, category.depth_limit(&self.config.scraper));
        report.endpoints_scheduled = endpoints.len();

        run.transition(PipelineState::Fetching)?;
        self.fetch_all(category, endpoints, report).await;
        run.transition(PipelineState::Done)
    }

    /// Returns stored endpoints, running discovery when there are none
    ///
    /// After discovery the store is read back, so a run always works from
    /// what was persisted.
    async fn load_or_discover(
        &self,
        category: &CategoryConfig,
        store: &EndpointStore,
    ) -> Result<Vec<Endpoint>, ScrapeError> {
        if let EndpointLoad::Loaded(endpoints) = store.load()? {
            return Ok(endpoints);
        }

        tracing::info!(
            "No stored endpoints for '{}', discovering from {}",
            category.name,
            category.seed_url
        );

        let discovered = self.discoverer.discover(&category.seed_url, store).await?;
        if discovered.is_empty() {
            return Ok(Vec::new());
        }

        match store.load()? {
            EndpointLoad::Loaded(endpoints) => Ok(endpoints),
            EndpointLoad::EmptyOrMissing => Err(DiscoveryError::NoValidEndpoints {
                path: store.path().to_path_buf(),
            }
            .into()),
        }
    }

    /// Fans endpoints out under the admission gate and waits for all of them
    async fn fetch_all(
        &self,
        category: &CategoryConfig,
        endpoints: Vec<Endpoint>,
        report: &mut CategoryReport,
    ) {
        let gate = AdmissionGate::new(self.config.scraper.max_concurrent_fetches);
        let writer = SharedWriter::new(ChunkedAppendWriter::new(
            &category.records_path,
            self.config.scraper.chunk_size,
        ));
        let mut tasks = JoinSet::new();

        tracing::info!(
            "Fetching {} endpoints for '{}' ({} at a time)",
            endpoints.len(),
            category.name,
            gate.capacity()
        );

        for endpoint in endpoints {
            let Some(permit) = gate.admit().await else {
                break;
            };

            let fetcher = self.fetcher.clone();
            let extractor = self.extractor.clone();
            let writer = writer.clone();

            tasks.spawn(async move {
                let _permit = permit;
                process_endpoint(&fetcher, &extractor, &writer, &endpoint).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.record(&outcome),
                Err(e) => {
                    report_error("joining endpoint task", &ScrapeError::from(e));
                    report.record(&EndpointOutcome::FetchFailed);
                }
            }
        }
    }

    /// Runs every selected category concurrently
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<RunOutcome>)` - One outcome per category, in config order
    /// * `Err(ScrapeError)` - `options.only` names an unknown category
    pub async fn run_all(self: Arc<Self>, options: RunOptions) -> Result<Vec<RunOutcome>, ScrapeError> {
        let categories: Vec<CategoryConfig> = select_categories(&self.config, &options.only)?
            .into_iter()
            .cloned()
            .collect();
        let options = Arc::new(options);

        let handles: Vec<_> = categories
            .into_iter()
            .map(|category| {
                let coordinator = self.clone();
                let options = options.clone();
                let name = category.name.clone();
                let handle = tokio::spawn(async move {
                    coordinator.run_category(&category, &options).await
                });
                (name, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    let err = ScrapeError::from(e);
                    report_error(&format!("running category '{}'", name), &err);
                    let mut outcome = RunOutcome::new(name, PipelineState::Failed);
                    outcome.failure = Some(err.to_string());
                    outcomes.push(outcome);
                }
            }
        }

        Ok(outcomes)
    }
}

/// Fetch, extract and append one endpoint
///
/// Every failure is reported and absorbed here so one endpoint never aborts
/// its siblings.
async fn process_endpoint(
    fetcher: &RenderedPageFetcher,
    extractor: &RecordExtractor,
    writer: &SharedWriter,
    endpoint: &Endpoint,
) -> EndpointOutcome {
    let html = match fetcher.fetch(&endpoint.url).await {
        FetchResult::Success(html) => html,
        FetchResult::Failure(reason) => {
            let err = ScrapeError::FetchExhausted {
                url: endpoint.url.clone(),
                attempts: fetcher.policy().attempts(),
                reason,
            };
            report_error(&format!("fetching page {}", endpoint.page), &err);
            return EndpointOutcome::FetchFailed;
        }
    };

    let records = match extractor.extract(&html) {
        Ok(records) => records,
        Err(source) => {
            let err = ScrapeError::Extraction {
                url: endpoint.url.clone(),
                source,
            };
            report_error(&format!("extracting page {}", endpoint.page), &err);
            return EndpointOutcome::ExtractionFailed;
        }
    };

    match writer.append(&records) {
        Ok(summary) => {
            tracing::info!(
                "Parsed data from page {} saved to {} ({} records)",
                endpoint.page,
                writer.path().display(),
                summary.rows_written
            );
            EndpointOutcome::Written {
                records: summary.rows_written,
            }
        }
        Err(e) => {
            report_error(
                &format!("writing records of page {}", endpoint.page),
                &ScrapeError::from(e),
            );
            EndpointOutcome::WriteFailed
        }
    }
}

/// Resolves `only` against the configured categories, in config order
pub fn select_categories<'a>(
    config: &'a Config,
    only: &[String],
) -> Result<Vec<&'a CategoryConfig>, ConfigError> {
    if let Some(unknown) = only
        .iter()
        .find(|name| !config.categories.iter().any(|c| &c.name == *name))
    {
        return Err(ConfigError::Validation(format!(
            "Unknown category '{}'",
            unknown
        )));
    }

    Ok(config
        .categories
        .iter()
        .filter(|c| only.is_empty() || only.contains(&c.name))
        .collect())
}

/// Runs a complete scrape and summarises it
///
/// This is the main entry point for a run. For every selected category it
/// will:
/// 1. Reset the category files when asked to
/// 2. Load the stored endpoints or discover them
/// 3. Fetch, extract and append every endpoint
/// 4. Report the outcome
///
/// # Arguments
///
/// * `config` - A validated configuration
/// * `options` - Reset and category selection
///
/// # Returns
///
/// * `Ok(RunSummary)` - Every selected category reached a terminal state
/// * `Err(ScrapeError)` - The coordinator could not be built or a category
///   name is unknown
pub async fn run_scrape(config: Config, options: RunOptions) -> Result<RunSummary, ScrapeError> {
    let coordinator = Arc::new(Coordinator::new(config)?);
    let outcomes = coordinator.run_all(options).await?;
    Ok(RunSummary::from_outcomes(outcomes))
}
