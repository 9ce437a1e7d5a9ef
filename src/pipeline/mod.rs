use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::error::Result;
use crate::fetcher::{Fetcher, RawPage, Target};
use crate::models::{BatchSummary, Candidate, ScrapeRun, TargetFailure};
use crate::parser::{self, PageKind};
use crate::reconciler::{ReconcileResult, Reconciler};
use crate::storage::EntityStore;
use crate::utils::retry_with_backoff;

/// What one pipeline invocation works on: a keyword search or a direct
/// listing/profile URL.
#[derive(Debug, Clone)]
pub enum RunTarget {
    Search { keyword: String },
    Listing { url: String },
    Seller { url: String },
}

impl RunTarget {
    pub fn search(keyword: impl Into<String>) -> Self {
        RunTarget::Search {
            keyword: keyword.into(),
        }
    }

    pub fn listing(url: impl Into<String>) -> Self {
        RunTarget::Listing { url: url.into() }
    }

    pub fn seller(url: impl Into<String>) -> Self {
        RunTarget::Seller { url: url.into() }
    }

    fn describe(&self) -> String {
        match self {
            RunTarget::Search { keyword } => format!("search:{keyword}"),
            RunTarget::Listing { url } => format!("listing:{url}"),
            RunTarget::Seller { url } => format!("seller:{url}"),
        }
    }
}

/// Drives fetch→parse→reconcile per target. Stateless between invocations
/// except through the entity store.
pub struct Pipeline<S> {
    settings: Settings,
    fetcher: Arc<Fetcher>,
    reconciler: Arc<Reconciler<S>>,
    store: Arc<S>,
}

impl<S: EntityStore + 'static> Pipeline<S> {
    pub fn new(settings: Settings, store: Arc<S>) -> Result<Self> {
        let fetcher = Arc::new(Fetcher::new(&settings)?);
        Ok(Self::with_fetcher(settings, fetcher, store))
    }

    pub fn with_fetcher(settings: Settings, fetcher: Arc<Fetcher>, store: Arc<S>) -> Self {
        Self {
            reconciler: Arc::new(Reconciler::new(Arc::clone(&store))),
            settings,
            fetcher,
            store,
        }
    }

    pub async fn run(&self, target: &RunTarget) -> Result<ScrapeRun> {
        match target {
            RunTarget::Search { keyword } => {
                self.run_search(keyword, self.settings.pipeline.max_pages).await
            }
            RunTarget::Listing { url } => self.run_page(url, PageKind::ListingDetail).await,
            RunTarget::Seller { url } => self.run_page(url, PageKind::SellerProfile).await,
        }
    }

    /// Keyword search across result pages. The page cap always wins: at
    /// most `max_pages` fetches go out even when the site reports more.
    pub async fn run_search(&self, keyword: &str, max_pages: u32) -> Result<ScrapeRun> {
        let mut run = ScrapeRun::new(keyword, Utc::now());

        for page in 1..=max_pages.max(1) {
            let url = self.settings.site.search_page_url(keyword, page);
            let raw = self
                .fetch_with_retry(&Target::new(url, PageKind::SearchResults))
                .await?;
            run.pages_fetched += 1;

            let outcome =
                parser::parse(&raw.body, &raw.url, PageKind::SearchResults, &self.settings.site);
            info!(
                keyword,
                page,
                candidates = outcome.candidates.len(),
                "Parsed result page"
            );

            self.reconcile_all(&outcome.candidates, raw.fetched_at, &mut run)
                .await;

            if !outcome.has_more_pages {
                break;
            }
        }

        self.store.record_run(&run).await?;
        Ok(run)
    }

    async fn run_page(&self, url: &str, kind: PageKind) -> Result<ScrapeRun> {
        let mut run = ScrapeRun::new(url, Utc::now());

        let raw = self.fetch_with_retry(&Target::new(url, kind)).await?;
        run.pages_fetched = 1;

        let outcome = parser::parse(&raw.body, &raw.url, kind, &self.settings.site);
        self.reconcile_all(&outcome.candidates, raw.fetched_at, &mut run)
            .await;

        self.store.record_run(&run).await?;
        Ok(run)
    }

    /// Process a batch of targets under the configured concurrency cap.
    /// A failed target lands in the summary; the rest of the batch is
    /// unaffected.
    pub async fn run_batch(self: &Arc<Self>, targets: Vec<RunTarget>) -> BatchSummary {
        let semaphore = Arc::new(Semaphore::new(self.settings.pipeline.concurrency.max(1)));
        let mut handles = Vec::new();

        for target in targets {
            let pipeline = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let description = target.describe();
                let outcome = pipeline.run(&target).await;
                (description, outcome)
            }));
        }

        let mut summary = BatchSummary::default();
        for handle in handles {
            match handle.await {
                Ok((_, Ok(run))) => summary.runs.push(run),
                Ok((description, Err(err))) => {
                    warn!(target = %description, error = %err, "Target failed");
                    summary.failures.push(TargetFailure {
                        target: description,
                        error: err.to_string(),
                    });
                }
                Err(join_err) => {
                    summary.failures.push(TargetFailure {
                        target: "<aborted task>".to_string(),
                        error: join_err.to_string(),
                    });
                }
            }
        }

        summary
    }

    async fn fetch_with_retry(&self, target: &Target) -> Result<RawPage> {
        let deadline = match self.settings.fetch.fetch_deadline_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        retry_with_backoff(
            self.settings.fetch.max_retries,
            self.settings.fetch.retry_base_delay_ms,
            || async { Ok(self.fetcher.fetch(target, deadline).await?) },
        )
        .await
    }

    async fn reconcile_all(
        &self,
        candidates: &[Candidate],
        observed_at: DateTime<Utc>,
        run: &mut ScrapeRun,
    ) {
        for candidate in candidates {
            run.candidates += 1;
            match self.reconciler.reconcile(candidate, observed_at).await {
                Ok(ReconcileResult::Created { .. }) => run.created += 1,
                Ok(ReconcileResult::Updated { .. }) => run.updated += 1,
                Ok(ReconcileResult::Unchanged) => run.unchanged += 1,
                Err(err) => {
                    // One entity failing must not sink the rest of the page.
                    error!(
                        key = candidate.identity_key(),
                        error = %err,
                        "Reconcile failed"
                    );
                    run.failed += 1;
                }
            }
        }
    }
}
