pub mod gate;

pub use gate::{Clock, RateGate, TokioClock};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::clients::{BrowserClient, ClientPool};
use crate::config::{Settings, SiteConfig};
use crate::error::Error;
use crate::parser::PageKind;

/// Page bodies carrying any of these are treated as an anti-bot
/// challenge rather than content.
const CHALLENGE_MARKERS: &[&str] = &["captcha", "unusual traffic", "access denied"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Lightweight HTTP request through the emulated client pool.
    Http,
    /// Full rendering through a WebDriver session.
    Browser,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Http => write!(f, "http"),
            Strategy::Browser => write!(f, "browser"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Worth retrying with backoff: timeouts, 5xx, throttling, content
    /// that did not materialize.
    Transient,
    /// Retrying cannot help: gone pages, explicit blocks.
    Terminal,
    /// The caller's deadline expired mid-fetch.
    Cancelled,
}

/// Why a single retrieval attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("request failed: {0}")]
    Request(#[from] rquest::Error),

    #[error("browser failed: {0}")]
    Browser(#[from] thirtyfour::error::WebDriverError),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("blocked by anti-bot challenge")]
    Blocked,

    #[error("empty response body")]
    EmptyBody,

    #[error("expected marker {0:?} not found in body")]
    MissingMarker(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("{0}")]
    Other(String),
}

impl AttemptError {
    pub fn class(&self) -> FailureClass {
        match self {
            AttemptError::Request(_) | AttemptError::Browser(_) => FailureClass::Transient,
            AttemptError::Status(status) => match *status {
                404 | 410 => FailureClass::Terminal,
                408 | 429 => FailureClass::Transient,
                s if s >= 500 => FailureClass::Transient,
                _ => FailureClass::Terminal,
            },
            AttemptError::EmptyBody | AttemptError::MissingMarker(_) => FailureClass::Transient,
            AttemptError::Blocked => FailureClass::Terminal,
            AttemptError::DeadlineExceeded => FailureClass::Cancelled,
            AttemptError::Other(_) => FailureClass::Transient,
        }
    }
}

fn describe_attempts(attempts: &[(Strategy, AttemptError)]) -> String {
    attempts
        .iter()
        .map(|(strategy, error)| format!("{strategy}: {error}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Every retrieval strategy failed for one target. Carries each attempt so
/// the caller can see what was tried and decide on retry or abort.
#[derive(Debug, thiserror::Error)]
#[error("all retrieval strategies failed for {url} ({})", describe_attempts(.attempts))]
pub struct FetchFailure {
    pub url: String,
    pub attempts: Vec<(Strategy, AttemptError)>,
}

impl FetchFailure {
    /// Overall class: cancellation dominates, then any transient attempt
    /// keeps the target retryable, otherwise terminal.
    pub fn class(&self) -> FailureClass {
        let classes: Vec<FailureClass> = self
            .attempts
            .iter()
            .map(|(_, error)| error.class())
            .collect();

        if classes.contains(&FailureClass::Cancelled) {
            FailureClass::Cancelled
        } else if classes.contains(&FailureClass::Transient) {
            FailureClass::Transient
        } else {
            FailureClass::Terminal
        }
    }
}

/// Raw content of one successfully retrieved page.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub url: String,
    pub body: String,
    pub strategy: Strategy,
    pub fetched_at: DateTime<Utc>,
}

/// What to fetch: the URL plus the page kind, which determines the
/// structural marker a well-formed body must carry.
#[derive(Debug, Clone)]
pub struct Target {
    pub url: String,
    pub kind: PageKind,
}

impl Target {
    pub fn new(url: impl Into<String>, kind: PageKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }
}

/// One way of turning a URL into a page body.
#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    fn kind(&self) -> Strategy;
    async fn retrieve(&self, url: &str) -> Result<String, AttemptError>;
}

pub struct HttpStrategy {
    pool: Arc<ClientPool>,
}

impl HttpStrategy {
    pub fn new(pool: Arc<ClientPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RetrievalStrategy for HttpStrategy {
    fn kind(&self) -> Strategy {
        Strategy::Http
    }

    async fn retrieve(&self, url: &str) -> Result<String, AttemptError> {
        let client = self.pool.next_client();
        let request = client.get(url);

        let response = match client.send(request).await {
            Ok(response) => response,
            Err(Error::RateLimit) => return Err(AttemptError::Status(429)),
            Err(Error::Forbidden) => return Err(AttemptError::Blocked),
            Err(Error::Http(e)) => return Err(AttemptError::Request(e)),
            Err(e) => return Err(AttemptError::Other(e.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status.as_u16()));
        }

        response.text().await.map_err(AttemptError::Request)
    }
}

pub struct BrowserStrategy {
    browser: Arc<BrowserClient>,
}

impl BrowserStrategy {
    pub fn new(browser: Arc<BrowserClient>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl RetrievalStrategy for BrowserStrategy {
    fn kind(&self) -> Strategy {
        Strategy::Browser
    }

    async fn retrieve(&self, url: &str) -> Result<String, AttemptError> {
        self.browser.render(url).await.map_err(AttemptError::from)
    }
}

/// Runs the ordered strategy list for a target: strategy A (HTTP) first,
/// browser rendering as fallback. The fallback decision is a pure function
/// of the prior attempt's typed outcome; only a caller deadline stops the
/// chain early.
pub struct Fetcher {
    strategies: Vec<Arc<dyn RetrievalStrategy>>,
    gate: RateGate,
    site: SiteConfig,
}

impl Fetcher {
    pub fn new(settings: &Settings) -> crate::error::Result<Self> {
        let timeout = Duration::from_secs(settings.fetch.request_timeout_secs);
        let pool = Arc::new(ClientPool::new(timeout)?);

        let mut strategies: Vec<Arc<dyn RetrievalStrategy>> =
            vec![Arc::new(HttpStrategy::new(pool))];

        if settings.browser.enabled {
            let browser = Arc::new(BrowserClient::new(&settings.browser));
            strategies.push(Arc::new(BrowserStrategy::new(browser)));
        }

        Ok(Self {
            strategies,
            gate: RateGate::new(Duration::from_millis(settings.fetch.request_delay_ms)),
            site: settings.site.clone(),
        })
    }

    pub fn with_strategies(
        strategies: Vec<Arc<dyn RetrievalStrategy>>,
        gate: RateGate,
        site: SiteConfig,
    ) -> Self {
        Self {
            strategies,
            gate,
            site,
        }
    }

    pub async fn fetch(
        &self,
        target: &Target,
        deadline: Option<Duration>,
    ) -> Result<RawPage, FetchFailure> {
        self.gate.admit().await;

        let limit = deadline.map(|d| tokio::time::Instant::now() + d);
        let marker = self.expected_marker(target.kind);
        let mut attempts = Vec::new();

        for strategy in &self.strategies {
            let outcome = match limit {
                Some(at) => {
                    let now = tokio::time::Instant::now();
                    if at <= now {
                        Err(AttemptError::DeadlineExceeded)
                    } else {
                        match tokio::time::timeout(at - now, strategy.retrieve(&target.url)).await
                        {
                            Ok(result) => result,
                            Err(_) => Err(AttemptError::DeadlineExceeded),
                        }
                    }
                }
                None => strategy.retrieve(&target.url).await,
            };

            let outcome = outcome.and_then(|body| validate_body(body, marker));

            match outcome {
                Ok(body) => {
                    debug!(
                        url = %target.url,
                        strategy = %strategy.kind(),
                        bytes = body.len(),
                        "Fetched page"
                    );
                    return Ok(RawPage {
                        url: target.url.clone(),
                        body,
                        strategy: strategy.kind(),
                        fetched_at: Utc::now(),
                    });
                }
                Err(error) => {
                    let cancelled = matches!(error, AttemptError::DeadlineExceeded);
                    warn!(
                        url = %target.url,
                        strategy = %strategy.kind(),
                        error = %error,
                        "Retrieval attempt failed"
                    );
                    attempts.push((strategy.kind(), error));
                    if cancelled {
                        break;
                    }
                }
            }
        }

        Err(FetchFailure {
            url: target.url.clone(),
            attempts,
        })
    }

    fn expected_marker(&self, kind: PageKind) -> &str {
        match kind {
            PageKind::SearchResults => &self.site.search_marker,
            PageKind::ListingDetail => &self.site.listing_marker,
            PageKind::SellerProfile => &self.site.seller_marker,
        }
    }
}

fn validate_body(body: String, marker: &str) -> Result<String, AttemptError> {
    if body.trim().is_empty() {
        return Err(AttemptError::EmptyBody);
    }

    let lowered = body.to_lowercase();
    if CHALLENGE_MARKERS.iter().any(|m| lowered.contains(m)) {
        return Err(AttemptError::Blocked);
    }

    if !body.contains(marker) {
        return Err(AttemptError::MissingMarker(marker.to_string()));
    }

    Ok(body)
}
