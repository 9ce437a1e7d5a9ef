use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use madeinchina_etl::config::SiteConfig;
use madeinchina_etl::fetcher::{
    AttemptError, FailureClass, Fetcher, RateGate, RetrievalStrategy, Strategy, Target,
};
use madeinchina_etl::parser::PageKind;

const VALID_BODY: &str = r#"<html><body><div class="product-item"><a href="/p/x.html"></a></div></body></html>"#;
const MARKERLESS_BODY: &str = "<html><body>redirected placeholder</body></html>";

enum Script {
    Body(&'static str),
    Status(u16),
    SlowBody(&'static str, Duration),
}

struct ScriptedStrategy {
    kind: Strategy,
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl ScriptedStrategy {
    fn new(kind: Strategy, script: Script) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = Arc::new(Self {
            kind,
            script,
            calls: Arc::clone(&calls),
        });
        (strategy, calls)
    }
}

#[async_trait]
impl RetrievalStrategy for ScriptedStrategy {
    fn kind(&self) -> Strategy {
        self.kind
    }

    async fn retrieve(&self, _url: &str) -> Result<String, AttemptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Body(body) => Ok(body.to_string()),
            Script::Status(status) => Err(AttemptError::Status(*status)),
            Script::SlowBody(body, delay) => {
                tokio::time::sleep(*delay).await;
                Ok(body.to_string())
            }
        }
    }
}

fn fetcher(strategies: Vec<Arc<dyn RetrievalStrategy>>) -> Fetcher {
    Fetcher::with_strategies(
        strategies,
        RateGate::new(Duration::ZERO),
        SiteConfig::default(),
    )
}

fn search_target() -> Target {
    Target::new(
        "https://www.made-in-china.com/products-search/hot-china-products/widget.html",
        PageKind::SearchResults,
    )
}

#[tokio::test]
async fn marker_missing_from_http_body_triggers_browser_fallback() {
    let (http, http_calls) = ScriptedStrategy::new(Strategy::Http, Script::Body(MARKERLESS_BODY));
    let (browser, browser_calls) =
        ScriptedStrategy::new(Strategy::Browser, Script::Body(VALID_BODY));

    let fetcher = fetcher(vec![http, browser]);
    let raw = fetcher.fetch(&search_target(), None).await.unwrap();

    assert_eq!(raw.strategy, Strategy::Browser);
    assert_eq!(http_calls.load(Ordering::SeqCst), 1);
    assert_eq!(browser_calls.load(Ordering::SeqCst), 1);
    assert!(raw.body.contains("product-item"));
}

#[tokio::test]
async fn successful_http_fetch_never_touches_the_browser() {
    let (http, _) = ScriptedStrategy::new(Strategy::Http, Script::Body(VALID_BODY));
    let (browser, browser_calls) =
        ScriptedStrategy::new(Strategy::Browser, Script::Body(VALID_BODY));

    let fetcher = fetcher(vec![http, browser]);
    let raw = fetcher.fetch(&search_target(), None).await.unwrap();

    assert_eq!(raw.strategy, Strategy::Http);
    assert_eq!(browser_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn both_strategies_failing_reports_every_attempt() {
    let (http, _) = ScriptedStrategy::new(Strategy::Http, Script::Status(500));
    let (browser, _) = ScriptedStrategy::new(Strategy::Browser, Script::Body(MARKERLESS_BODY));

    let fetcher = fetcher(vec![http, browser]);
    let failure = fetcher.fetch(&search_target(), None).await.unwrap_err();

    assert_eq!(failure.attempts.len(), 2);
    assert_eq!(failure.attempts[0].0, Strategy::Http);
    assert_eq!(failure.attempts[1].0, Strategy::Browser);
    assert_eq!(failure.class(), FailureClass::Transient);
}

#[tokio::test]
async fn gone_page_plus_challenge_is_terminal() {
    let (http, _) = ScriptedStrategy::new(Strategy::Http, Script::Status(404));
    let (browser, _) = ScriptedStrategy::new(
        Strategy::Browser,
        Script::Body("<html>please complete the captcha to continue</html>"),
    );

    let fetcher = fetcher(vec![http, browser]);
    let failure = fetcher.fetch(&search_target(), None).await.unwrap_err();

    assert_eq!(failure.class(), FailureClass::Terminal);
}

#[tokio::test]
async fn deadline_cancels_without_falling_back() {
    let (http, _) = ScriptedStrategy::new(
        Strategy::Http,
        Script::SlowBody(VALID_BODY, Duration::from_millis(300)),
    );
    let (browser, browser_calls) =
        ScriptedStrategy::new(Strategy::Browser, Script::Body(VALID_BODY));

    let fetcher = fetcher(vec![http, browser]);
    let failure = fetcher
        .fetch(&search_target(), Some(Duration::from_millis(30)))
        .await
        .unwrap_err();

    assert_eq!(failure.class(), FailureClass::Cancelled);
    assert_eq!(browser_calls.load(Ordering::SeqCst), 0);
}
