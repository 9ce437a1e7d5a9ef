use std::time::Duration;

use thirtyfour::error::WebDriverResult;
use thirtyfour::{ChromiumLikeCapabilities, DesiredCapabilities, WebDriver};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::BrowserConfig;

/// Full page rendering through a WebDriver endpoint. One session per
/// render: acquired, driven, and quit inside a single call so a failed
/// render cannot leak a browser process. The guard keeps two in-flight
/// fetches from ever sharing a session.
pub struct BrowserClient {
    webdriver_url: String,
    settle: Duration,
    session_guard: Mutex<()>,
}

impl BrowserClient {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            webdriver_url: config.webdriver_url.clone(),
            settle: Duration::from_millis(config.settle_ms),
            session_guard: Mutex::new(()),
        }
    }

    pub async fn render(&self, url: &str) -> WebDriverResult<String> {
        let _guard = self.session_guard.lock().await;

        let mut caps = DesiredCapabilities::chrome();
        caps.add_arg("--headless")?;
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-gpu")?;
        caps.add_arg("--disable-dev-shm-usage")?;

        let driver = WebDriver::new(&self.webdriver_url, caps).await?;
        let outcome = self.page_source(&driver, url).await;

        // Quit on both paths; a dead session is only logged.
        if let Err(e) = driver.quit().await {
            debug!(error = %e, "Failed to quit WebDriver session");
        }

        outcome
    }

    async fn page_source(&self, driver: &WebDriver, url: &str) -> WebDriverResult<String> {
        driver.goto(url).await?;
        // Let client-side content materialize before reading the DOM.
        tokio::time::sleep(self.settle).await;
        driver.source().await
    }
}
