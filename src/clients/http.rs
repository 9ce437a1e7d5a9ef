use std::time::Duration;

use http::StatusCode;
use rquest::{Client, RequestBuilder, Response};
use rquest_util::Emulation;
use tracing::debug;

use crate::error::{Error, Result};

/// Lightweight request client: one emulated browser profile per instance.
/// Blocking and throttling statuses are lifted into typed errors so the
/// fetcher can decide on fallback without inspecting response bodies.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(emulation: Emulation, timeout: Duration) -> Result<Self> {
        debug!(emulation = ?emulation, "Creating client with emulation");

        let client = Client::builder()
            .emulation(emulation)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;

        debug!(
            status = response.status().as_u16(),
            url = %response.url(),
            "Response received"
        );

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => Err(Error::RateLimit),
            StatusCode::FORBIDDEN => Err(Error::Forbidden),
            _ => Ok(response),
        }
    }
}
