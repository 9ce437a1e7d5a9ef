use std::time::Duration;

use rquest_util::Emulation;
use tracing::debug;

use crate::clients::http::HttpClient;
use crate::error::Result;

/// Round-robin pool of HTTP clients, each with a different browser
/// emulation profile so repeated fetches do not present one fingerprint.
pub struct ClientPool {
    clients: Vec<HttpClient>,
    current: std::sync::atomic::AtomicUsize,
}

impl ClientPool {
    pub fn new(timeout: Duration) -> Result<Self> {
        let emulations = vec![
            Emulation::Firefox136,
            Emulation::Chrome133,
            Emulation::Safari18_3,
            Emulation::Edge134,
        ];

        debug!("Creating client pool with {} emulations", emulations.len());

        let clients = emulations
            .into_iter()
            .map(|emulation| HttpClient::new(emulation, timeout))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            clients,
            current: std::sync::atomic::AtomicUsize::new(0),
        })
    }

    pub fn next_client(&self) -> &HttpClient {
        let current = self
            .current
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        &self.clients[current % self.clients.len()]
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
