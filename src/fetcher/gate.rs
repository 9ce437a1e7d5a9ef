use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Time source for the gate. Swapped for a manual clock in tests.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Cooperative interval gate: each caller is admitted no sooner than
/// `min_interval` after the previous one. A courtesy wait toward the
/// source site, not a hard lock.
pub struct RateGate {
    min_interval: Duration,
    last_admitted: Mutex<Option<Instant>>,
    clock: Arc<dyn Clock>,
}

impl RateGate {
    pub fn new(min_interval: Duration) -> Self {
        Self::with_clock(min_interval, Arc::new(TokioClock))
    }

    pub fn with_clock(min_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            min_interval,
            last_admitted: Mutex::new(None),
            clock,
        }
    }

    pub async fn admit(&self) {
        // Waiters queue on the lock, so concurrent fetches are spaced out
        // one interval apart rather than released in a burst.
        let mut last = self.last_admitted.lock().await;

        if let Some(previous) = *last {
            let elapsed = self.clock.now().duration_since(previous);
            if elapsed < self.min_interval {
                self.clock.sleep(self.min_interval - elapsed).await;
            }
        }

        *last = Some(self.clock.now());
    }
}
