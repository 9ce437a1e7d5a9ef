use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::error::Result;

pub async fn sleep_with_jitter(base_ms: u64, jitter_ms: u64) {
    let jitter = rand::rng().random_range(0..=jitter_ms);
    tokio::time::sleep(Duration::from_millis(base_ms + jitter)).await;
}

/// Exponential backoff with jitter. Only transient failures are retried;
/// terminal and cancelled outcomes surface to the caller immediately.
pub async fn retry_with_backoff<T, F, Fut>(
    mut retries: u32,
    base_delay_ms: u64,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = base_delay_ms;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if retries == 0 || !e.is_transient() {
                    return Err(e);
                }

                debug!(error = %e, delay_ms = delay, "Transient failure, retrying");
                retries -= 1;
                sleep_with_jitter(delay, delay / 2).await;
                delay *= 2;
            }
        }
    }
}
