use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use madeinchina_etl::config::Settings;
use madeinchina_etl::pipeline::{Pipeline, RunTarget};
use madeinchina_etl::storage::MemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = Settings::new()?;
    if settings.keywords.is_empty() {
        anyhow::bail!("no keywords configured; set `keywords` in config/default.toml");
    }

    let store = Arc::new(MemoryStore::new());
    let pipeline = Arc::new(Pipeline::new(settings.clone(), Arc::clone(&store))?);

    let targets: Vec<RunTarget> = settings
        .keywords
        .iter()
        .map(RunTarget::search)
        .collect();

    info!(targets = targets.len(), "Starting extraction");
    let summary = pipeline.run_batch(targets).await;

    for run in &summary.runs {
        info!(
            target = %run.target,
            pages = run.pages_fetched,
            candidates = run.candidates,
            created = run.created,
            updated = run.updated,
            unchanged = run.unchanged,
            failed = run.failed,
            "Run complete"
        );
    }

    for failure in &summary.failures {
        warn!(target = %failure.target, error = %failure.error, "Run failed");
    }

    info!(
        created = summary.total_created(),
        updated = summary.total_updated(),
        unchanged = summary.total_unchanged(),
        history_entries = store.history_len().await,
        "Extraction summary"
    );

    Ok(())
}
