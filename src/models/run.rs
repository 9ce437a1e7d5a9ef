use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for one fetch+parse+reconcile invocation. Created once per
/// pipeline run, read-only afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeRun {
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub pages_fetched: u32,
    pub candidates: u32,
    pub created: u32,
    pub updated: u32,
    pub unchanged: u32,
    pub failed: u32,
}

impl ScrapeRun {
    pub fn new(target: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            target: target.into(),
            started_at,
            pages_fetched: 0,
            candidates: 0,
            created: 0,
            updated: 0,
            unchanged: 0,
            failed: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetFailure {
    pub target: String,
    pub error: String,
}

/// Outcome of a batch of targets. Failed targets are carried alongside the
/// completed runs; a batch never silently drops a failure.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub runs: Vec<ScrapeRun>,
    pub failures: Vec<TargetFailure>,
}

impl BatchSummary {
    pub fn total_created(&self) -> u32 {
        self.runs.iter().map(|run| run.created).sum()
    }

    pub fn total_updated(&self) -> u32 {
        self.runs.iter().map(|run| run.updated).sum()
    }

    pub fn total_unchanged(&self) -> u32 {
        self.runs.iter().map(|run| run.unchanged).sum()
    }
}
