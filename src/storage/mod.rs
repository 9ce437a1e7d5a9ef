pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{EntityKind, HistoryEntry, Listing, ScrapeRun, Seller};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A racing writer touched the same identity key mid-write. Under the
    /// reconciler's per-key serialization this should never happen; seeing
    /// it means the concurrency discipline was bypassed.
    #[error("write conflict for {key}")]
    Conflict { key: String },

    #[error("{0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence seam for the pipeline. The core never manages schema or
/// connection lifecycle; it speaks only this interface. History writes are
/// pure appends through the single `append_history` entry point.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_listing(&self, item_number: &str) -> StoreResult<Option<Listing>>;

    async fn get_seller(&self, profile_url: &str) -> StoreResult<Option<Seller>>;

    async fn upsert_listing(&self, listing: &Listing) -> StoreResult<()>;

    async fn upsert_seller(&self, seller: &Seller) -> StoreResult<()>;

    async fn append_history(&self, entry: &HistoryEntry) -> StoreResult<()>;

    /// History for one identity key, optionally narrowed to a field,
    /// ordered by timestamp ascending.
    async fn query_history(
        &self,
        entity: EntityKind,
        identity_key: &str,
        field: Option<&str>,
    ) -> StoreResult<Vec<HistoryEntry>>;

    async fn record_run(&self, run: &ScrapeRun) -> StoreResult<()>;
}
