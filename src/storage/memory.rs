use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{EntityKind, HistoryEntry, Listing, ScrapeRun, Seller};

use super::{EntityStore, StoreResult};

/// In-memory store: the default backend for the one-shot binary and the
/// fake used throughout the tests.
#[derive(Default)]
pub struct MemoryStore {
    listings: RwLock<HashMap<String, Listing>>,
    sellers: RwLock<HashMap<String, Seller>>,
    history: RwLock<Vec<HistoryEntry>>,
    runs: RwLock<Vec<ScrapeRun>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn history_len(&self) -> usize {
        self.history.read().await.len()
    }

    pub async fn runs(&self) -> Vec<ScrapeRun> {
        self.runs.read().await.clone()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get_listing(&self, item_number: &str) -> StoreResult<Option<Listing>> {
        Ok(self.listings.read().await.get(item_number).cloned())
    }

    async fn get_seller(&self, profile_url: &str) -> StoreResult<Option<Seller>> {
        Ok(self.sellers.read().await.get(profile_url).cloned())
    }

    async fn upsert_listing(&self, listing: &Listing) -> StoreResult<()> {
        self.listings
            .write()
            .await
            .insert(listing.item_number.clone(), listing.clone());
        Ok(())
    }

    async fn upsert_seller(&self, seller: &Seller) -> StoreResult<()> {
        self.sellers
            .write()
            .await
            .insert(seller.profile_url.clone(), seller.clone());
        Ok(())
    }

    async fn append_history(&self, entry: &HistoryEntry) -> StoreResult<()> {
        self.history.write().await.push(entry.clone());
        Ok(())
    }

    async fn query_history(
        &self,
        entity: EntityKind,
        identity_key: &str,
        field: Option<&str>,
    ) -> StoreResult<Vec<HistoryEntry>> {
        let history = self.history.read().await;
        let mut entries: Vec<HistoryEntry> = history
            .iter()
            .filter(|entry| entry.entity == entity && entry.identity_key == identity_key)
            .filter(|entry| field.is_none_or(|f| entry.field_name == f))
            .cloned()
            .collect();

        entries.sort_by_key(|entry| entry.changed_at);
        Ok(entries)
    }

    async fn record_run(&self, run: &ScrapeRun) -> StoreResult<()> {
        self.runs.write().await.push(run.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn entry(field: &str, at_offset_secs: i64) -> HistoryEntry {
        HistoryEntry {
            entity: EntityKind::Listing,
            identity_key: "item-1".to_string(),
            field_name: field.to_string(),
            old_value: None,
            new_value: "x".to_string(),
            changed_at: Utc::now() + Duration::seconds(at_offset_secs),
        }
    }

    #[tokio::test]
    async fn history_query_filters_and_orders_ascending() {
        let store = MemoryStore::new();
        store.append_history(&entry("price", 10)).await.unwrap();
        store.append_history(&entry("title", 0)).await.unwrap();
        store.append_history(&entry("price", 20)).await.unwrap();

        let all = store
            .query_history(EntityKind::Listing, "item-1", None)
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].changed_at <= w[1].changed_at));

        let prices = store
            .query_history(EntityKind::Listing, "item-1", Some("price"))
            .await
            .unwrap();
        assert_eq!(prices.len(), 2);

        let other = store
            .query_history(EntityKind::Seller, "item-1", None)
            .await
            .unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn upsert_replaces_by_identity_key() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let mut listing = Listing::new("item-1", now);
        listing.title = Some("first".to_string());
        store.upsert_listing(&listing).await.unwrap();

        listing.title = Some("second".to_string());
        store.upsert_listing(&listing).await.unwrap();

        let stored = store.get_listing("item-1").await.unwrap().unwrap();
        assert_eq!(stored.title.as_deref(), Some("second"));
    }
}
