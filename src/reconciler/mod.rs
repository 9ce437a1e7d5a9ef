use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{
    Candidate, EntityKind, HistoryEntry, Listing, ListingCandidate, Seller, SellerCandidate,
};
use crate::storage::EntityStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileResult {
    Created { fields_recorded: usize },
    Updated { changed_fields: Vec<String> },
    Unchanged,
}

#[derive(Debug, Clone)]
struct FieldChange {
    field: &'static str,
    old_value: Option<String>,
    new_value: String,
}

/// Merges candidates into stored state and owns every write the pipeline
/// makes: entity upserts and history appends both happen here, under an
/// at-most-one-in-flight lock per identity key. Different keys reconcile
/// independently.
pub struct Reconciler<S> {
    store: Arc<S>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: EntityStore> Reconciler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Merge one candidate against stored state. Idempotent: feeding the
    /// same candidate twice yields `Created`/`Updated` then `Unchanged`,
    /// with no duplicate history entries.
    pub async fn reconcile(
        &self,
        candidate: &Candidate,
        observed_at: DateTime<Utc>,
    ) -> Result<ReconcileResult> {
        let key = format!("{}:{}", candidate.kind(), candidate.identity_key());
        let lock = self.key_lock(&key).await;
        let _guard = lock.lock().await;

        match candidate {
            Candidate::Listing(listing) => self.reconcile_listing(listing, observed_at).await,
            Candidate::Seller(seller) => self.reconcile_seller(seller, observed_at).await,
        }
    }

    async fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn reconcile_listing(
        &self,
        candidate: &ListingCandidate,
        observed_at: DateTime<Utc>,
    ) -> Result<ReconcileResult> {
        let existing = self.store.get_listing(&candidate.item_number).await?;

        match existing {
            None => {
                let mut listing = Listing::new(&candidate.item_number, observed_at);
                let changes = merge_listing(&mut listing, candidate);

                self.store.upsert_listing(&listing).await?;
                self.append_changes(EntityKind::Listing, &listing.item_number, &changes, observed_at)
                    .await?;

                info!(
                    item_number = %listing.item_number,
                    fields = changes.len(),
                    "Created listing"
                );
                Ok(ReconcileResult::Created {
                    fields_recorded: changes.len(),
                })
            }
            Some(mut listing) => {
                let changes = merge_listing(&mut listing, candidate);
                if changes.is_empty() {
                    debug!(item_number = %listing.item_number, "Listing unchanged");
                    return Ok(ReconcileResult::Unchanged);
                }

                listing.last_updated_at = observed_at;
                self.store.upsert_listing(&listing).await?;
                self.append_changes(EntityKind::Listing, &listing.item_number, &changes, observed_at)
                    .await?;

                let changed_fields = field_names(&changes);
                info!(
                    item_number = %listing.item_number,
                    fields = ?changed_fields,
                    "Updated listing"
                );
                Ok(ReconcileResult::Updated { changed_fields })
            }
        }
    }

    async fn reconcile_seller(
        &self,
        candidate: &SellerCandidate,
        observed_at: DateTime<Utc>,
    ) -> Result<ReconcileResult> {
        let existing = self.store.get_seller(&candidate.profile_url).await?;

        match existing {
            None => {
                let mut seller = Seller::new(&candidate.profile_url, observed_at);
                let changes = merge_seller(&mut seller, candidate);

                self.store.upsert_seller(&seller).await?;
                self.append_changes(EntityKind::Seller, &seller.profile_url, &changes, observed_at)
                    .await?;

                info!(
                    profile_url = %seller.profile_url,
                    fields = changes.len(),
                    "Created seller"
                );
                Ok(ReconcileResult::Created {
                    fields_recorded: changes.len(),
                })
            }
            Some(mut seller) => {
                let changes = merge_seller(&mut seller, candidate);
                if changes.is_empty() {
                    debug!(profile_url = %seller.profile_url, "Seller unchanged");
                    return Ok(ReconcileResult::Unchanged);
                }

                seller.last_updated_at = observed_at;
                self.store.upsert_seller(&seller).await?;
                self.append_changes(EntityKind::Seller, &seller.profile_url, &changes, observed_at)
                    .await?;

                let changed_fields = field_names(&changes);
                info!(
                    profile_url = %seller.profile_url,
                    fields = ?changed_fields,
                    "Updated seller"
                );
                Ok(ReconcileResult::Updated { changed_fields })
            }
        }
    }

    async fn append_changes(
        &self,
        entity: EntityKind,
        identity_key: &str,
        changes: &[FieldChange],
        observed_at: DateTime<Utc>,
    ) -> Result<()> {
        for change in changes {
            self.store
                .append_history(&HistoryEntry {
                    entity,
                    identity_key: identity_key.to_string(),
                    field_name: change.field.to_string(),
                    old_value: change.old_value.clone(),
                    new_value: change.new_value.clone(),
                    changed_at: observed_at,
                })
                .await?;
        }
        Ok(())
    }
}

fn field_names(changes: &[FieldChange]) -> Vec<String> {
    changes.iter().map(|c| c.field.to_string()).collect()
}

/// Stage one field: a known candidate value that differs from stored state
/// replaces it and records the transition. An unknown candidate value never
/// touches the stored one.
fn merge_field<T>(
    changes: &mut Vec<FieldChange>,
    field: &'static str,
    stored: &mut Option<T>,
    observed: &Option<T>,
) where
    T: PartialEq + Clone + Display,
{
    let Some(value) = observed else { return };
    if stored.as_ref() == Some(value) {
        return;
    }

    changes.push(FieldChange {
        field,
        old_value: stored.as_ref().map(|v| v.to_string()),
        new_value: value.to_string(),
    });
    *stored = Some(value.clone());
}

/// Image sets compare order-insensitively; the recorded value is the JSON
/// array of URLs.
fn merge_images(
    changes: &mut Vec<FieldChange>,
    stored: &mut Option<Vec<String>>,
    observed: &Option<Vec<String>>,
) {
    let Some(value) = observed else { return };

    let unchanged = stored.as_ref().is_some_and(|current| {
        let mut a = current.clone();
        let mut b = value.clone();
        a.sort();
        b.sort();
        a == b
    });
    if unchanged {
        return;
    }

    changes.push(FieldChange {
        field: "image_urls",
        old_value: stored.as_ref().map(|urls| render_urls(urls)),
        new_value: render_urls(value),
    });
    *stored = Some(value.clone());
}

fn render_urls(urls: &[String]) -> String {
    serde_json::to_string(urls).unwrap_or_else(|_| urls.join(","))
}

fn merge_listing(stored: &mut Listing, candidate: &ListingCandidate) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    merge_field(&mut changes, "title", &mut stored.title, &candidate.title);
    merge_field(&mut changes, "sku", &mut stored.sku, &candidate.sku);
    merge_field(&mut changes, "price", &mut stored.price, &candidate.price);
    merge_field(&mut changes, "brand", &mut stored.brand, &candidate.brand);
    merge_field(
        &mut changes,
        "min_order_quantity",
        &mut stored.min_order_quantity,
        &candidate.min_order_quantity,
    );
    merge_field(
        &mut changes,
        "max_order_quantity",
        &mut stored.max_order_quantity,
        &candidate.max_order_quantity,
    );
    merge_field(
        &mut changes,
        "description",
        &mut stored.description,
        &candidate.description,
    );
    merge_field(
        &mut changes,
        "listing_url",
        &mut stored.listing_url,
        &candidate.listing_url,
    );
    merge_field(
        &mut changes,
        "seller_url",
        &mut stored.seller_url,
        &candidate.seller_url,
    );
    merge_images(&mut changes, &mut stored.image_urls, &candidate.image_urls);
    changes
}

fn merge_seller(stored: &mut Seller, candidate: &SellerCandidate) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    merge_field(&mut changes, "name", &mut stored.name, &candidate.name);
    merge_field(
        &mut changes,
        "business_name",
        &mut stored.business_name,
        &candidate.business_name,
    );
    merge_field(&mut changes, "rating", &mut stored.rating, &candidate.rating);
    merge_field(
        &mut changes,
        "review_count",
        &mut stored.review_count,
        &candidate.review_count,
    );
    merge_field(&mut changes, "country", &mut stored.country, &candidate.country);
    merge_field(
        &mut changes,
        "state_province",
        &mut stored.state_province,
        &candidate.state_province,
    );
    merge_field(&mut changes, "zip_code", &mut stored.zip_code, &candidate.zip_code);
    merge_field(&mut changes, "address", &mut stored.address, &candidate.address);
    merge_field(&mut changes, "phone", &mut stored.phone, &candidate.phone);
    merge_field(&mut changes, "email", &mut stored.email, &candidate.email);
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Price;

    #[test]
    fn unknown_fields_never_erase_stored_values() {
        let now = Utc::now();
        let mut stored = Listing::new("item-1", now);
        stored.price = Some(Price::new(29.99, "USD"));
        stored.title = Some("Solar Panel".to_string());

        let candidate = ListingCandidate::new("item-1");
        let changes = merge_listing(&mut stored, &candidate);

        assert!(changes.is_empty());
        assert_eq!(stored.price, Some(Price::new(29.99, "USD")));
        assert_eq!(stored.title.as_deref(), Some("Solar Panel"));
    }

    #[test]
    fn differing_known_field_stages_exactly_one_change() {
        let now = Utc::now();
        let mut stored = Seller::new("https://s.example.com/acme", now);
        stored.rating = Some(4.5);
        stored.name = Some("Acme".to_string());

        let mut candidate = SellerCandidate::new("https://s.example.com/acme");
        candidate.rating = Some(4.7);
        candidate.name = Some("Acme".to_string());

        let changes = merge_seller(&mut stored, &candidate);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "rating");
        assert_eq!(changes[0].old_value.as_deref(), Some("4.5"));
        assert_eq!(changes[0].new_value, "4.7");
        assert_eq!(stored.rating, Some(4.7));
    }

    #[test]
    fn image_order_does_not_count_as_a_change() {
        let now = Utc::now();
        let mut stored = Listing::new("item-1", now);
        stored.image_urls = Some(vec!["a".to_string(), "b".to_string()]);

        let mut candidate = ListingCandidate::new("item-1");
        candidate.image_urls = Some(vec!["b".to_string(), "a".to_string()]);

        let changes = merge_listing(&mut stored, &candidate);
        assert!(changes.is_empty());
    }
}
