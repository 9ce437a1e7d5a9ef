use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Listing,
    Seller,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Listing => write!(f, "listing"),
            EntityKind::Seller => write!(f, "seller"),
        }
    }
}

/// One field's value transition, attributed to the scrape that observed it.
/// Written exactly once by the reconciler, then never mutated or deleted.
/// `old_value` is `None` when the field was recorded for the first time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub entity: EntityKind,
    pub identity_key: String,
    pub field_name: String,
    pub old_value: Option<String>,
    pub new_value: String,
    pub changed_at: DateTime<Utc>,
}
