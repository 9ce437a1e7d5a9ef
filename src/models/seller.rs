use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted company profile. `profile_url` is the stable identity.
/// Rating stays within 0.0..=5.0; the parser drops values outside that range
/// before they ever reach the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seller {
    pub profile_url: String,
    pub name: Option<String>,
    pub business_name: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub country: Option<String>,
    pub state_province: Option<String>,
    pub zip_code: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub first_seen_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl Seller {
    pub fn new(profile_url: impl Into<String>, seen_at: DateTime<Utc>) -> Self {
        Self {
            profile_url: profile_url.into(),
            name: None,
            business_name: None,
            rating: None,
            review_count: None,
            country: None,
            state_province: None,
            zip_code: None,
            address: None,
            phone: None,
            email: None,
            first_seen_at: seen_at,
            last_updated_at: seen_at,
        }
    }
}
