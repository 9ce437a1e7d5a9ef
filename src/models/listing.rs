use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A normalized price: decimal amount plus explicit ISO currency code.
/// Never a locale-formatted string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
}

impl Price {
    pub fn new(amount: f64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency)
    }
}

/// A persisted product offer. `item_number` is the stable identity across
/// scrape runs; every other field may still be unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub item_number: String,
    pub title: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Price>,
    pub brand: Option<String>,
    pub min_order_quantity: Option<u32>,
    pub max_order_quantity: Option<u32>,
    pub description: Option<String>,
    pub listing_url: Option<String>,
    pub image_urls: Option<Vec<String>>,
    /// Identity key of the owning seller, when known.
    pub seller_url: Option<String>,
    pub first_seen_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl Listing {
    pub fn new(item_number: impl Into<String>, seen_at: DateTime<Utc>) -> Self {
        Self {
            item_number: item_number.into(),
            title: None,
            sku: None,
            price: None,
            brand: None,
            min_order_quantity: None,
            max_order_quantity: None,
            description: None,
            listing_url: None,
            image_urls: None,
            seller_url: None,
            first_seen_at: seen_at,
            last_updated_at: seen_at,
        }
    }
}
