use serde::{Deserialize, Serialize};

use super::history::EntityKind;
use super::listing::Price;

/// Parser output for one observed product offer. Not yet persisted.
/// `None` means the page did not yield the field — a first-class unknown,
/// never an empty default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingCandidate {
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
    pub seller_url: Option<String>,
}

impl ListingCandidate {
    pub fn new(item_number: impl Into<String>) -> Self {
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
        }
    }
}

/// Parser output for one observed company profile. An email-only candidate
/// (all other fields unknown) is also how the certificate-OCR collaborator
/// feeds contact data into the merge path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerCandidate {
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
}

impl SellerCandidate {
    pub fn new(profile_url: impl Into<String>) -> Self {
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
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Candidate {
    Listing(ListingCandidate),
    Seller(SellerCandidate),
}

impl Candidate {
    pub fn kind(&self) -> EntityKind {
        match self {
            Candidate::Listing(_) => EntityKind::Listing,
            Candidate::Seller(_) => EntityKind::Seller,
        }
    }

    pub fn identity_key(&self) -> &str {
        match self {
            Candidate::Listing(listing) => &listing.item_number,
            Candidate::Seller(seller) => &seller.profile_url,
        }
    }
}
