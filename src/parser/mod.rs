mod listing;
mod price;
mod search;
mod select;
mod seller;

pub use price::parse_price;

use tracing::debug;

use crate::config::SiteConfig;
use crate::models::Candidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    SearchResults,
    ListingDetail,
    SellerProfile,
}

/// A field whose structural marker was absent from the page. Non-fatal:
/// the field stays unknown and extraction of the rest continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub field: &'static str,
}

#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub candidates: Vec<Candidate>,
    /// A next-page marker was present; the caller decides whether to
    /// keep paging.
    pub has_more_pages: bool,
    pub warnings: Vec<ParseWarning>,
}

/// Convert one raw page into candidates. Finite; a fresh call is needed
/// per page.
pub fn parse(body: &str, page_url: &str, kind: PageKind, site: &SiteConfig) -> ParseOutcome {
    match kind {
        PageKind::SearchResults => search::parse_search(body, site),
        PageKind::ListingDetail => listing::parse_listing_detail(body, page_url, site),
        PageKind::SellerProfile => seller::parse_seller_profile(body, page_url),
    }
}

pub(crate) fn track<T>(
    warnings: &mut Vec<ParseWarning>,
    field: &'static str,
    value: Option<T>,
) -> Option<T> {
    if value.is_none() {
        debug!(field, "Field marker absent, leaving unknown");
        warnings.push(ParseWarning { field });
    }
    value
}
