use scraper::{Html, Selector};
use tracing::debug;

use crate::config::SiteConfig;
use crate::models::{Candidate, ListingCandidate};

use super::select::{absolutize, first_attr, first_text, slug_from_url};
use super::{ParseOutcome, track};

const ITEM_SELECTORS: &[&str] = &[".prs-item", ".products-item", ".product-item", ".item"];
const TITLE_SELECTORS: &[&str] = &[".product-name", ".title", ".name", "h2", "h3", "a"];
const THUMB_SELECTORS: &[&str] = &["img"];
const NEXT_PAGE_SELECTORS: &[&str] = &[".next-page", ".pagination .next", "a[rel='next']"];
const ITEM_NO_ATTRS: &[&str] = &["data-item-no", "data-product-id", "data-id"];

/// One lightweight candidate per result item: enough for identity and
/// change detection, not full detail.
pub(super) fn parse_search(body: &str, site: &SiteConfig) -> ParseOutcome {
    let document = Html::parse_document(body);
    let root = document.root_element();
    let mut outcome = ParseOutcome::default();

    let mut items = Vec::new();
    for raw in ITEM_SELECTORS {
        if let Ok(selector) = Selector::parse(raw) {
            items = root.select(&selector).collect::<Vec<_>>();
            if !items.is_empty() {
                break;
            }
        }
    }

    for item in items {
        let Some(url) = first_attr(item, &["a"], &["href"])
            .map(|href| absolutize(&site.base_url, &href))
        else {
            debug!("Result item without a link, skipping");
            continue;
        };

        let item_number = ITEM_NO_ATTRS
            .iter()
            .find_map(|attr| item.value().attr(attr))
            .map(str::to_string)
            .or_else(|| slug_from_url(&url));

        let Some(item_number) = item_number else {
            debug!(url = %url, "Result item without a usable identity, skipping");
            continue;
        };

        let mut candidate = ListingCandidate::new(item_number);
        candidate.title = track(&mut outcome.warnings, "title", first_text(item, TITLE_SELECTORS));
        candidate.listing_url = Some(url);
        candidate.image_urls = first_attr(item, THUMB_SELECTORS, &["src", "data-src"])
            .map(|src| vec![absolutize(&site.base_url, &src)]);

        outcome.candidates.push(Candidate::Listing(candidate));
    }

    outcome.has_more_pages = NEXT_PAGE_SELECTORS.iter().any(|raw| {
        Selector::parse(raw)
            .map(|selector| root.select(&selector).next().is_some())
            .unwrap_or(false)
    });

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteConfig {
        SiteConfig::default()
    }

    const PAGE: &str = r#"
        <html><body>
          <div class="products-item">
            <h2 class="product-name">Solar Panel 300W Mono</h2>
            <a href="/product/Solar-Panel-300W-abc123.html">view</a>
            <img data-src="//img.example.com/thumb1.jpg">
          </div>
          <div class="products-item">
            <a href="/product/Led-Flood-Light-def456.html"></a>
          </div>
          <div class="products-item">
            <span>broken item without link</span>
          </div>
          <a class="next-page" href="/search-p2.html">Next</a>
        </body></html>
    "#;

    #[test]
    fn yields_one_candidate_per_linked_item() {
        let outcome = parse_search(PAGE, &site());
        assert_eq!(outcome.candidates.len(), 2);

        let Candidate::Listing(first) = &outcome.candidates[0] else {
            panic!("expected listing candidate");
        };
        assert_eq!(first.item_number, "Solar-Panel-300W-abc123");
        assert_eq!(first.title.as_deref(), Some("Solar Panel 300W Mono"));
        assert_eq!(
            first.listing_url.as_deref(),
            Some("https://www.made-in-china.com/product/Solar-Panel-300W-abc123.html")
        );
        assert_eq!(
            first.image_urls.as_deref(),
            Some(&["https://img.example.com/thumb1.jpg".to_string()][..])
        );
    }

    #[test]
    fn missing_title_degrades_to_unknown_with_warning() {
        let outcome = parse_search(PAGE, &site());

        let Candidate::Listing(second) = &outcome.candidates[1] else {
            panic!("expected listing candidate");
        };
        assert_eq!(second.title, None);
        assert!(outcome.warnings.iter().any(|w| w.field == "title"));
    }

    #[test]
    fn next_page_marker_is_reported() {
        let outcome = parse_search(PAGE, &site());
        assert!(outcome.has_more_pages);

        let last_page = PAGE.replace(r#"<a class="next-page" href="/search-p2.html">Next</a>"#, "");
        let outcome = parse_search(&last_page, &site());
        assert!(!outcome.has_more_pages);
    }
}
