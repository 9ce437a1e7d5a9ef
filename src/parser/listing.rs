use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::config::SiteConfig;
use crate::models::{Candidate, ListingCandidate, SellerCandidate};

use super::price::parse_price;
use super::select::{absolutize, element_text, first_text, select_first, slug_from_url};
use super::seller::clean_company_name;
use super::{ParseOutcome, track};

const TITLE_SELECTORS: &[&str] = &[".product-title", ".title", "h1"];
const PRICE_SELECTORS: &[&str] = &[".product-price", ".price", ".cost", ".amount"];
const SKU_SELECTORS: &[&str] = &[".model-no", ".model", ".sku"];
const BRAND_SELECTORS: &[&str] = &[".brand", ".manufacturer"];
const DESCRIPTION_SELECTORS: &[&str] = &[".description", ".detail", ".content"];
const QUANTITY_SELECTORS: &[&str] = &[".product-property", ".moq-text", ".order-quantity"];
const SELLER_LINK_SELECTORS: &[&str] = &[".company-name a", ".seller a", ".supplier a"];
const ITEM_NO_ATTRS: &[&str] = &["data-item-no", "data-product-id"];

static SKU_RE: OnceLock<Regex> = OnceLock::new();
static QUANTITY_RANGE_RE: OnceLock<Regex> = OnceLock::new();
static QUANTITY_RE: OnceLock<Regex> = OnceLock::new();

fn sku_re() -> &'static Regex {
    SKU_RE.get_or_init(|| Regex::new(r"(?i)model\s*no\.?\s*:?\s*([A-Za-z0-9][A-Za-z0-9_-]*)").unwrap())
}

fn quantity_range_re() -> &'static Regex {
    QUANTITY_RANGE_RE.get_or_init(|| {
        Regex::new(r"(?i)(\d[\d,]*)\s*(?:-|~|to)\s*(\d[\d,]*)\s*(?:pieces?|units?|sets?)").unwrap()
    })
}

fn quantity_re() -> &'static Regex {
    QUANTITY_RE.get_or_init(|| Regex::new(r"(?i)(\d[\d,]*)\s*(?:pieces?|units?|sets?)").unwrap())
}

/// One fully-populated listing candidate per detail page, plus the embedded
/// seller when the page links a company profile.
pub(super) fn parse_listing_detail(
    body: &str,
    page_url: &str,
    site: &SiteConfig,
) -> ParseOutcome {
    let document = Html::parse_document(body);
    let root = document.root_element();
    let mut outcome = ParseOutcome::default();

    let item_number = ITEM_NO_ATTRS
        .iter()
        .find_map(|attr| root.value().attr(attr))
        .map(str::to_string)
        .or_else(|| slug_from_url(page_url));

    let Some(item_number) = item_number else {
        debug!(url = page_url, "Detail page without a usable identity, nothing to extract");
        return outcome;
    };

    let warnings = &mut outcome.warnings;
    let mut candidate = ListingCandidate::new(item_number);
    candidate.listing_url = Some(page_url.to_string());
    candidate.title = track(warnings, "title", first_text(root, TITLE_SELECTORS));
    candidate.price = track(
        warnings,
        "price",
        first_text(root, PRICE_SELECTORS).and_then(|text| parse_price(&text)),
    );
    candidate.sku = track(warnings, "sku", extract_sku(root));
    candidate.brand = first_text(root, BRAND_SELECTORS);
    candidate.description = first_text(root, DESCRIPTION_SELECTORS);
    candidate.image_urls = extract_images(root, &site.base_url);

    let (min_quantity, max_quantity) = extract_quantity_bounds(root);
    candidate.min_order_quantity = min_quantity;
    candidate.max_order_quantity = max_quantity;

    let seller = embedded_seller(root, &site.base_url);
    if let Some(seller) = &seller {
        candidate.seller_url = Some(seller.profile_url.clone());
    }

    outcome.candidates.push(Candidate::Listing(candidate));
    if let Some(seller) = seller {
        outcome.candidates.push(Candidate::Seller(seller));
    }

    outcome
}

fn extract_sku(root: ElementRef<'_>) -> Option<String> {
    if let Some(text) = first_text(root, SKU_SELECTORS) {
        if let Some(captures) = sku_re().captures(&text) {
            return Some(captures[1].to_string());
        }
        return Some(text);
    }

    sku_re()
        .captures(&element_text(root))
        .map(|captures| captures[1].to_string())
}

fn extract_quantity_bounds(root: ElementRef<'_>) -> (Option<u32>, Option<u32>) {
    for raw in QUANTITY_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in root.select(&selector) {
            let text = element_text(element);
            if let Some(captures) = quantity_range_re().captures(&text) {
                return (parse_count(&captures[1]), parse_count(&captures[2]));
            }
            if let Some(captures) = quantity_re().captures(&text) {
                return (parse_count(&captures[1]), None);
            }
        }
    }
    (None, None)
}

fn parse_count(raw: &str) -> Option<u32> {
    raw.replace(',', "").parse().ok()
}

fn extract_images(root: ElementRef<'_>, base_url: &str) -> Option<Vec<String>> {
    let selector = Selector::parse("img").ok()?;
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for element in root.select(&selector) {
        let src = element
            .value()
            .attr("src")
            .or_else(|| element.value().attr("data-src"));
        let Some(src) = src else { continue };
        if src.is_empty() || src.starts_with("data:") {
            continue;
        }
        let url = absolutize(base_url, src);
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }

    if urls.is_empty() { None } else { Some(urls) }
}

fn embedded_seller(root: ElementRef<'_>, base_url: &str) -> Option<SellerCandidate> {
    let link = select_first(root, SELLER_LINK_SELECTORS)?;
    let href = link.value().attr("href")?;
    if href.is_empty() {
        return None;
    }

    let mut seller = SellerCandidate::new(absolutize(base_url, href));
    let name = clean_company_name(&element_text(link));
    if !name.is_empty() {
        seller.name = Some(name);
    }
    Some(seller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Price;

    const PAGE: &str = r#"
        <html><body>
          <h1 class="product-title">300W Mono Solar Panel</h1>
          <div class="product-price">US $29.99-35.00 / Piece</div>
          <div class="product-property">
            <span class="attribute">100 Pieces (MOQ)</span>
            <span class="model">Model NO.: SP-300M</span>
          </div>
          <div class="brand">SunPower</div>
          <div class="description">High efficiency monocrystalline panel.</div>
          <img src="/images/panel-front.jpg">
          <img data-src="//img.example.com/panel-back.jpg">
          <img src="/images/panel-front.jpg">
          <div class="company-name">
            <a href="//seller.made-in-china.com/acme-solar">Acme Solar Co., Ltd. Diamond Member</a>
          </div>
        </body></html>
    "#;

    fn parse(page: &str) -> ParseOutcome {
        parse_listing_detail(
            page,
            "https://www.made-in-china.com/product/Solar-Panel-300W-abc123.html",
            &SiteConfig::default(),
        )
    }

    #[test]
    fn full_page_yields_listing_and_embedded_seller() {
        let outcome = parse(PAGE);
        assert_eq!(outcome.candidates.len(), 2);

        let Candidate::Listing(listing) = &outcome.candidates[0] else {
            panic!("expected listing first");
        };
        assert_eq!(listing.item_number, "Solar-Panel-300W-abc123");
        assert_eq!(listing.title.as_deref(), Some("300W Mono Solar Panel"));
        assert_eq!(listing.price, Some(Price::new(29.99, "USD")));
        assert_eq!(listing.sku.as_deref(), Some("SP-300M"));
        assert_eq!(listing.brand.as_deref(), Some("SunPower"));
        assert_eq!(listing.min_order_quantity, Some(100));
        assert_eq!(
            listing.seller_url.as_deref(),
            Some("https://seller.made-in-china.com/acme-solar")
        );

        let Candidate::Seller(seller) = &outcome.candidates[1] else {
            panic!("expected seller second");
        };
        assert_eq!(seller.profile_url, "https://seller.made-in-china.com/acme-solar");
        assert_eq!(seller.name.as_deref(), Some("Acme Solar Co., Ltd."));
    }

    #[test]
    fn images_are_absolutized_and_deduplicated() {
        let outcome = parse(PAGE);
        let Candidate::Listing(listing) = &outcome.candidates[0] else {
            panic!("expected listing");
        };
        assert_eq!(
            listing.image_urls.as_deref(),
            Some(
                &[
                    "https://www.made-in-china.com/images/panel-front.jpg".to_string(),
                    "https://img.example.com/panel-back.jpg".to_string(),
                ][..]
            )
        );
    }

    #[test]
    fn quantity_range_fills_both_bounds() {
        let page = PAGE.replace("100 Pieces (MOQ)", "100-500 Pieces");
        let outcome = parse(&page);
        let Candidate::Listing(listing) = &outcome.candidates[0] else {
            panic!("expected listing");
        };
        assert_eq!(listing.min_order_quantity, Some(100));
        assert_eq!(listing.max_order_quantity, Some(500));
    }

    #[test]
    fn missing_fields_degrade_to_unknown_without_aborting() {
        let outcome = parse("<html><body><h1 class=\"product-title\">Bare page</h1></body></html>");
        assert_eq!(outcome.candidates.len(), 1);

        let Candidate::Listing(listing) = &outcome.candidates[0] else {
            panic!("expected listing");
        };
        assert_eq!(listing.title.as_deref(), Some("Bare page"));
        assert_eq!(listing.price, None);
        assert_eq!(listing.sku, None);
        assert_eq!(listing.image_urls, None);
        assert!(outcome.warnings.iter().any(|w| w.field == "price"));
        assert!(outcome.warnings.iter().any(|w| w.field == "sku"));
    }
}
