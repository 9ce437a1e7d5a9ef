use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::models::{Candidate, SellerCandidate};

use super::select::{element_text, first_text};
use super::{ParseOutcome, track};

const NAME_SELECTORS: &[&str] = &[".company-name", ".company-title", "h1", ".title"];
const RATING_SELECTORS: &[&str] = &[".rating", ".score", ".stars", ".evaluation-rate"];
const REVIEW_SELECTORS: &[&str] = &[".reviews", ".review-count"];
const CERTIFICATE_SELECTORS: &[&str] = &[".certificate", ".certificates", ".document", ".documents"];
const CONTACT_SELECTORS: &[&str] = &[".contact", ".contact-info", ".email"];
const PHONE_SELECTORS: &[&str] = &[".phone", ".tel", ".telephone"];
const ZIP_SELECTORS: &[&str] = &[".zip", ".postal", ".zipcode"];

static MEMBER_SUFFIX_RE: OnceLock<Regex> = OnceLock::new();
static RATING_RE: OnceLock<Regex> = OnceLock::new();
static COUNT_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();
static ZIP_RE: OnceLock<Regex> = OnceLock::new();
static LOCATION_RE: OnceLock<Regex> = OnceLock::new();
static ADDRESS_RE: OnceLock<Regex> = OnceLock::new();
static BUSINESS_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn member_suffix_re() -> &'static Regex {
    MEMBER_SUFFIX_RE.get_or_init(|| {
        Regex::new(r"(?i)\s*(Diamond Member|Audited Supplier|Trading Company|Manufacturer|Factory).*$")
            .unwrap()
    })
}

fn rating_re() -> &'static Regex {
    RATING_RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\s*/\s*5").unwrap())
}

fn count_re() -> &'static Regex {
    COUNT_RE.get_or_init(|| Regex::new(r"\d+").unwrap())
}

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
    })
}

fn phone_re() -> &'static Regex {
    PHONE_RE.get_or_init(|| Regex::new(r"\+?\d[\d\s()\-]{6,}").unwrap())
}

fn zip_re() -> &'static Regex {
    ZIP_RE.get_or_init(|| Regex::new(r"\b\d{5,6}\b").unwrap())
}

fn location_re() -> &'static Regex {
    LOCATION_RE.get_or_init(|| Regex::new(r"([A-Za-z][A-Za-z ]*?),\s*(China)\b").unwrap())
}

fn address_re() -> &'static Regex {
    ADDRESS_RE.get_or_init(|| Regex::new(r"Address:\s*([^\n<]{5,120})").unwrap())
}

fn business_name_re() -> &'static Regex {
    BUSINESS_NAME_RE.get_or_init(|| {
        Regex::new(r"[A-Z][A-Za-z&.\s]{2,60}?(?:Co\.?,?\s*Ltd\.?|Limited|Corp(?:oration)?\.?|Inc\.?|Group)")
            .unwrap()
    })
}

/// Drop membership-tier suffixes the site appends to company names.
pub(super) fn clean_company_name(raw: &str) -> String {
    member_suffix_re().replace(raw, "").trim().to_string()
}

/// One fully-populated seller candidate per profile page. The profile URL
/// itself is the identity key.
pub(super) fn parse_seller_profile(body: &str, page_url: &str) -> ParseOutcome {
    let document = Html::parse_document(body);
    let root = document.root_element();
    let mut outcome = ParseOutcome::default();
    let page_text = element_text(root);

    let warnings = &mut outcome.warnings;
    let mut candidate = SellerCandidate::new(page_url);

    candidate.name = track(
        warnings,
        "name",
        first_text(root, NAME_SELECTORS).map(|name| clean_company_name(&name)),
    );
    candidate.rating = track(warnings, "rating", extract_rating(root));
    candidate.review_count = extract_review_count(root);
    candidate.email = extract_email(root);
    candidate.phone = extract_phone(root);
    candidate.zip_code = extract_zip(root);

    candidate.business_name = business_name_re()
        .find(&page_text)
        .map(|m| m.as_str().trim().to_string());

    if let Some(captures) = location_re().captures(&page_text) {
        candidate.state_province = Some(captures[1].trim().to_string());
        candidate.country = Some(captures[2].to_string());
    }

    candidate.address = address_re()
        .captures(&page_text)
        .map(|captures| captures[1].trim().to_string());

    outcome.candidates.push(Candidate::Seller(candidate));
    outcome
}

/// Ratings come as "4.8/5" style fragments; anything outside the 0..=5
/// band is treated as noise, not data.
fn extract_rating(root: ElementRef<'_>) -> Option<f64> {
    for raw in RATING_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in root.select(&selector) {
            let text = element_text(element);
            if let Some(captures) = rating_re().captures(&text) {
                if let Ok(rating) = captures[1].parse::<f64>() {
                    if (0.0..=5.0).contains(&rating) {
                        return Some(rating);
                    }
                }
            }
        }
    }
    None
}

fn extract_review_count(root: ElementRef<'_>) -> Option<u32> {
    for raw in REVIEW_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in root.select(&selector) {
            let text = element_text(element);
            if let Some(m) = count_re().find(&text) {
                if let Ok(count) = m.as_str().parse() {
                    return Some(count);
                }
            }
        }
    }
    None
}

/// Certificate and document sections are scanned before generic contact
/// blocks; that is where the site actually exposes addresses.
fn extract_email(root: ElementRef<'_>) -> Option<String> {
    for selectors in [CERTIFICATE_SELECTORS, CONTACT_SELECTORS] {
        for raw in selectors {
            let Ok(selector) = Selector::parse(raw) else {
                continue;
            };
            for element in root.select(&selector) {
                let text = element_text(element);
                if let Some(m) = email_re().find(&text) {
                    return Some(m.as_str().to_string());
                }
            }
        }
    }
    None
}

fn extract_phone(root: ElementRef<'_>) -> Option<String> {
    for raw in PHONE_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in root.select(&selector) {
            let text = element_text(element);
            if let Some(m) = phone_re().find(&text) {
                return Some(m.as_str().trim().to_string());
            }
        }
    }
    None
}

fn extract_zip(root: ElementRef<'_>) -> Option<String> {
    for raw in ZIP_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in root.select(&selector) {
            let text = element_text(element);
            if let Some(m) = zip_re().find(&text) {
                return Some(m.as_str().to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <h1 class="company-name">Acme Solar Co., Ltd. Audited Supplier</h1>
          <div class="evaluation-rate">Rating: 4.8/5</div>
          <div class="review-count">132 reviews</div>
          <div class="company-profile">
            COMPANY PROFILE Acme Solar Technology Co., Ltd. founded 2008.
            Address: 88 Panel Road, Wuxi, Jiangsu, China
            Located in Jiangsu, China with worldwide export.
          </div>
          <div class="certificates">
            CE certificate issued to sales@acmesolar.example.com
          </div>
          <div class="contact">
            Tel: +86 510-1234567
          </div>
          <div class="zipcode">Zip: 214000</div>
        </body></html>
    "#;

    fn parse(page: &str) -> SellerCandidate {
        let outcome = parse_seller_profile(page, "https://seller.example.com/acme-solar");
        let Candidate::Seller(candidate) = outcome.candidates.into_iter().next().unwrap() else {
            panic!("expected seller candidate");
        };
        candidate
    }

    #[test]
    fn profile_fields_are_extracted() {
        let seller = parse(PAGE);
        assert_eq!(seller.profile_url, "https://seller.example.com/acme-solar");
        assert_eq!(seller.name.as_deref(), Some("Acme Solar Co., Ltd."));
        assert_eq!(seller.rating, Some(4.8));
        assert_eq!(seller.review_count, Some(132));
        assert_eq!(seller.email.as_deref(), Some("sales@acmesolar.example.com"));
        assert_eq!(seller.phone.as_deref(), Some("+86 510-1234567"));
        assert_eq!(seller.zip_code.as_deref(), Some("214000"));
        assert_eq!(seller.country.as_deref(), Some("China"));
    }

    #[test]
    fn rating_outside_scale_is_dropped() {
        let page = PAGE.replace("4.8/5", "9.9/5");
        let seller = parse(&page);
        assert_eq!(seller.rating, None);
    }

    #[test]
    fn missing_sections_stay_unknown() {
        let seller = parse("<html><body><h1 class=\"company-name\">Acme</h1></body></html>");
        assert_eq!(seller.name.as_deref(), Some("Acme"));
        assert_eq!(seller.rating, None);
        assert_eq!(seller.email, None);
        assert_eq!(seller.review_count, None);
    }

    #[test]
    fn membership_suffix_is_stripped_from_names() {
        assert_eq!(
            clean_company_name("Acme Solar Co., Ltd. Diamond Member"),
            "Acme Solar Co., Ltd."
        );
        assert_eq!(clean_company_name("Plain Name"), "Plain Name");
    }
}
