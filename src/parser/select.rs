use scraper::{ElementRef, Selector};

/// Element text with whitespace collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn select_first<'a>(root: ElementRef<'a>, selectors: &[&str]) -> Option<ElementRef<'a>> {
    for raw in selectors {
        if let Ok(selector) = Selector::parse(raw) {
            if let Some(element) = root.select(&selector).next() {
                return Some(element);
            }
        }
    }
    None
}

/// First non-empty text under any of the selectors, tried in order.
pub fn first_text(root: ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    for raw in selectors {
        if let Ok(selector) = Selector::parse(raw) {
            for element in root.select(&selector) {
                let text = element_text(element);
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

/// First non-empty attribute value under any of the selectors, attributes
/// tried in preference order per element.
pub fn first_attr(root: ElementRef<'_>, selectors: &[&str], attrs: &[&str]) -> Option<String> {
    for raw in selectors {
        if let Ok(selector) = Selector::parse(raw) {
            for element in root.select(&selector) {
                for attr in attrs {
                    if let Some(value) = element.value().attr(attr) {
                        if !value.is_empty() {
                            return Some(value.to_string());
                        }
                    }
                }
            }
        }
    }
    None
}

/// Resolve scheme-relative and root-relative links against the site base.
pub fn absolutize(base_url: &str, href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    } else {
        href.to_string()
    }
}

/// Last path segment of a URL without the `.html` suffix. The listing URL
/// slug is the stable identity for a product across scrape runs.
pub fn slug_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let without_scheme = path.split_once("://").map(|(_, rest)| rest).unwrap_or(path);
    let (_, path_part) = without_scheme.split_once('/')?;

    let segment = path_part.trim_end_matches('/').rsplit('/').next()?;
    let slug = segment.trim_end_matches(".html").trim();

    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolutize_handles_the_three_link_shapes() {
        let base = "https://www.made-in-china.com";
        assert_eq!(
            absolutize(base, "https://cdn.example.com/a.jpg"),
            "https://cdn.example.com/a.jpg"
        );
        assert_eq!(
            absolutize(base, "//img.example.com/a.jpg"),
            "https://img.example.com/a.jpg"
        );
        assert_eq!(
            absolutize(base, "/product/abc.html"),
            "https://www.made-in-china.com/product/abc.html"
        );
    }

    #[test]
    fn slug_strips_suffix_and_query() {
        assert_eq!(
            slug_from_url("https://example.com/product/Solar-Panel-300W-xyz.html?ref=1"),
            Some("Solar-Panel-300W-xyz".to_string())
        );
        assert_eq!(slug_from_url("https://example.com/"), None);
    }
}
