use std::sync::OnceLock;

use regex::Regex;

use crate::models::Price;

static AMOUNT_RE: OnceLock<Regex> = OnceLock::new();

fn amount_re() -> &'static Regex {
    AMOUNT_RE.get_or_init(|| Regex::new(r"\d+(?:[.,]\d+)*").unwrap())
}

/// Currency symbols, most specific first so "US $" wins over "$".
const SYMBOLS: &[(&str, &str)] = &[
    ("US $", "USD"),
    ("US$", "USD"),
    ("$", "USD"),
    ("€", "EUR"),
    ("£", "GBP"),
    ("RMB", "CNY"),
    ("¥", "CNY"),
];

const ISO_CODES: &[&str] = &["USD", "EUR", "GBP", "CNY", "JPY", "AUD", "CAD"];

/// Normalize marketplace price text to (amount, currency code).
/// Tolerates symbol and ISO-code conventions, thousands separators,
/// decimal commas, and price ranges (first bound wins). Anything
/// non-numeric yields unknown.
pub fn parse_price(text: &str) -> Option<Price> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut currency = SYMBOLS
        .iter()
        .find(|(symbol, _)| trimmed.contains(*symbol))
        .map(|(_, code)| *code);

    if currency.is_none() {
        let upper = trimmed.to_uppercase();
        currency = ISO_CODES.iter().find(|code| upper.contains(*code)).copied();
    }

    let raw = amount_re().find(trimmed)?.as_str();
    let amount: f64 = normalize_number(raw).parse().ok()?;
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }

    Some(Price::new(amount, currency.unwrap_or("USD")))
}

fn normalize_number(raw: &str) -> String {
    let commas = raw.matches(',').count();

    if raw.contains('.') || commas != 1 {
        // "1,234.56" style: commas are thousands separators.
        return raw.replace(',', "");
    }

    // A single comma with a two-digit tail is a decimal comma ("10,50").
    match raw.split_once(',') {
        Some((_, tail)) if tail.len() == 2 => raw.replace(',', "."),
        _ => raw.replace(',', ""),
    }
}
