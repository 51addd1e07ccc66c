use lazy_static::lazy_static;
use regex::Regex;
use scraper::Html;

use super::strategy::{FallbackChain, Probe, Strategy};

lazy_static! {
    static ref KM_IN_TEXT: Regex = Regex::new(r"([\d.,\s\u{a0}]+)\s*(тис\.?)?\s*км").unwrap();
}

const THOUSAND_MARKERS: [&str; 2] = ["тис", "тыс"];

static ODOMETER: FallbackChain<u32> = FallbackChain {
    field: "odometer_km",
    strategies: &[
        Strategy::new(Probe::Text("span.size18"), tagged_odometer),
        Strategy::new(Probe::Text(".base-information span"), tagged_odometer),
        Strategy::new(Probe::Text(".js-race"), tagged_odometer),
        Strategy::new(Probe::DocumentText, odometer_in_text),
    ],
};

/// Mileage in kilometres, `0` when the page shows none.
pub fn odometer_km(document: &Html) -> u32 {
    ODOMETER.resolve_or(document, 0)
}

/// Normalize an odometer reading to kilometres.
///
/// Separators (spaces, NBSP, dots, commas) are dropped before the digits are
/// read, and a thousand-kilometre unit multiplies the result by 1000. Returns
/// `None` when the text has no digits at all.
pub fn parse_odometer(text: &str) -> Option<u32> {
    let lowered = text.to_lowercase();
    let digits: String = lowered.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    let value: u32 = digits.parse().ok()?;
    if THOUSAND_MARKERS.iter().any(|m| lowered.contains(m)) {
        value.checked_mul(1000)
    } else {
        Some(value)
    }
}

fn tagged_odometer(text: &str) -> Option<u32> {
    let looks_like_mileage = text.contains("км")
        || text.contains("тис")
        || (!text.is_empty() && text.chars().all(|c| c.is_ascii_digit()));
    if !looks_like_mileage {
        return None;
    }
    parse_odometer(text)
}

fn odometer_in_text(text: &str) -> Option<u32> {
    KM_IN_TEXT
        .find_iter(text)
        .find_map(|m| parse_odometer(m.as_str()))
}
