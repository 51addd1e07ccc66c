use lazy_static::lazy_static;
use regex::Regex;
use scraper::Html;

use super::strategy::{FallbackChain, Probe, Strategy};
use crate::models::PLATE_MISSING;

lazy_static! {
    // Latin or Cyrillic series letters around a 3-4 digit number, e.g. "AA 1234 BB".
    static ref PLATE: Regex =
        Regex::new(r"^([A-ZА-ЯІЇЄ]{2,3}\s?\d{3,4}\s?[A-ZА-ЯІЇЄ]{2,3})").unwrap();
}

static PLATE_NUMBER: FallbackChain<String> = FallbackChain {
    field: "plate_number",
    strategies: &[Strategy::new(Probe::Text(".state-num"), leading_plate)],
};

pub fn plate_number(document: &Html) -> String {
    PLATE_NUMBER.resolve_or(document, PLATE_MISSING.to_string())
}

fn leading_plate(text: &str) -> Option<String> {
    let caps = PLATE.captures(text)?;
    Some(caps[1].replace("  ", " ").trim().to_string())
}
