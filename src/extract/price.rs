use lazy_static::lazy_static;
use regex::Regex;
use scraper::Html;

use super::strategy::{FallbackChain, Probe, Strategy};

const MIN_EXCLUSIVE: u64 = 100;
const MAX_EXCLUSIVE: u64 = 300_000;

lazy_static! {
    static ref DOLLAR_AMOUNT: Regex = Regex::new(r"([\d \u{a0}]{3,})\$").unwrap();
}

static PRICE: FallbackChain<u32> = FallbackChain {
    field: "price_usd",
    strategies: &[
        Strategy::new(Probe::Text("span.size32"), tagged_price),
        Strategy::new(Probe::Text("span.size30"), tagged_price),
        Strategy::new(Probe::Text("strong.common-text.ws-pre-wrap.title"), tagged_price),
        Strategy::new(Probe::Text(".price-ticket"), tagged_price),
        Strategy::new(Probe::Text(".price_value"), tagged_price),
        Strategy::new(Probe::Text(".size22"), tagged_price),
        Strategy::new(Probe::DocumentText, price_in_text),
    ],
};

/// Asking price in dollars, or `0` when none is found in the plausible range.
pub fn price_usd(document: &Html) -> u32 {
    PRICE.resolve_or(document, 0)
}

/// Concatenate every digit in `text`, e.g. `"$12 345"` -> `12345`.
pub fn extract_digits(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

fn plausible(value: u64) -> Option<u32> {
    if MIN_EXCLUSIVE < value && value < MAX_EXCLUSIVE {
        u32::try_from(value).ok()
    } else {
        None
    }
}

fn tagged_price(text: &str) -> Option<u32> {
    if !text.contains('$') {
        return None;
    }
    extract_digits(text).and_then(plausible)
}

fn price_in_text(text: &str) -> Option<u32> {
    let caps = DOLLAR_AMOUNT.captures(text)?;
    extract_digits(&caps[1]).and_then(plausible)
}
