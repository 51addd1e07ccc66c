//! Phone numbers from `tel:` links and free text.
//!
//! Numbers are normalized to their digits and kept only when 9 to 12 digits
//! long. Duplicates collapse to the first occurrence.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::Html;

use super::strategy::select_all;

const MIN_DIGITS: usize = 9;
const MAX_DIGITS: usize = 12;

lazy_static! {
    // Optional +38 country prefix, trunk zero, nine subscriber digits.
    static ref NATIONAL_PHONE: Regex = Regex::new(r"(?:\+?38)?0\d{9}").unwrap();
}

pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    (MIN_DIGITS..=MAX_DIGITS)
        .contains(&digits.len())
        .then_some(digits)
}

pub fn tel_link_numbers(document: &Html) -> Vec<String> {
    select_all(document, r#"a[href^="tel:"]"#)
        .into_iter()
        .filter_map(|a| a.value().attr("href").and_then(normalize_phone))
        .collect()
}

pub fn text_numbers(document: &Html) -> Vec<String> {
    document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .flat_map(|t| NATIONAL_PHONE.find_iter(t).map(|m| m.as_str()))
        .filter_map(normalize_phone)
        .collect()
}

/// Numbers visible in the static page: links and free text together.
///
/// `None` means nothing was found and the browser has to reveal the number.
pub fn static_phone_numbers(document: &Html) -> Option<String> {
    let mut numbers = tel_link_numbers(document);
    numbers.extend(text_numbers(document));
    join_numbers(numbers)
}

/// Numbers on a page after the reveal buttons were clicked. Free text is only
/// consulted when no `tel:` link turned up.
pub fn revealed_phone_numbers(document: &Html) -> Option<String> {
    join_numbers(tel_link_numbers(document)).or_else(|| join_numbers(text_numbers(document)))
}

fn join_numbers(numbers: Vec<String>) -> Option<String> {
    let mut unique: Vec<String> = Vec::with_capacity(numbers.len());
    for number in numbers {
        if !unique.contains(&number) {
            unique.push(number);
        }
    }
    (!unique.is_empty()).then(|| unique.join(", "))
}
