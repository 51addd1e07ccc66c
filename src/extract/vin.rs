use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html};

use super::strategy::{element_text, select_all, FallbackChain, Probe, Strategy};
use crate::models::VIN_PROBLEM;

const VIN_LEN: usize = 17;

lazy_static! {
    static ref VIN_TOKEN: Regex = Regex::new(r"\b[A-HJ-NPR-Z0-9]{17}\b").unwrap();
    static ref VIN_LABEL: Regex = Regex::new(r"(?i)VIN[-\s]?(?:код|code)").unwrap();
}

static VIN: FallbackChain<String> = FallbackChain {
    field: "vin",
    strategies: &[
        Strategy::new(Probe::Text(".vin-code"), vin_token),
        Strategy::new(Probe::Text("span.common-text.ws-pre-wrap.badge"), vin_token),
        Strategy::new(Probe::Custom(labelled_values), vin_token),
        Strategy::new(Probe::Custom(text_after_vin_caption), vin_token),
        Strategy::new(Probe::DocumentText, vin_token),
    ],
};

/// Vehicle identification number, or [`VIN_PROBLEM`] when none can be found.
pub fn vin(document: &Html) -> String {
    VIN.resolve_or(document, VIN_PROBLEM.to_string())
}

/// The 17-character code inside `text`; anything else falls through.
fn vin_token(text: &str) -> Option<String> {
    if text.chars().count() < VIN_LEN {
        return None;
    }
    VIN_TOKEN.find(text).map(|m| m.as_str().to_string())
}

/// `<div class="label">VIN</div> ... <div class="value" title="...">`:
/// the value's `title` first, then its text.
fn labelled_values(document: &Html) -> Vec<String> {
    let Some(label) = select_all(document, "div.label")
        .into_iter()
        .find(|label| element_text(label).contains("VIN"))
    else {
        return Vec::new();
    };

    let value = label
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "div" && el.value().classes().any(|c| c == "value"));

    let mut out = Vec::new();
    if let Some(value) = value {
        if let Some(title) = value.value().attr("title") {
            out.push(title.trim().to_string());
        }
        out.push(element_text(&value));
    }
    out
}

/// The first text node mentioning "VIN code", followed by the text of every
/// sibling after its parent element.
fn text_after_vin_caption(document: &Html) -> Vec<String> {
    let caption = document
        .root_element()
        .descendants()
        .find(|node| node.value().as_text().is_some_and(|t| VIN_LABEL.is_match(t)));
    let Some(caption) = caption else {
        return Vec::new();
    };

    let mut out = Vec::new();
    if let Some(text) = caption.value().as_text() {
        out.push(text.to_string());
    }
    if let Some(parent) = caption.parent() {
        for sibling in parent.next_siblings() {
            if let Some(el) = ElementRef::wrap(sibling) {
                out.push(el.text().collect());
            } else if let Some(text) = sibling.value().as_text() {
                out.push(text.to_string());
            }
        }
    }
    out
}
