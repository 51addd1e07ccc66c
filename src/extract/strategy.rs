//! Ordered fallback chains.
//!
//! A field is described as a list of [`Strategy`] values. Each strategy pairs a
//! [`Probe`] (where to look for candidate strings) with an `accept` function
//! (validate and convert one candidate). The chain walks strategies in order,
//! and within a strategy walks candidates in document order, stopping at the
//! first candidate that `accept` turns into a value.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Where a strategy looks for candidate strings
#[derive(Clone, Copy)]
pub enum Probe {
    /// Trimmed text of every element matching the CSS selector
    Text(&'static str),
    /// Trimmed value of an attribute on every matching element that has it
    Attr(&'static str, &'static str),
    /// The text of the whole document
    DocumentText,
    /// A hand-written candidate producer for structure CSS cannot express
    Custom(fn(&Html) -> Vec<String>),
}

impl Probe {
    fn candidates(&self, document: &Html) -> Vec<String> {
        match *self {
            Probe::Text(css) => select_all(document, css)
                .into_iter()
                .map(|el| element_text(&el))
                .collect(),
            Probe::Attr(css, attr) => select_all(document, css)
                .into_iter()
                .filter_map(|el| el.value().attr(attr).map(|v| v.trim().to_string()))
                .collect(),
            Probe::DocumentText => vec![document_text(document)],
            Probe::Custom(produce) => produce(document),
        }
    }

    fn describe(&self) -> String {
        match *self {
            Probe::Text(css) => format!("text({css})"),
            Probe::Attr(css, attr) => format!("attr({css}@{attr})"),
            Probe::DocumentText => "document text".to_string(),
            Probe::Custom(_) => "custom".to_string(),
        }
    }
}

pub struct Strategy<T> {
    pub probe: Probe,
    pub accept: fn(&str) -> Option<T>,
}

impl<T> Strategy<T> {
    pub const fn new(probe: Probe, accept: fn(&str) -> Option<T>) -> Self {
        Self { probe, accept }
    }

    /// First candidate this strategy accepts, if any.
    pub fn apply(&self, document: &Html) -> Option<T> {
        self.probe
            .candidates(document)
            .iter()
            .find_map(|candidate| (self.accept)(candidate))
    }
}

/// Field chains are written as `static` struct literals.
pub struct FallbackChain<T: 'static> {
    pub field: &'static str,
    pub strategies: &'static [Strategy<T>],
}

impl<T: 'static> FallbackChain<T> {
    pub fn first_match(&self, document: &Html) -> Option<T> {
        self.strategies.iter().enumerate().find_map(|(stage, strategy)| {
            let value = strategy.apply(document)?;
            debug!(
                field = self.field,
                stage,
                probe = %strategy.probe.describe(),
                "fallback chain matched"
            );
            Some(value)
        })
    }

    pub fn resolve_or(&self, document: &Html, sentinel: T) -> T {
        self.first_match(document).unwrap_or(sentinel)
    }
}

/// Parse a selector, logging instead of failing on a malformed one.
pub fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            debug!(selector = css, error = %e, "skipping unparseable selector");
            None
        }
    }
}

pub fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match parse_selector(css) {
        Some(selector) => document.select(&selector).collect(),
        None => Vec::new(),
    }
}

pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// All text nodes of the document joined by single spaces.
pub fn document_text(document: &Html) -> String {
    document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Accept any non-empty candidate as-is.
pub fn non_empty(candidate: &str) -> Option<String> {
    (!candidate.is_empty()).then(|| candidate.to_string())
}
