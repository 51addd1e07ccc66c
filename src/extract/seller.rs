use scraper::Html;

use super::strategy::{non_empty, FallbackChain, Probe, Strategy};
use crate::models::SELLER_INACTIVE;

const SOLD_MARKER: &str = "продан";

static SELLER: FallbackChain<String> = FallbackChain {
    field: "seller_name",
    strategies: &[
        Strategy::new(Probe::Text(".seller_info_name"), non_empty),
        Strategy::new(Probe::Text(".seller_info__name"), non_empty),
        Strategy::new(Probe::Text(".seller_info_name_top"), non_empty),
        Strategy::new(Probe::Text(".person-link"), non_empty),
    ],
};

/// Seller display name. A missing seller block or a "sold" marker both mean
/// the listing is no longer active.
pub fn seller_name(document: &Html) -> String {
    match SELLER.first_match(document) {
        Some(name) if !name.to_lowercase().contains(SOLD_MARKER) => name,
        _ => SELLER_INACTIVE.to_string(),
    }
}
