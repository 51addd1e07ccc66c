//! Field extraction for a listing detail page.
//!
//! Every extractor is a pure function of the parsed document. Each field is
//! an ordered fallback chain (see [`strategy`]) so a markup change on the site
//! degrades one field to its sentinel instead of failing the whole listing.

pub mod media;
pub mod odometer;
pub mod phone;
pub mod plate;
pub mod price;
pub mod seller;
pub mod strategy;
pub mod vin;

use scraper::Html;

use crate::models::ExtractedListing;

pub use media::{image_count, image_url, title};
pub use odometer::odometer_km;
pub use phone::{revealed_phone_numbers, static_phone_numbers};
pub use plate::plate_number;
pub use price::price_usd;
pub use seller::seller_name;
pub use vin::vin;

/// Run every extractor over a detail page.
pub fn extract_listing(document: &Html) -> ExtractedListing {
    ExtractedListing {
        title: title(document),
        price_usd: price_usd(document),
        odometer_km: odometer_km(document),
        seller_name: seller_name(document),
        phone_numbers: static_phone_numbers(document),
        image_url: image_url(document),
        image_count: image_count(document),
        plate_number: plate_number(document),
        vin: vin(document),
    }
}

/// Parse and extract in one step.
pub fn extract_listing_html(html: &str) -> ExtractedListing {
    extract_listing(&Html::parse_document(html))
}
