use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stored when no phone number could be found, statically or in the browser
pub const NO_PHONE: &str = "-";

/// Stored instead of a seller name when the listing is sold or has no seller block
pub const SELLER_INACTIVE: &str = "Машина продана";

/// Stored when the plate number element is missing or malformed
pub const PLATE_MISSING: &str = "Номер автомобіля відсутній";

/// Stored when no VIN-shaped code was found anywhere on the page
pub const VIN_PROBLEM: &str = "Проблема з VIN кодом";

/// Everything the field extractors pull out of one detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedListing {
    pub title: String,
    pub price_usd: u32,
    pub odometer_km: u32,
    pub seller_name: String,
    /// `None` means the static page had no number and the browser must be asked
    pub phone_numbers: Option<String>,
    pub image_url: String,
    pub image_count: u32,
    pub plate_number: String,
    pub vin: String,
}

/// A persisted vehicle listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingRecord {
    pub url: String,
    pub title: String,
    pub price_usd: u32,
    pub odometer_km: u32,
    pub seller_name: String,
    pub phone_numbers: String,
    pub image_url: String,
    pub image_count: u32,
    pub plate_number: String,
    pub vin: String,
    pub discovered_at: DateTime<Utc>,
}

impl ListingRecord {
    /// Build the record for `url` once the phone question has been settled.
    pub fn from_extracted(
        url: impl Into<String>,
        extracted: ExtractedListing,
        discovered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.into(),
            title: extracted.title,
            price_usd: extracted.price_usd,
            odometer_km: extracted.odometer_km,
            seller_name: extracted.seller_name,
            phone_numbers: extracted
                .phone_numbers
                .unwrap_or_else(|| NO_PHONE.to_string()),
            image_url: extracted.image_url,
            image_count: extracted.image_count,
            plate_number: extracted.plate_number,
            vin: extracted.vin,
            discovered_at,
        }
    }
}

impl fmt::Display for ListingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}
