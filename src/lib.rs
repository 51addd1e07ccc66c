//! Collects used-car listings from auto.ria.com into a local store.
//!
//! A run walks the listing pages, then hands every detail URL to a pool of
//! workers that extract the listing fields, ask a headless browser for the
//! seller's phone number when the page hides it, and store listings not seen
//! before. See [`pipeline::run_scrape`].

pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod scrapers;
pub mod store;

pub use config::ScrapeConfig;
pub use pipeline::run_scrape;
