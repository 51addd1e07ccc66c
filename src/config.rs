//! Run configuration.
//!
//! Everything the pipeline needs is carried in a [`ScrapeConfig`] value that is
//! handed to [`crate::pipeline::run_scrape`]. The binary builds it from the
//! environment (and an optional `.env` file); tests build it directly.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://auto.ria.com/car/used/";

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Listing collection; pages are requested as `{base_url}?page={n}`
    pub base_url: String,
    /// How many listing pages to walk, starting from page 1
    pub num_pages: u32,
    /// Size of the worker pool (never below 1)
    pub num_workers: usize,
    /// Pause between listing page requests
    pub page_delay: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub database_path: PathBuf,
    pub headless: bool,
    /// Upper bound on time spent dismissing consent overlays per page
    pub consent_wait: Duration,
    /// Pause after each reveal click so the page can re-render
    pub click_settle: Duration,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            num_pages: 1,
            num_workers: 6,
            page_delay: Duration::from_millis(100),
            request_timeout: Duration::from_secs(30),
            user_agent: USER_AGENT.to_string(),
            database_path: PathBuf::from("listings.sqlite3"),
            headless: true,
            consent_wait: Duration::from_secs(3),
            click_settle: Duration::from_millis(80),
        }
    }
}

impl ScrapeConfig {
    /// Load `.env` if present, then read `SCRAPER_*` variables over the defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_url) = lookup("SCRAPER_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(pages) = parse_var::<u32, _>(&lookup, "SCRAPER_NUM_PAGES")? {
            config.num_pages = pages;
        }
        if let Some(workers) = parse_var::<usize, _>(&lookup, "SCRAPER_NUM_WORKERS")? {
            config.num_workers = workers.max(1);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "SCRAPER_PAGE_DELAY_MS")? {
            config.page_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "SCRAPER_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(path) = lookup("SCRAPER_DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(headless) = parse_var::<bool, _>(&lookup, "SCRAPER_HEADLESS")? {
            config.headless = headless;
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("invalid value for {key}: {raw:?}"))
        })
        .transpose()
}
