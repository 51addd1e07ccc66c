//! Listing page traversal.
//!
//! Pages are walked strictly in order with a pause between requests. Every
//! listing card contributes the href of its detail link; nothing is
//! deduplicated here.

use crate::extract::strategy::{parse_selector, select_all};
use crate::scrapers::traits::PageFetcher;
use anyhow::Result;
use scraper::Html;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const CARD: &str = ".content-bar";
const CARD_LINK: &str = "a.address";

/// Detail URLs gathered from the listing pages
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub urls: Vec<String>,
    pub pages_fetched: usize,
}

/// `{base}?page=1` through `{base}?page={num_pages}`.
pub fn listing_page_urls(base_url: &str, num_pages: u32) -> Vec<String> {
    (1..=num_pages)
        .map(|page| format!("{base_url}?page={page}"))
        .collect()
}

/// Detail links of every listing card on one page, resolved against `page_url`.
pub fn parse_listing_cards(html: &str, page_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    let Some(link) = parse_selector(CARD_LINK) else {
        return Vec::new();
    };

    let mut urls = Vec::new();
    for card in select_all(&document, CARD) {
        let Some(href) = card
            .select(&link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
        else {
            continue;
        };

        let resolved = match &base {
            Some(base) => base
                .join(href)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        };
        urls.push(resolved);
    }
    urls
}

/// Walk listing pages 1..=`num_pages` and collect their detail URLs.
///
/// A page that fails to download is skipped with a warning. The run only
/// fails when pages were requested and none could be fetched.
pub async fn discover_listing_urls<F>(
    fetcher: &F,
    base_url: &str,
    num_pages: u32,
    delay: Duration,
) -> Result<Discovery>
where
    F: PageFetcher + ?Sized,
{
    info!("Walking {} listing page(s) of {}", num_pages, base_url);

    let pages = listing_page_urls(base_url, num_pages);
    let mut discovery = Discovery::default();

    for (idx, page_url) in pages.iter().enumerate() {
        if idx > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let html = match fetcher.fetch(page_url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Listing page {} failed: {:#}", page_url, e);
                continue;
            }
        };
        discovery.pages_fetched += 1;

        let found = parse_listing_cards(&html, page_url);
        debug!("Found {} listing cards on {}", found.len(), page_url);
        discovery.urls.extend(found);
    }

    if num_pages > 0 && discovery.pages_fetched == 0 {
        anyhow::bail!("none of the {num_pages} listing page(s) of {base_url} could be fetched");
    }

    Ok(discovery)
}
