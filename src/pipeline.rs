//! The scrape run: discovery, then a fixed pool of workers over the URLs.
//!
//! Each worker owns at most one browser session. It is launched the first
//! time a listing hides its phone number, reused for every later listing the
//! worker takes, and closed by that same worker when the queue runs dry or a
//! reveal on it fails.
//! The store is the only thing workers share.

use crate::config::ScrapeConfig;
use crate::error::UrlError;
use crate::extract::extract_listing_html;
use crate::models::ListingRecord;
use crate::scrapers::discovery::discover_listing_urls;
use crate::scrapers::traits::{PageFetcher, RevealSession, SessionFactory};
use crate::scrapers::types::{ScrapeSummary, UrlOutcome, WorkerReport};
use crate::store::{InsertOutcome, ListingStore};
use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

type Queue = Arc<Mutex<VecDeque<String>>>;

/// Run one complete scrape and return once every discovered URL was handled.
///
/// Fails only when no listing page could be fetched at all. Individual
/// listings that fail are logged and counted in the summary.
pub async fn run_scrape<F, S, P>(
    config: &ScrapeConfig,
    fetcher: Arc<F>,
    store: Arc<S>,
    sessions: Arc<P>,
) -> Result<ScrapeSummary>
where
    F: PageFetcher + 'static,
    S: ListingStore + 'static,
    P: SessionFactory,
{
    let discovery = discover_listing_urls(
        fetcher.as_ref(),
        &config.base_url,
        config.num_pages,
        config.page_delay,
    )
    .await
    .context("listing discovery failed")?;

    info!(
        "Found {} listings on {} page(s)",
        discovery.urls.len(),
        discovery.pages_fetched
    );

    let mut summary = process_urls(discovery.urls, config.num_workers, fetcher, store, sessions).await;
    summary.listing_pages = discovery.pages_fetched;
    Ok(summary)
}

/// Fan `urls` out over `num_workers` workers.
pub async fn process_urls<F, S, P>(
    urls: Vec<String>,
    num_workers: usize,
    fetcher: Arc<F>,
    store: Arc<S>,
    sessions: Arc<P>,
) -> ScrapeSummary
where
    F: PageFetcher + 'static,
    S: ListingStore + 'static,
    P: SessionFactory,
{
    let mut summary = ScrapeSummary {
        discovered: urls.len(),
        ..ScrapeSummary::default()
    };
    let queue: Queue = Arc::new(Mutex::new(VecDeque::from(urls)));

    let handles: Vec<_> = (0..num_workers.max(1))
        .map(|id| {
            let worker = Worker {
                id,
                fetcher: Arc::clone(&fetcher),
                store: Arc::clone(&store),
                sessions: Arc::clone(&sessions),
                session: None,
            };
            tokio::spawn(worker.run(Arc::clone(&queue)))
        })
        .collect();

    for handle in handles {
        match handle.await {
            Ok(report) => summary.absorb(report),
            Err(e) => error!("Worker task died: {}", e),
        }
    }

    summary.unprocessed = queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .len();
    summary
}

fn next_url(queue: &Mutex<VecDeque<String>>) -> Option<String> {
    queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
}

struct Worker<F, S, P: SessionFactory> {
    id: usize,
    fetcher: Arc<F>,
    store: Arc<S>,
    sessions: Arc<P>,
    session: Option<P::Session>,
}

impl<F, S, P> Worker<F, S, P>
where
    F: PageFetcher + 'static,
    S: ListingStore + 'static,
    P: SessionFactory,
{
    async fn run(mut self, queue: Queue) -> WorkerReport {
        let mut report = WorkerReport::default();

        while let Some(url) = next_url(&queue) {
            match self.process(&url).await {
                Ok(outcome) => {
                    if outcome != UrlOutcome::Saved {
                        debug!("Skipped {} ({:?})", url, outcome);
                    }
                    report.record(outcome);
                }
                Err(UrlError::Session(e)) => {
                    error!(worker = self.id, "Stopping worker, no browser for {}: {:#}", url, e);
                    report.failed += 1;
                    break;
                }
                Err(e) => {
                    warn!("Failed {}: {:#}", url, e);
                    report.failed += 1;
                }
            }
        }

        self.shutdown().await;
        report
    }

    /// Dedup check, fetch, extract, optional browser reveal, insert.
    async fn process(&mut self, url: &str) -> Result<UrlOutcome, UrlError> {
        if self.store.exists(url)? {
            return Ok(UrlOutcome::AlreadyStored);
        }

        let html = self.fetcher.fetch(url).await?;
        let mut listing = extract_listing_html(&html);

        if listing.phone_numbers.is_none() {
            debug!("No phone in static page of {}, asking the browser", url);
            listing.phone_numbers = self.reveal_phone_numbers(url).await?;
        }

        let record = ListingRecord::from_extracted(url, listing, Utc::now());
        match self.store.insert(&record)? {
            InsertOutcome::Inserted => {
                info!(
                    "[SAVED] {} - {} [{} km]",
                    record, record.phone_numbers, record.odometer_km
                );
                Ok(UrlOutcome::Saved)
            }
            InsertOutcome::Duplicate => Ok(UrlOutcome::Duplicate),
        }
    }

    /// Run the reveal on this worker's session, launching it on first use.
    ///
    /// The session moves onto the blocking pool for the call and comes back
    /// with the result. A failed reveal closes the session so the next
    /// hidden phone starts a fresh browser; a panic there loses it outright.
    async fn reveal_phone_numbers(&mut self, url: &str) -> Result<Option<String>, UrlError> {
        let mut session = match self.session.take() {
            Some(session) => session,
            None => Self::launch_session(self.id, Arc::clone(&self.sessions)).await?,
        };

        let target = url.to_string();
        let (session, phones) = tokio::task::spawn_blocking(move || {
            let phones = session.reveal_phone_numbers(&target);
            (session, phones)
        })
        .await
        .context("browser task panicked")?;

        match phones {
            Ok(phones) => {
                self.session = Some(session);
                Ok(phones)
            }
            Err(e) => {
                debug!(worker = self.id, "Dropping browser session after failed reveal");
                Self::close_session(self.id, session).await;
                Err(e.into())
            }
        }
    }

    async fn launch_session(id: usize, sessions: Arc<P>) -> Result<P::Session, UrlError> {
        info!(worker = id, "Launching browser session");
        tokio::task::spawn_blocking(move || sessions.launch())
            .await
            .map_err(|e| UrlError::Session(e.into()))?
            .map_err(UrlError::Session)
    }

    async fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            Self::close_session(self.id, session).await;
        }
    }

    async fn close_session(id: usize, session: P::Session) {
        match tokio::task::spawn_blocking(move || session.close()).await {
            Ok(Ok(())) => debug!(worker = id, "Browser session closed"),
            Ok(Err(e)) => warn!(worker = id, "Closing browser session failed: {:#}", e),
            Err(e) => warn!(worker = id, "Closing browser session panicked: {}", e),
        }
    }
}
