use anyhow::{anyhow, Result};
use async_trait::async_trait;
use autoria_scout::models::{ListingRecord, NO_PHONE};
use autoria_scout::scrapers::{PageFetcher, RevealSession, SessionFactory};
use autoria_scout::store::{ListingStore, SqliteStore};
use autoria_scout::{run_scrape, ScrapeConfig};
use chrono::TimeZone;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BASE: &str = "https://auto.ria.test/car/used/";
const PAGE_1: &str = "https://auto.ria.test/car/used/?page=1";

fn detail_url(n: usize) -> String {
    format!("https://auto.ria.test/uk/auto_car_{n}.html")
}

fn listing_page(urls: &[String]) -> String {
    let cards: String = urls
        .iter()
        .map(|u| format!(r#"<section class="content-bar"><a class="address" href="{u}">car</a></section>"#))
        .collect();
    format!("<html><body>{cards}</body></html>")
}

/// A detail page; odd-numbered cars print the phone, even ones hide it.
fn detail_page(n: usize) -> String {
    let phone = if n % 2 == 1 {
        format!(r#"<a href="tel:+38050000000{n}">call</a>"#)
    } else {
        r#"<button>Показати номер</button>"#.to_string()
    };
    format!(
        r#"<html><body>
            <h1 class="head">Car {n}</h1>
            <span class="size32">${n}0 000</span>
            <span class="size18">{n}0 тис. км</span>
            <div class="seller_info_name">Seller {n}</div>
            {phone}
        </body></html>"#
    )
}

fn revealed_phone(n: usize) -> String {
    format!("38067000000{n}")
}

struct ScriptedSite {
    pages: HashMap<String, String>,
    fetched: Mutex<Vec<String>>,
}

impl ScriptedSite {
    fn with_cars(cars: &[usize]) -> Self {
        let urls: Vec<String> = cars.iter().map(|&n| detail_url(n)).collect();
        let mut pages = HashMap::from([(PAGE_1.to_string(), listing_page(&urls))]);
        for &n in cars {
            pages.insert(detail_url(n), detail_page(n));
        }
        Self {
            pages,
            fetched: Mutex::new(Vec::new()),
        }
    }

    fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedSite {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("404 Not Found: {url}"))
    }
}

#[derive(Default)]
struct ScriptedBrowsers {
    phones: HashMap<String, String>,
    fail_launch: bool,
    /// Pages on which the browser errors out, as if Chrome had died
    broken: HashSet<String>,
    launched: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl ScriptedBrowsers {
    fn revealing(cars: &[usize]) -> Self {
        Self {
            phones: cars.iter().map(|&n| (detail_url(n), revealed_phone(n))).collect(),
            ..Self::default()
        }
    }
}

struct ScriptedBrowser {
    phones: HashMap<String, String>,
    broken: HashSet<String>,
    closed: Arc<AtomicUsize>,
}

impl SessionFactory for ScriptedBrowsers {
    type Session = ScriptedBrowser;

    fn launch(&self) -> Result<ScriptedBrowser> {
        if self.fail_launch {
            return Err(anyhow!("chrome not installed"));
        }
        self.launched.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedBrowser {
            phones: self.phones.clone(),
            broken: self.broken.clone(),
            closed: Arc::clone(&self.closed),
        })
    }
}

impl RevealSession for ScriptedBrowser {
    fn reveal_phone_numbers(&mut self, url: &str) -> Result<Option<String>> {
        if self.broken.contains(url) {
            return Err(anyhow!("Failed to open {url}: connection closed"));
        }
        Ok(self.phones.get(url).cloned())
    }

    fn close(self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn config(workers: usize) -> ScrapeConfig {
    ScrapeConfig {
        base_url: BASE.to_string(),
        num_pages: 1,
        num_workers: workers,
        page_delay: Duration::ZERO,
        ..ScrapeConfig::default()
    }
}

/// Stored records without the discovery timestamp, for set comparison.
fn contents(store: &SqliteStore) -> Vec<ListingRecord> {
    let epoch = chrono::Utc.timestamp_opt(0, 0).unwrap();
    store
        .all()
        .unwrap()
        .into_iter()
        .map(|mut r| {
            r.discovered_at = epoch;
            r
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_listing_page_then_each_detail_page_once() {
    let cars = [1, 2, 3, 4];
    let site = Arc::new(ScriptedSite::with_cars(&cars));
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let browsers = Arc::new(ScriptedBrowsers::revealing(&cars));

    let summary = run_scrape(&config(2), Arc::clone(&site), Arc::clone(&store), browsers)
        .await
        .unwrap();

    let fetched = site.fetched();
    assert_eq!(fetched.iter().filter(|u| u.as_str() == PAGE_1).count(), 1);
    assert_eq!(fetched.len(), 1 + cars.len());
    for n in cars {
        assert_eq!(fetched.iter().filter(|u| **u == detail_url(n)).count(), 1);
    }

    assert_eq!(summary.listing_pages, 1);
    assert_eq!(summary.discovered, 4);
    assert_eq!(summary.saved, 4);
    assert_eq!(summary.failed, 0);
    assert_eq!(store.count().unwrap(), 4);

    let car1 = store.get(&detail_url(1)).unwrap().unwrap();
    assert_eq!(car1.title, "Car 1");
    assert_eq!(car1.price_usd, 10_000);
    assert_eq!(car1.odometer_km, 10_000);
    assert_eq!(car1.phone_numbers, "380500000001");

    let car2 = store.get(&detail_url(2)).unwrap().unwrap();
    assert_eq!(car2.phone_numbers, revealed_phone(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rerun_fetches_only_the_listing_page() {
    let cars = [1, 2, 3];
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());

    let first = Arc::new(ScriptedSite::with_cars(&cars));
    run_scrape(
        &config(3),
        first,
        Arc::clone(&store),
        Arc::new(ScriptedBrowsers::revealing(&cars)),
    )
    .await
    .unwrap();
    let before = contents(&store);

    let second = Arc::new(ScriptedSite::with_cars(&cars));
    let browsers = Arc::new(ScriptedBrowsers::revealing(&cars));
    let summary = run_scrape(&config(3), Arc::clone(&second), Arc::clone(&store), Arc::clone(&browsers))
        .await
        .unwrap();

    assert_eq!(second.fetched(), vec![PAGE_1.to_string()]);
    assert_eq!(browsers.launched.load(Ordering::SeqCst), 0);
    assert_eq!(summary.saved, 0);
    assert_eq!(summary.already_stored, 3);
    assert_eq!(contents(&store), before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pool_size_does_not_change_the_result() {
    let cars: Vec<usize> = (1..=9).collect();

    let mut results = Vec::new();
    for workers in [1, 6] {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        run_scrape(
            &config(workers),
            Arc::new(ScriptedSite::with_cars(&cars)),
            Arc::clone(&store),
            Arc::new(ScriptedBrowsers::revealing(&cars)),
        )
        .await
        .unwrap();
        results.push(contents(&store));
    }

    assert_eq!(results[0].len(), 9);
    assert_eq!(results[0], results[1]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn each_worker_launches_at_most_one_browser_and_closes_it() {
    let cars = [2, 4, 6, 8, 10, 12];
    let browsers = Arc::new(ScriptedBrowsers::revealing(&cars));

    let summary = run_scrape(
        &config(2),
        Arc::new(ScriptedSite::with_cars(&cars)),
        Arc::new(SqliteStore::open_in_memory().unwrap()),
        Arc::clone(&browsers),
    )
    .await
    .unwrap();

    assert_eq!(summary.saved, 6);
    let launched = browsers.launched.load(Ordering::SeqCst);
    assert!((1..=2).contains(&launched), "launched {launched} browsers");
    assert_eq!(browsers.closed.load(Ordering::SeqCst), launched);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn static_phones_never_start_a_browser() {
    let cars = [1, 3, 5];
    let browsers = Arc::new(ScriptedBrowsers::default());

    run_scrape(
        &config(3),
        Arc::new(ScriptedSite::with_cars(&cars)),
        Arc::new(SqliteStore::open_in_memory().unwrap()),
        Arc::clone(&browsers),
    )
    .await
    .unwrap();

    assert_eq!(browsers.launched.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn hidden_phone_the_browser_cannot_find_is_stored_as_dash() {
    let cars = [2];
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());

    run_scrape(
        &config(1),
        Arc::new(ScriptedSite::with_cars(&cars)),
        Arc::clone(&store),
        Arc::new(ScriptedBrowsers::default()),
    )
    .await
    .unwrap();

    let car = store.get(&detail_url(2)).unwrap().unwrap();
    assert_eq!(car.phone_numbers, NO_PHONE);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_failing_detail_page_does_not_stop_the_others() {
    let cars = [1, 3, 5];
    let mut site = ScriptedSite::with_cars(&cars);
    site.pages.remove(&detail_url(3));
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());

    let summary = run_scrape(
        &config(2),
        Arc::new(site),
        Arc::clone(&store),
        Arc::new(ScriptedBrowsers::default()),
    )
    .await
    .unwrap();

    assert_eq!(summary.saved, 2);
    assert_eq!(summary.failed, 1);
    assert!(!store.exists(&detail_url(3)).unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_worker_without_a_browser_stops_but_the_run_completes() {
    // Single worker: car 1 has a static phone, car 2 needs the browser.
    let cars = [1, 2, 3];
    let browsers = Arc::new(ScriptedBrowsers {
        fail_launch: true,
        ..ScriptedBrowsers::default()
    });
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());

    let summary = run_scrape(
        &config(1),
        Arc::new(ScriptedSite::with_cars(&cars)),
        Arc::clone(&store),
        browsers,
    )
    .await
    .unwrap();

    assert_eq!(summary.saved, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.unprocessed, 1);
    assert!(store.exists(&detail_url(1)).unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_broken_browser_is_replaced_for_the_next_hidden_phone() {
    // Single worker: the browser dies on car 2, car 4 gets a fresh one.
    let cars = [2, 4];
    let browsers = Arc::new(ScriptedBrowsers {
        broken: HashSet::from([detail_url(2)]),
        ..ScriptedBrowsers::revealing(&cars)
    });
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());

    let summary = run_scrape(
        &config(1),
        Arc::new(ScriptedSite::with_cars(&cars)),
        Arc::clone(&store),
        Arc::clone(&browsers),
    )
    .await
    .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.saved, 1);
    assert_eq!(summary.unprocessed, 0);
    assert!(!store.exists(&detail_url(2)).unwrap());
    assert_eq!(
        store.get(&detail_url(4)).unwrap().unwrap().phone_numbers,
        revealed_phone(4)
    );
    assert_eq!(browsers.launched.load(Ordering::SeqCst), 2);
    assert_eq!(browsers.closed.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn repeated_card_is_stored_once() {
    let url = detail_url(1);
    let mut site = ScriptedSite::with_cars(&[1]);
    site.pages
        .insert(PAGE_1.to_string(), listing_page(&[url.clone(), url.clone()]));
    let site = Arc::new(site);
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());

    let summary = run_scrape(
        &config(1),
        Arc::clone(&site),
        Arc::clone(&store),
        Arc::new(ScriptedBrowsers::default()),
    )
    .await
    .unwrap();

    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.saved, 1);
    assert_eq!(summary.already_stored, 1);
    assert_eq!(site.fetched().iter().filter(|u| **u == url).count(), 1);
}

#[tokio::test]
async fn unreachable_site_fails_the_run() {
    let site = Arc::new(ScriptedSite {
        pages: HashMap::new(),
        fetched: Mutex::new(Vec::new()),
    });

    let result = run_scrape(
        &config(2),
        site,
        Arc::new(SqliteStore::open_in_memory().unwrap()),
        Arc::new(ScriptedBrowsers::default()),
    )
    .await;

    assert!(result.is_err());
}
