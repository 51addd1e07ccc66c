use crate::config::ScrapeConfig;
use crate::extract::revealed_phone_numbers;
use crate::scrapers::traits::{RevealSession, SessionFactory};
use anyhow::{Context, Result};
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use scraper::Html;
use std::ffi::OsStr;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const VIEWPORT: (u32, u32) = (1920, 1080);

/// How long Chrome may stay silent between two listings before the
/// connection is considered dead
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

const CONSENT_PASSES: usize = 2;

/// Button captions of the cookie and consent overlays, in the languages the
/// site serves. Both accepting and declining make the overlay go away.
const CONSENT_PHRASES: &[&str] = &[
    "Согласиться",
    "Понимаю и разрешаю",
    "Принять",
    "Продовжити",
    "Далі",
    "OK",
    "Agree",
    "Accept",
    "Настроить",
    "Отказаться",
    "Відмовитись",
    "Decline",
    "Зрозуміло",
    "Закрити",
];

const REVEAL_XPATHS: &[&str] = &[
    "//button[contains(.,'Показати номер') or contains(.,'Показать номер') or contains(.,'XXX')]",
    "//span[contains(.,'Показати номер') or contains(.,'Показать номер') or contains(.,'XXX')]",
    "//div[contains(.,'Показати номер') or contains(.,'Показать номер') or contains(.,'XXX')]",
    "//*[@data-testid='show-phone']",
    "//button[contains(@aria-label, 'Показати номер') or contains(@aria-label, 'Показать номер')]",
    "//a[contains(@href, 'tel:')]",
];

/// Buttons or links whose text contains `phrase`
fn consent_xpath(phrase: &str) -> String {
    format!("//*[self::button or self::a][contains(., '{phrase}')]")
}

/// Launches one headless Chrome per call
#[derive(Debug, Clone)]
pub struct ChromeSessionFactory {
    headless: bool,
    consent_wait: Duration,
    click_settle: Duration,
}

impl ChromeSessionFactory {
    pub fn new(config: &ScrapeConfig) -> Self {
        Self {
            headless: config.headless,
            consent_wait: config.consent_wait,
            click_settle: config.click_settle,
        }
    }
}

impl SessionFactory for ChromeSessionFactory {
    type Session = ChromeSession;

    fn launch(&self) -> Result<ChromeSession> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(self.headless)
            .window_size(Some(VIEWPORT))
            .idle_browser_timeout(IDLE_TIMEOUT)
            .args(vec![
                OsStr::new("--disable-blink-features=AutomationControlled"),
                OsStr::new("--blink-settings=imagesEnabled=false"),
                OsStr::new("--disable-notifications"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--log-level=3"),
            ])
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open browser tab")?;

        Ok(ChromeSession {
            browser,
            tab,
            consent_wait: self.consent_wait,
            click_settle: self.click_settle,
        })
    }
}

/// A Chrome process and the single tab a worker drives in it
pub struct ChromeSession {
    // Dropping the last handle kills the Chrome process.
    browser: Browser,
    tab: Arc<Tab>,
    consent_wait: Duration,
    click_settle: Duration,
}

impl ChromeSession {
    /// Click away consent overlays, two passes over every caption, within
    /// `consent_wait` overall.
    fn dismiss_consent(&self) {
        let deadline = Instant::now() + self.consent_wait;

        for _ in 0..CONSENT_PASSES {
            for phrase in CONSENT_PHRASES {
                if Instant::now() >= deadline {
                    return;
                }
                if let Ok(control) = self.tab.find_element_by_xpath(&consent_xpath(phrase)) {
                    if control.click().is_ok() {
                        debug!("Dismissed consent overlay via '{}'", phrase);
                    }
                }
            }
            thread::sleep(Duration::from_millis(100));
        }
    }

    fn reveal_controls(&self) -> Vec<Element<'_>> {
        REVEAL_XPATHS
            .iter()
            .filter_map(|xpath| self.tab.find_elements_by_xpath(xpath).ok())
            .flatten()
            .collect()
    }

    /// Scroll into view and click; fall back to a script click when the
    /// element refuses a real one.
    fn press(&self, control: &Element<'_>) -> Result<()> {
        control.scroll_into_view()?;
        if control.click().is_err() {
            control.call_js_fn("function() { this.click(); }", vec![], false)?;
        }
        Ok(())
    }
}

impl RevealSession for ChromeSession {
    fn reveal_phone_numbers(&mut self, url: &str) -> Result<Option<String>> {
        self.tab
            .navigate_to(url)
            .with_context(|| format!("Failed to open {url}"))?;
        self.tab
            .wait_until_navigated()
            .with_context(|| format!("Navigation to {url} did not finish"))?;

        self.dismiss_consent();

        let controls = self.reveal_controls();
        let mut pressed = 0;
        for control in &controls {
            match self.press(control) {
                Ok(()) => pressed += 1,
                Err(e) => debug!("Reveal control on {} not clickable: {:#}", url, e),
            }
            thread::sleep(self.click_settle);
        }
        debug!("Pressed {}/{} reveal controls on {}", pressed, controls.len(), url);

        let html = self
            .tab
            .get_content()
            .context("Failed to read page content")?;
        let phones = revealed_phone_numbers(&Html::parse_document(&html));

        match &phones {
            Some(found) => info!("Browser revealed phone(s) {} on {}", found, url),
            None => info!("No phone number revealed on {}", url),
        }
        Ok(phones)
    }

    fn close(self) -> Result<()> {
        self.tab.close(true).context("Failed to close browser tab")?;
        drop(self.browser);
        Ok(())
    }
}
