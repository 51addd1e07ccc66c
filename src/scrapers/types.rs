use serde::{Deserialize, Serialize};

/// What happened to one listing URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlOutcome {
    /// New record written
    Saved,
    /// Already in the store before any work was done
    AlreadyStored,
    /// Another writer stored the URL between the check and the insert
    Duplicate,
}

/// Per-worker tallies, merged into a [`ScrapeSummary`] at the end of a run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub saved: usize,
    pub already_stored: usize,
    pub failed: usize,
}

impl WorkerReport {
    pub fn record(&mut self, outcome: UrlOutcome) {
        match outcome {
            UrlOutcome::Saved => self.saved += 1,
            UrlOutcome::AlreadyStored | UrlOutcome::Duplicate => self.already_stored += 1,
        }
    }
}

/// Totals for a whole scrape run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeSummary {
    /// Listing pages that were fetched successfully
    pub listing_pages: usize,
    /// Detail URLs found on those pages, duplicates included
    pub discovered: usize,
    pub saved: usize,
    pub already_stored: usize,
    pub failed: usize,
    /// URLs left in the queue because every worker stopped early
    pub unprocessed: usize,
}

impl ScrapeSummary {
    pub fn absorb(&mut self, report: WorkerReport) {
        self.saved += report.saved;
        self.already_stored += report.already_stored;
        self.failed += report.failed;
    }
}
