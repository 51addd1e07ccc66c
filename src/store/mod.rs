//! Persistence seam for listing records.

pub mod sqlite;

use crate::error::StoreError;
use crate::models::ListingRecord;

pub use sqlite::SqliteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record with the same URL already exists; nothing was written
    Duplicate,
}

/// The two operations the pipeline needs from storage.
///
/// Shared by every worker; implementations synchronize internally.
pub trait ListingStore: Send + Sync {
    fn exists(&self, url: &str) -> Result<bool, StoreError>;

    /// Insert a new record. A URL that is already stored is reported as
    /// [`InsertOutcome::Duplicate`], never as an error.
    fn insert(&self, record: &ListingRecord) -> Result<InsertOutcome, StoreError>;
}
