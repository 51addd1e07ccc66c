use thiserror::Error;

/// Failures of the listing store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store connection lock poisoned")]
    Poisoned,
}

/// Why a single listing URL could not be processed
#[derive(Debug, Error)]
pub enum UrlError {
    /// The worker's browser session could not be launched; the worker stops.
    #[error("browser session unavailable: {0:#}")]
    Session(anyhow::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}
