use anyhow::Result;
use async_trait::async_trait;

/// Plain HTTP access to listing and detail pages
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a page and return its body as text
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// A live browser owned by exactly one worker.
///
/// Methods block; the pipeline calls them from the blocking thread pool.
pub trait RevealSession: Send + 'static {
    /// Open `url`, click every "show number" control and read the phone
    /// numbers off the resulting page. `Ok(None)` means the page exposed none.
    fn reveal_phone_numbers(&mut self, url: &str) -> Result<Option<String>>;

    /// Shut the browser down
    fn close(self) -> Result<()>;
}

/// Launches browser sessions on demand
pub trait SessionFactory: Send + Sync + 'static {
    type Session: RevealSession;

    fn launch(&self) -> Result<Self::Session>;
}
