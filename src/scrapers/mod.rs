pub mod browser;
pub mod discovery;
pub mod http;
pub mod traits;
pub mod types;

pub use browser::{ChromeSession, ChromeSessionFactory};
pub use http::HttpFetcher;
pub use traits::{PageFetcher, RevealSession, SessionFactory};
