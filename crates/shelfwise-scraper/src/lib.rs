pub mod client;
pub mod driver;
pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod platform;
mod rate_limit;
pub mod result;

pub use client::{ExtractorClient, RemoteExtractor};
pub use driver::ScrapeResponse;
pub use error::{ScrapeError, ScraperError};
pub use extractor::{Extractor, ExtractorRegistry};
pub use orchestrator::{RunOutcome, ScrapeOrchestrator, UNSUPPORTED_PLATFORM};
pub use platform::Platform;
pub use result::ScrapeResult;
