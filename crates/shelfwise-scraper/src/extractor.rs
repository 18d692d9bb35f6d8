//! The extractor capability the orchestrator depends on.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use shelfwise_core::ProductSnapshot;

use crate::error::ScraperError;
use crate::platform::Platform;

/// Scrapes one marketplace for products matching a query.
///
/// Implementations return zero or more products; a single-product answer is
/// a one-element vector.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn scrape(&self, query: &str, count: usize)
        -> Result<Vec<ProductSnapshot>, ScraperError>;
}

/// Maps each supported [`Platform`] to its extractor.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<Platform, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, platform: Platform, extractor: Arc<dyn Extractor>) -> Self {
        self.register(platform, extractor);
        self
    }

    pub fn register(&mut self, platform: Platform, extractor: Arc<dyn Extractor>) {
        self.extractors.insert(platform, extractor);
    }

    /// Resolve a platform name; `None` for unknown or unregistered platforms.
    #[must_use]
    pub fn get(&self, platform: &str) -> Option<(Platform, Arc<dyn Extractor>)> {
        let platform: Platform = platform.parse().ok()?;
        self.extractors
            .get(&platform)
            .map(|extractor| (platform, Arc::clone(extractor)))
    }

    #[must_use]
    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self.extractors.keys().copied().collect();
        platforms.sort();
        platforms
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("platforms", &self.platforms())
            .finish()
    }
}
