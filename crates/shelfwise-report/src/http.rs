//! Shared HTTP client construction for the generation, embedding, and vector
//! store services.

use std::time::Duration;

use crate::error::ReportError;

pub const USER_AGENT: &str = concat!("shelfwise/", env!("CARGO_PKG_VERSION"));

/// # Errors
///
/// Returns [`ReportError::Upstream`] if the TLS backend fails to initialize.
pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client, ReportError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()
        .map_err(ReportError::from)
}
