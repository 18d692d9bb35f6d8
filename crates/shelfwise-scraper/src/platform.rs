use std::str::FromStr;

use thiserror::Error;

/// Marketplaces with a supported extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Platform {
    Amazon,
    Flipkart,
    Ebay,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Amazon, Platform::Flipkart, Platform::Ebay];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Amazon => "amazon",
            Platform::Flipkart => "flipkart",
            Platform::Ebay => "ebay",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a platform name has no extractor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "amazon" => Ok(Platform::Amazon),
            "flipkart" => Ok(Platform::Flipkart),
            "ebay" => Ok(Platform::Ebay),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively_and_round_trips() {
        for platform in Platform::ALL {
            let upper = platform.as_str().to_ascii_uppercase();
            assert_eq!(upper.parse::<Platform>().unwrap(), platform);
            assert_eq!(platform.to_string().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn rejects_unknown_names() {
        assert_eq!(
            "walmart".parse::<Platform>(),
            Err(UnknownPlatform("walmart".to_string()))
        );
        assert_eq!(
            UnknownPlatform("walmart".to_string()).to_string(),
            "unknown platform: walmart"
        );
    }
}
