use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_f32 = |var: &str, default: &str| -> Result<f32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<f32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("SHELFWISE_ENV", "development"));
    let log_level = or_default("SHELFWISE_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("SHELFWISE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("SHELFWISE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("SHELFWISE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let extractor_url = or_default("SHELFWISE_EXTRACTOR_URL", "http://localhost:8090");
    let extractor_timeout_secs = parse_u64("SHELFWISE_EXTRACTOR_TIMEOUT_SECS", "120")?;
    let extractor_user_agent = or_default(
        "SHELFWISE_EXTRACTOR_USER_AGENT",
        "shelfwise/0.1 (product-intelligence)",
    );
    let extractor_max_retries = parse_u32("SHELFWISE_EXTRACTOR_MAX_RETRIES", "2")?;
    let extractor_backoff_base_secs = parse_u64("SHELFWISE_EXTRACTOR_BACKOFF_BASE_SECS", "2")?;

    let max_concurrent_platforms = parse_usize("SHELFWISE_MAX_CONCURRENT_PLATFORMS", "1")?;
    let competitor_count = parse_usize("SHELFWISE_COMPETITOR_COUNT", "3")?;
    let chunk_max_tokens = parse_usize("SHELFWISE_CHUNK_MAX_TOKENS", "400")?;
    if chunk_max_tokens == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SHELFWISE_CHUNK_MAX_TOKENS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    let memory_top_k = parse_usize("SHELFWISE_MEMORY_TOP_K", "3")?;
    let memory_score_threshold = parse_f32("SHELFWISE_MEMORY_SCORE_THRESHOLD", "0.4")?;
    let memory_timeout_secs = parse_u64("SHELFWISE_MEMORY_TIMEOUT_SECS", "30")?;
    let generation_timeout_secs = parse_u64("SHELFWISE_GENERATION_TIMEOUT_SECS", "120")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        extractor_url,
        extractor_timeout_secs,
        extractor_user_agent,
        extractor_max_retries,
        extractor_backoff_base_secs,
        max_concurrent_platforms,
        competitor_count,
        chunk_max_tokens,
        memory_top_k,
        memory_score_threshold,
        memory_timeout_secs,
        tei_url: optional("SHELFWISE_TEI_URL"),
        qdrant_url: optional("SHELFWISE_QDRANT_URL"),
        openai_api_key: optional("OPENAI_API_KEY"),
        generation_base_url: or_default(
            "SHELFWISE_GENERATION_BASE_URL",
            "https://api.openai.com/v1",
        ),
        generation_model: or_default("SHELFWISE_GENERATION_MODEL", "gpt-4o-mini"),
        generation_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
