use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Politeness delay bounds accepted for `CGINTEL_SCRAPER_INTER_REQUEST_DELAY_MS`.
pub const MIN_INTER_REQUEST_DELAY_MS: u64 = 200;
pub const MAX_INTER_REQUEST_DELAY_MS: u64 = 500;

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
/// Decoupled from the real environment so tests can drive it from a
/// `HashMap` without `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
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

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("CGINTEL_ENV", "development"));

    let admin_token = lookup("ADMIN_TOKEN")
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    if admin_token.is_none() && env != Environment::Development {
        return Err(ConfigError::MissingEnvVar("ADMIN_TOKEN".to_string()));
    }

    let bind_addr = parse_addr("CGINTEL_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("CGINTEL_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("CGINTEL_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("CGINTEL_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("CGINTEL_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let scraper_request_timeout_secs = parse_u64("CGINTEL_SCRAPER_REQUEST_TIMEOUT_SECS", "15")?;
    let scraper_user_agent = or_default(
        "CGINTEL_SCRAPER_USER_AGENT",
        "CrazyGels-Scraper/1.0 (contact: hello@crazygels.com)",
    );
    let scraper_inter_request_delay_ms =
        parse_u64("CGINTEL_SCRAPER_INTER_REQUEST_DELAY_MS", "300")?;
    if !(MIN_INTER_REQUEST_DELAY_MS..=MAX_INTER_REQUEST_DELAY_MS)
        .contains(&scraper_inter_request_delay_ms)
    {
        return Err(ConfigError::InvalidEnvVar {
            var: "CGINTEL_SCRAPER_INTER_REQUEST_DELAY_MS".to_string(),
            reason: format!(
                "must be between {MIN_INTER_REQUEST_DELAY_MS} and {MAX_INTER_REQUEST_DELAY_MS}"
            ),
        });
    }

    let obf_base_url = or_default(
        "CGINTEL_OBF_BASE_URL",
        "https://world.openbeautyfacts.org",
    );
    let amazon_base_url = or_default("CGINTEL_AMAZON_BASE_URL", "https://www.amazon.de");
    let store_vendor = or_default("CGINTEL_STORE_VENDOR", "CrazyGels");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        admin_token,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_inter_request_delay_ms,
        obf_base_url: obf_base_url.trim_end_matches('/').to_string(),
        amazon_base_url: amazon_base_url.trim_end_matches('/').to_string(),
        store_vendor,
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
