use std::net::SocketAddr;
use std::path::PathBuf;

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

fn invalid(var: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: reason.to_string(),
    }
}

/// Parsing and validation, decoupled from the process environment so tests
/// can drive it with a plain `HashMap` lookup.
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
        lookup(var)
            .ok()
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e))
    };

    let parse_positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e))?;
        if value == 0 {
            return Err(invalid(var, "must be greater than zero"));
        }
        Ok(value)
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("GEOGRID_ENV", "development"))?;

    let bind_addr = or_default("GEOGRID_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("GEOGRID_BIND_ADDR", e))?;
    let log_level = or_default("GEOGRID_LOG_LEVEL", "info");
    let places_api_key = optional("GOOGLE_PLACES_API_KEY");
    let palette_path = optional("GEOGRID_PALETTE_PATH").map(PathBuf::from);
    let api_keys = or_default("GEOGRID_API_KEYS", "")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    let db_max_connections = parse_u32("GEOGRID_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("GEOGRID_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("GEOGRID_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let places_request_timeout_secs = parse_u64("GEOGRID_PLACES_REQUEST_TIMEOUT_SECS", "30")?;
    let places_max_retries = parse_u32("GEOGRID_PLACES_MAX_RETRIES", "3")?;
    let places_retry_backoff_base_ms = parse_u64("GEOGRID_PLACES_RETRY_BACKOFF_BASE_MS", "1000")?;
    let scan_max_concurrency = parse_positive_usize("GEOGRID_SCAN_MAX_CONCURRENCY", "4")?;

    let default_grid_size = parse_positive_usize("GEOGRID_DEFAULT_GRID_SIZE", "13")?;
    let default_spacing_km = or_default("GEOGRID_DEFAULT_SPACING_KM", "2.5")
        .parse::<f64>()
        .map_err(|e| invalid("GEOGRID_DEFAULT_SPACING_KM", e))?;
    if !default_spacing_km.is_finite() || default_spacing_km <= 0.0 {
        return Err(invalid(
            "GEOGRID_DEFAULT_SPACING_KM",
            "must be a finite number greater than zero",
        ));
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        places_api_key,
        palette_path,
        api_keys,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        places_request_timeout_secs,
        places_max_retries,
        places_retry_backoff_base_ms,
        scan_max_concurrency,
        default_grid_size,
        default_spacing_km,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(invalid(
            "GEOGRID_ENV",
            format!("expected development, test, or production, got '{other}'"),
        )),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
