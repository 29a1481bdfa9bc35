use crate::app_config::{AppConfig, DatabaseConfig, DbConfig};
use crate::ConfigError;

const DEFAULT_DB_PORT: &str = "5432";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Load the database-only configuration used by the `db` commands.
///
/// Calls `dotenvy::dotenv().ok()` first. Yandex credentials are not read.
///
/// # Errors
///
/// Returns `ConfigError` if the database variables are missing or invalid.
pub fn load_db_config() -> Result<DbConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_db_config_from_env()
}

/// Like [`load_db_config`] but without loading `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if the database variables are missing or invalid.
pub fn load_db_config_from_env() -> Result<DbConfig, ConfigError> {
    build_db_config(&|key: &str| std::env::var(key))
}

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

fn build_db_config<F>(lookup: &F) -> Result<DbConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    Ok(DbConfig {
        database: build_database_config(lookup)?,
        log_level: lookup("TRAFFICDB_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string()),
    })
}

/// `DATABASE_URL` wins; otherwise `DB_HOST`, `DB_USER` and `DB_NAME` are required.
fn build_database_config<F>(lookup: &F) -> Result<DatabaseConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        match lookup(var) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::MissingEnvVar(var.to_string())),
        }
    };

    if let Ok(url) = lookup("DATABASE_URL") {
        if !url.trim().is_empty() {
            return Ok(DatabaseConfig::Url(url));
        }
    }

    let port_raw = lookup("DB_PORT").unwrap_or_else(|_| DEFAULT_DB_PORT.to_string());
    let port = port_raw
        .parse::<u16>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "DB_PORT".to_string(),
            reason: e.to_string(),
        })?;
    Ok(DatabaseConfig::Parts {
        host: require("DB_HOST")?,
        port,
        user: require("DB_USER")?,
        password: lookup("DB_PASSWORD").ok(),
        database: require("DB_NAME")?,
    })
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        match lookup(var) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::MissingEnvVar(var.to_string())),
        }
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
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

    let DbConfig {
        database,
        log_level,
    } = build_db_config(&lookup)?;

    let oauth_token = require("YANDEX_OAUTH_TOKEN")?;
    let metrika_counter_id = require("METRIKA_COUNTER_ID")?;
    let webmaster_host_id = require("WEBMASTER_HOST_ID")?;

    let webmaster_user_id = match lookup("WEBMASTER_USER_ID") {
        Ok(raw) if !raw.trim().is_empty() => {
            Some(
                raw.trim()
                    .parse::<i64>()
                    .map_err(|e| ConfigError::InvalidEnvVar {
                        var: "WEBMASTER_USER_ID".to_string(),
                        reason: e.to_string(),
                    })?,
            )
        }
        _ => None,
    };

    let sites_path = PathBuf::from(or_default("TRAFFICDB_SITES_PATH", "./config/sites.yaml"));
    let request_timeout_secs = parse_u64("TRAFFICDB_REQUEST_TIMEOUT_SECS", "20")?;
    let landing_page_limit = parse_u32("TRAFFICDB_LANDING_PAGE_LIMIT", "100")?;

    Ok(AppConfig {
        database,
        oauth_token,
        metrika_counter_id,
        webmaster_host_id,
        webmaster_user_id,
        sites_path,
        log_level,
        request_timeout_secs,
        landing_page_limit,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
