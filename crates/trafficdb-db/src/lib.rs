//! PostgreSQL persistence for the three analytics tables.
//!
//! Low-level operations take a `&mut PgConnection` and return
//! `Result<_, DbError>`. [`Store`] wraps them with the per-operation
//! connection lifecycle used by the collector.

use sqlx::postgres::PgConnectOptions;
use thiserror::Error;
use trafficdb_core::DatabaseConfig;

pub mod organic_pages;
pub mod raw;
pub mod schema;
pub mod search_queries;
pub mod store;
pub mod traffic;

pub use organic_pages::{get_organic_page, upsert_organic_page, OrganicPageRow};
pub use raw::{execute_raw, QueryParam, RawQueryResult};
pub use schema::{bootstrap_schema, inspect_schema, ColumnInfo, SchemaReport, MANAGED_TABLES};
pub use search_queries::{get_search_query, upsert_search_query, SearchQueryRow};
pub use store::Store;
pub use traffic::{get_traffic_by_url, upsert_traffic_by_url, TrafficByUrlRow};

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Builds connection options from either a URL or discrete parameters.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if `DATABASE_URL` cannot be parsed.
pub fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, DbError> {
    match config {
        DatabaseConfig::Url(url) => Ok(url.parse::<PgConnectOptions>()?),
        DatabaseConfig::Parts {
            host,
            port,
            user,
            password,
            database,
        } => {
            let mut options = PgConnectOptions::new()
                .host(host)
                .port(*port)
                .username(user)
                .database(database);
            if let Some(password) = password {
                options = options.password(password);
            }
            Ok(options)
        }
    }
}
