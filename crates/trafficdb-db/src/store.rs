//! Connection-per-operation facade used by the collector.

use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, Connection, PgConnection};
use trafficdb_core::{DatabaseConfig, OrganicPageRecord, SearchQueryRecord, TrafficByUrlRecord};

use crate::raw::{execute_raw, QueryParam, RawQueryResult};
use crate::schema::{bootstrap_schema, inspect_schema, SchemaReport};
use crate::{connect_options, organic_pages, search_queries, traffic, DbError};

/// Opens a fresh connection for every call and closes it afterwards.
///
/// Upserts never fail the caller: errors are logged and surface as `None`.
#[derive(Debug, Clone)]
pub struct Store {
    options: PgConnectOptions,
}

impl Store {
    #[must_use]
    pub fn new(options: PgConnectOptions) -> Self {
        Self { options }
    }

    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if `DATABASE_URL` cannot be parsed.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self, DbError> {
        Ok(Self::new(connect_options(config)?))
    }

    pub async fn upsert_traffic_by_url(&self, record: &TrafficByUrlRecord) -> Option<i64> {
        let result = async {
            let mut conn = self.connect().await?;
            let id = traffic::upsert_traffic_by_url(&mut conn, record).await;
            close(conn).await;
            id
        }
        .await;
        logged("all_traffic_by_url", &record.url, result)
    }

    pub async fn upsert_organic_page(&self, record: &OrganicPageRecord) -> Option<i64> {
        let result = async {
            let mut conn = self.connect().await?;
            let id = organic_pages::upsert_organic_page(&mut conn, record).await;
            close(conn).await;
            id
        }
        .await;
        logged("organic_pages_by_url", &record.page_url, result)
    }

    pub async fn upsert_search_query(&self, record: &SearchQueryRecord) -> Option<i64> {
        let result = async {
            let mut conn = self.connect().await?;
            let id = search_queries::upsert_search_query(&mut conn, record).await;
            close(conn).await;
            id
        }
        .await;
        logged("search_queries_webmaster", &record.query_text, result)
    }

    /// # Errors
    ///
    /// Returns [`DbError`] if the connection or any migration fails.
    pub async fn bootstrap_schema(&self) -> Result<(), DbError> {
        let mut conn = self.connect().await?;
        let result = bootstrap_schema(&mut conn).await;
        close(conn).await;
        result
    }

    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the connection or a catalog query fails.
    pub async fn inspect_schema(&self) -> Result<SchemaReport, DbError> {
        let mut conn = self.connect().await?;
        let result = inspect_schema(&mut conn).await;
        close(conn).await;
        result
    }

    /// See [`crate::execute_raw`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the connection or the statement fails.
    pub async fn execute_raw(
        &self,
        sql: &str,
        params: &[QueryParam],
    ) -> Result<RawQueryResult, DbError> {
        let mut conn = self.connect().await?;
        let result = execute_raw(&mut conn, sql, params).await;
        close(conn).await;
        result
    }

    async fn connect(&self) -> Result<PgConnection, DbError> {
        Ok(self.options.connect().await?)
    }
}

async fn close(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        tracing::warn!(error = %e, "failed to close database connection cleanly");
    }
}

fn logged(table: &'static str, key: &str, result: Result<i64, DbError>) -> Option<i64> {
    match result {
        Ok(id) => {
            tracing::debug!(table, key, id, "row upserted");
            Some(id)
        }
        Err(e) => {
            tracing::error!(table, key, error = %e, "upsert failed");
            None
        }
    }
}
