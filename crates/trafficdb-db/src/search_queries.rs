//! Database operations for `search_queries_webmaster`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use trafficdb_core::SearchQueryRecord;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchQueryRow {
    pub id: i64,
    pub query_text: String,
    pub shows: i32,
    pub clicks: i32,
    pub avg_show_position: Decimal,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub month_year: String,
    pub updated_at: DateTime<Utc>,
}

/// Inserts or refreshes the row for `(date_from, date_to, query_text)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_search_query(
    conn: &mut PgConnection,
    record: &SearchQueryRecord,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO search_queries_webmaster \
             (query_text, shows, clicks, avg_show_position, date_from, date_to, month_year) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (date_from, date_to, query_text) DO UPDATE SET \
             shows             = EXCLUDED.shows, \
             clicks            = EXCLUDED.clicks, \
             avg_show_position = EXCLUDED.avg_show_position, \
             month_year        = EXCLUDED.month_year, \
             updated_at        = NOW() \
         RETURNING id",
    )
    .bind(&record.query_text)
    .bind(record.shows)
    .bind(record.clicks)
    .bind(record.avg_show_position)
    .bind(record.date_from)
    .bind(record.date_to)
    .bind(&record.month_year)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_search_query(
    conn: &mut PgConnection,
    query_text: &str,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Option<SearchQueryRow>, DbError> {
    let row = sqlx::query_as::<_, SearchQueryRow>(
        "SELECT id, query_text, shows, clicks, avg_show_position, date_from, date_to, \
                month_year, updated_at \
         FROM search_queries_webmaster \
         WHERE query_text = $1 AND date_from = $2 AND date_to = $3",
    )
    .bind(query_text)
    .bind(date_from)
    .bind(date_to)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}
