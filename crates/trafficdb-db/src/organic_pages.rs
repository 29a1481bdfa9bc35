//! Database operations for `organic_pages_by_url`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use trafficdb_core::OrganicPageRecord;

use crate::DbError;

/// A row from the `organic_pages_by_url` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrganicPageRow {
    pub id: i64,
    pub base_url: String,
    pub page_url: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub bounce_rate: Decimal,
    pub visits: i32,
    pub traffic_share: Decimal,
    pub month_year: String,
    pub updated_at: DateTime<Utc>,
}

/// Inserts or refreshes the row for `(date_from, date_to, page_url)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_organic_page(
    conn: &mut PgConnection,
    record: &OrganicPageRecord,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO organic_pages_by_url \
             (base_url, page_url, date_from, date_to, bounce_rate, visits, traffic_share, \
              month_year) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (date_from, date_to, page_url) DO UPDATE SET \
             base_url      = EXCLUDED.base_url, \
             bounce_rate   = EXCLUDED.bounce_rate, \
             visits        = EXCLUDED.visits, \
             traffic_share = EXCLUDED.traffic_share, \
             month_year    = EXCLUDED.month_year, \
             updated_at    = NOW() \
         RETURNING id",
    )
    .bind(&record.base_url)
    .bind(&record.page_url)
    .bind(record.date_from)
    .bind(record.date_to)
    .bind(record.bounce_rate)
    .bind(record.visits)
    .bind(record.traffic_share)
    .bind(&record.month_year)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_organic_page(
    conn: &mut PgConnection,
    page_url: &str,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Option<OrganicPageRow>, DbError> {
    let row = sqlx::query_as::<_, OrganicPageRow>(
        "SELECT id, base_url, page_url, date_from, date_to, bounce_rate, visits, \
                traffic_share, month_year, updated_at \
         FROM organic_pages_by_url \
         WHERE page_url = $1 AND date_from = $2 AND date_to = $3",
    )
    .bind(page_url)
    .bind(date_from)
    .bind(date_to)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}
