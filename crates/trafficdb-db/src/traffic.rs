//! Database operations for `all_traffic_by_url`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use trafficdb_core::TrafficByUrlRecord;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `all_traffic_by_url` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrafficByUrlRow {
    pub id: i64,
    pub url: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub organic: i32,
    pub direct: i32,
    pub social: i32,
    pub referral: i32,
    pub ad: i32,
    pub internal: i32,
    pub email: i32,
    pub google_traffic: i32,
    pub yandex_traffic: i32,
    pub bounce_rate: Decimal,
    pub page_depth: Decimal,
    pub avg_visit: Decimal,
    pub visits: i32,
    pub month_year: String,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Inserts or refreshes the row for `(date_from, date_to, url)`.
///
/// Every non-key column is overwritten on conflict. Returns the row `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_traffic_by_url(
    conn: &mut PgConnection,
    record: &TrafficByUrlRecord,
) -> Result<i64, DbError> {
    let channels = &record.channels;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO all_traffic_by_url \
             (url, date_from, date_to, organic, direct, social, referral, ad, internal, \
              email, google_traffic, yandex_traffic, bounce_rate, page_depth, avg_visit, \
              visits, month_year) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
         ON CONFLICT (date_from, date_to, url) DO UPDATE SET \
             organic        = EXCLUDED.organic, \
             direct         = EXCLUDED.direct, \
             social         = EXCLUDED.social, \
             referral       = EXCLUDED.referral, \
             ad             = EXCLUDED.ad, \
             internal       = EXCLUDED.internal, \
             email          = EXCLUDED.email, \
             google_traffic = EXCLUDED.google_traffic, \
             yandex_traffic = EXCLUDED.yandex_traffic, \
             bounce_rate    = EXCLUDED.bounce_rate, \
             page_depth     = EXCLUDED.page_depth, \
             avg_visit      = EXCLUDED.avg_visit, \
             visits         = EXCLUDED.visits, \
             month_year     = EXCLUDED.month_year, \
             updated_at     = NOW() \
         RETURNING id",
    )
    .bind(&record.url)
    .bind(record.date_from)
    .bind(record.date_to)
    .bind(channels.organic)
    .bind(channels.direct)
    .bind(channels.social)
    .bind(channels.referral)
    .bind(channels.ad)
    .bind(channels.internal)
    .bind(channels.email)
    .bind(record.google_traffic)
    .bind(record.yandex_traffic)
    .bind(record.bounce_rate)
    .bind(record.page_depth)
    .bind(record.avg_visit)
    .bind(record.visits)
    .bind(&record.month_year)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

/// Returns the row for `(url, date_from, date_to)`, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_traffic_by_url(
    conn: &mut PgConnection,
    url: &str,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Option<TrafficByUrlRow>, DbError> {
    let row = sqlx::query_as::<_, TrafficByUrlRow>(
        "SELECT id, url, date_from, date_to, organic, direct, social, referral, ad, internal, \
                email, google_traffic, yandex_traffic, bounce_rate, page_depth, avg_visit, \
                visits, month_year, updated_at \
         FROM all_traffic_by_url \
         WHERE url = $1 AND date_from = $2 AND date_to = $3",
    )
    .bind(url)
    .bind(date_from)
    .bind(date_to)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}
