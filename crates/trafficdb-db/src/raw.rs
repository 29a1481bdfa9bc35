//! Raw SQL passthrough for maintenance commands.
//!
//! Row-returning statements are fetched as-is. Everything else runs inside
//! its own transaction: committed on success, rolled back on failure.

use chrono::NaiveDate;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Connection, PgConnection, Postgres};

use crate::DbError;

/// A positional (`$n`) parameter for [`execute_raw`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Text(String),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
}

#[derive(Debug)]
pub enum RawQueryResult {
    Rows(Vec<PgRow>),
    Committed { rows_affected: u64 },
}

/// Runs `sql` with `params` bound in order.
///
/// Statements whose first keyword is `SELECT` or `WITH` return their rows.
/// Any other statement is executed in a transaction and reports the number of
/// affected rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails. A failed write is rolled
/// back before the error is returned.
pub async fn execute_raw(
    conn: &mut PgConnection,
    sql: &str,
    params: &[QueryParam],
) -> Result<RawQueryResult, DbError> {
    if returns_rows(sql) {
        let rows = bind_params(sqlx::query(sql), params)
            .fetch_all(&mut *conn)
            .await?;
        return Ok(RawQueryResult::Rows(rows));
    }

    let mut tx = conn.begin().await?;
    match bind_params(sqlx::query(sql), params)
        .execute(&mut *tx)
        .await
    {
        Ok(done) => {
            tx.commit().await?;
            Ok(RawQueryResult::Committed {
                rows_affected: done.rows_affected(),
            })
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback after failed statement also failed");
            }
            Err(e.into())
        }
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [QueryParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            QueryParam::Text(value) => query.bind(value.as_str()),
            QueryParam::Int(value) => query.bind(*value),
            QueryParam::Float(value) => query.bind(*value),
            QueryParam::Date(value) => query.bind(*value),
        };
    }
    query
}

fn returns_rows(sql: &str) -> bool {
    let keyword: String = sql
        .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .collect();
    keyword.eq_ignore_ascii_case("select") || keyword.eq_ignore_ascii_case("with")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_and_with_return_rows() {
        assert!(returns_rows("SELECT 1"));
        assert!(returns_rows("  select * from t"));
        assert!(returns_rows("\n(SELECT 1)"));
        assert!(returns_rows("WITH x AS (SELECT 1) SELECT * FROM x"));
    }

    #[test]
    fn writes_do_not_return_rows() {
        assert!(!returns_rows("UPDATE t SET a = 1"));
        assert!(!returns_rows("INSERT INTO t VALUES (1)"));
        assert!(!returns_rows("DELETE FROM t"));
        assert!(!returns_rows("SELECTED_WORDS"));
        assert!(!returns_rows(""));
    }
}
