//! `db` maintenance commands.

use anyhow::Context;
use clap::Subcommand;
use sqlx::Row;
use trafficdb_core::DatabaseConfig;
use trafficdb_db::{RawQueryResult, SchemaReport, Store, MANAGED_TABLES};

/// Sub-commands available under `db`.
#[derive(Debug, Subcommand)]
pub enum DbCommands {
    /// Create the analytics tables if they do not exist
    Bootstrap,
    /// Show the connected database, its tables and managed-table row counts
    Check,
    /// Collapse runs of whitespace in stored month labels
    NormalizeLabels,
}

pub(crate) async fn run_db_command(
    database: &DatabaseConfig,
    command: DbCommands,
) -> anyhow::Result<()> {
    let store = Store::from_config(database)?;
    match command {
        DbCommands::Bootstrap => {
            store
                .bootstrap_schema()
                .await
                .context("schema bootstrap failed")?;
            println!("schema ready: {}", MANAGED_TABLES.join(", "));
        }
        DbCommands::Check => {
            let report = store.inspect_schema().await?;
            print_report(&report);
            if report.missing_tables().is_empty() {
                for (table, rows) in row_counts(&store).await? {
                    println!("  {table}: {rows} rows");
                }
            }
        }
        DbCommands::NormalizeLabels => {
            let changed = normalize_labels(&store).await?;
            println!("normalized {changed} month labels");
        }
    }
    Ok(())
}

fn print_report(report: &SchemaReport) {
    println!("database: {}", report.database);
    println!("tables: {}", report.tables.join(", "));
    for table in MANAGED_TABLES {
        let columns: Vec<String> = report
            .columns_of(table)
            .map(|c| format!("{} {}", c.column_name, c.data_type))
            .collect();
        if columns.is_empty() {
            println!("  {table}: missing (run `trafficdb db bootstrap`)");
        } else {
            println!("  {table}: {}", columns.join(", "));
        }
    }
}

/// Row count of every managed table.
///
/// # Errors
///
/// Returns an error if any count query fails.
pub(crate) async fn row_counts(store: &Store) -> anyhow::Result<Vec<(&'static str, i64)>> {
    let mut counts = Vec::with_capacity(MANAGED_TABLES.len());
    for table in MANAGED_TABLES {
        let sql = format!("SELECT COUNT(*)::BIGINT AS row_count FROM {table}");
        let RawQueryResult::Rows(rows) = store.execute_raw(&sql, &[]).await? else {
            anyhow::bail!("count query on {table} returned no rows");
        };
        let count = match rows.first() {
            Some(row) => row.try_get::<i64, _>("row_count")?,
            None => 0,
        };
        counts.push((table, count));
    }
    Ok(counts)
}

/// Rewrites `month_year` so every whitespace run becomes a single space.
///
/// Returns the number of rows changed across all managed tables.
///
/// # Errors
///
/// Returns an error if an update fails; that table's update is rolled back.
pub(crate) async fn normalize_labels(store: &Store) -> anyhow::Result<u64> {
    let mut changed = 0;
    for table in MANAGED_TABLES {
        let sql = format!(
            "UPDATE {table} \
             SET month_year = REGEXP_REPLACE(month_year, '\\s+', ' ', 'g') \
             WHERE month_year <> REGEXP_REPLACE(month_year, '\\s+', ' ', 'g')"
        );
        match store.execute_raw(&sql, &[]).await? {
            RawQueryResult::Committed { rows_affected } => {
                tracing::info!(table, rows_affected, "month labels normalized");
                changed += rows_affected;
            }
            RawQueryResult::Rows(_) => anyhow::bail!("UPDATE on {table} unexpectedly returned rows"),
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
    use trafficdb_core::SearchQueryRecord;

    use super::*;

    fn query(text: &str, label: &str) -> SearchQueryRecord {
        SearchQueryRecord {
            query_text: text.to_string(),
            date_from: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            date_to: NaiveDate::from_ymd_opt(2025, 7, 31).unwrap(),
            shows: 1,
            clicks: 1,
            avg_show_position: Decimal::ONE,
            month_year: label.to_string(),
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn normalize_labels_only_touches_messy_rows(
        _pool_opts: PgPoolOptions,
        connect_opts: PgConnectOptions,
    ) {
        let store = Store::new(connect_opts);
        store.upsert_search_query(&query("a", "July 2025")).await.unwrap();
        store.upsert_search_query(&query("b", "July \t 2025")).await.unwrap();

        assert_eq!(normalize_labels(&store).await.unwrap(), 1);
        assert_eq!(normalize_labels(&store).await.unwrap(), 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn row_counts_cover_every_managed_table(
        _pool_opts: PgPoolOptions,
        connect_opts: PgConnectOptions,
    ) {
        let store = Store::new(connect_opts);
        store.upsert_search_query(&query("a", "July 2025")).await.unwrap();

        let counts = row_counts(&store).await.unwrap();
        assert_eq!(
            counts,
            vec![
                ("all_traffic_by_url", 0),
                ("organic_pages_by_url", 0),
                ("search_queries_webmaster", 1),
            ]
        );
    }
}
