//! Schema bootstrap and inspection.

use sqlx::migrate::Migrator;
use sqlx::PgConnection;

use crate::DbError;

// Path relative to crates/trafficdb-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Tables written by the collector.
pub const MANAGED_TABLES: [&str; 3] = [
    "all_traffic_by_url",
    "organic_pages_by_url",
    "search_queries_webmaster",
];

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ColumnInfo {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

/// Snapshot of what the connected database contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReport {
    pub database: String,
    /// Every table in the `public` schema, sorted.
    pub tables: Vec<String>,
    /// Columns of the managed tables, in table then ordinal order.
    pub columns: Vec<ColumnInfo>,
}

impl SchemaReport {
    /// Managed tables absent from the database.
    #[must_use]
    pub fn missing_tables(&self) -> Vec<&'static str> {
        MANAGED_TABLES
            .into_iter()
            .filter(|name| !self.tables.iter().any(|t| t == name))
            .collect()
    }

    pub fn columns_of<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a ColumnInfo> {
        self.columns.iter().filter(move |c| c.table_name == table)
    }
}

/// Applies pending migrations. Safe to run repeatedly.
///
/// # Errors
///
/// Returns [`DbError::Migration`] if a migration fails.
pub async fn bootstrap_schema(conn: &mut PgConnection) -> Result<(), DbError> {
    MIGRATOR.run(conn).await?;
    Ok(())
}

/// Reads the database name, public tables and managed-table columns.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any catalog query fails.
pub async fn inspect_schema(conn: &mut PgConnection) -> Result<SchemaReport, DbError> {
    let database = sqlx::query_scalar::<_, String>("SELECT current_database()::TEXT")
        .fetch_one(&mut *conn)
        .await?;

    let tables = sqlx::query_scalar::<_, String>(
        "SELECT table_name::TEXT \
         FROM information_schema.tables \
         WHERE table_schema = 'public' \
         ORDER BY table_name",
    )
    .fetch_all(&mut *conn)
    .await?;

    let columns = sqlx::query_as::<_, ColumnInfo>(
        "SELECT table_name::TEXT AS table_name, \
                column_name::TEXT AS column_name, \
                data_type::TEXT AS data_type, \
                (is_nullable = 'YES') AS is_nullable \
         FROM information_schema.columns \
         WHERE table_schema = 'public' AND table_name::TEXT = ANY($1) \
         ORDER BY table_name, ordinal_position",
    )
    .bind(&MANAGED_TABLES[..])
    .fetch_all(&mut *conn)
    .await?;

    Ok(SchemaReport {
        database,
        tables,
        columns,
    })
}
