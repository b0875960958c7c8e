use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::{debug, info};

use crate::error::ImportError;
use crate::tabular::{Cell, Table};

pub async fn connect(database_url: &str) -> Result<SqlitePool, ImportError> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Drops `name` and recreates it from `table` inside one transaction, so a
/// failed upload leaves the previous contents in place.
pub async fn replace_table(pool: &SqlitePool, name: &str, table: &Table) -> Result<u64, ImportError> {
    if name.trim().is_empty() {
        return Err(ImportError::InvalidTableName(name.to_string()));
    }
    let target = quote_ident(name);

    let column_defs: Vec<String> = table
        .columns
        .iter()
        .map(|column| format!("{} {}", quote_ident(&column.name), column.kind.sql_type()))
        .collect();
    let column_names: Vec<String> = table
        .columns
        .iter()
        .map(|column| quote_ident(&column.name))
        .collect();
    let placeholders = vec!["?"; table.columns.len()].join(", ");
    let insert = format!(
        "INSERT INTO {target} ({}) VALUES ({placeholders})",
        column_names.join(", ")
    );

    let mut tx = pool.begin().await?;

    sqlx::query(&format!("DROP TABLE IF EXISTS {target}"))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!("CREATE TABLE {target} ({})", column_defs.join(", ")))
        .execute(&mut *tx)
        .await?;

    let mut inserted = 0u64;
    for row in &table.rows {
        let mut query = sqlx::query(&insert);
        for cell in row {
            query = match cell {
                Cell::Null => query.bind(None::<String>),
                Cell::Boolean(value) => query.bind(i64::from(*value)),
                Cell::Integer(value) => query.bind(*value),
                Cell::Real(value) => query.bind(*value),
                Cell::Text(value) => query.bind(value.as_str()),
            };
        }
        inserted += query.execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;
    debug!(table = name, columns = table.columns.len(), "table recreated");
    info!(table = name, rows = inserted, "import committed");

    Ok(inserted)
}

pub async fn count_rows(pool: &SqlitePool, name: &str) -> Result<i64, ImportError> {
    let count: i64 = sqlx::query(&format!("SELECT COUNT(*) AS total FROM {}", quote_ident(name)))
        .fetch_one(pool)
        .await?
        .get("total");

    Ok(count)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
