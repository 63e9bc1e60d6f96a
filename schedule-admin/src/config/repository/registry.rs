//! Comments and creation times for dynamically created tables

use anyhow::{Context, Result};
use sqlx::SqlitePool;

/// Record (or replace) the comment of a table
pub async fn register_table(pool: &SqlitePool, table_name: &str, comment: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO table_registry (table_name, comment, created_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(table_name) DO UPDATE SET comment = excluded.comment
        "#,
    )
    .bind(table_name)
    .bind(comment)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to register table {}", table_name))?;
    Ok(())
}

pub async fn table_comment(pool: &SqlitePool, table_name: &str) -> Result<Option<String>> {
    let comment: Option<Option<String>> =
        sqlx::query_scalar("SELECT comment FROM table_registry WHERE table_name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await
            .with_context(|| format!("Failed to read comment of {}", table_name))?;
    Ok(comment.flatten())
}

/// Does a table with exactly this name exist
pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
    let found: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await
            .with_context(|| format!("Failed to check table {}", table_name))?;
    Ok(found.is_some())
}

/// A table found in the schema with its registry entry, if any
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredTable {
    pub table_name: String,
    pub comment: Option<String>,
    pub created_at: Option<String>,
}

/// Existing tables whose names start with `prefix`
pub async fn tables_with_prefix(pool: &SqlitePool, prefix: &str) -> Result<Vec<RegisteredTable>> {
    // `_` is a LIKE wildcard; escape it so the prefix matches literally
    let pattern = format!("{}%", prefix.replace('\\', "\\\\").replace('_', "\\_"));

    let rows: Vec<(String, Option<String>, Option<String>)> = sqlx::query_as(
        r#"
        SELECT m.name, r.comment, CAST(r.created_at AS TEXT)
        FROM sqlite_master m
        LEFT JOIN table_registry r ON r.table_name = m.name
        WHERE m.type = 'table' AND m.name LIKE ? ESCAPE '\'
        ORDER BY m.name
        "#,
    )
    .bind(pattern)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to list tables with prefix {}", prefix))?;

    Ok(rows
        .into_iter()
        .map(|(table_name, comment, created_at)| RegisteredTable {
            table_name,
            comment,
            created_at,
        })
        .collect())
}
