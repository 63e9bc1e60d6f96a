//! Parameterized CRUD against a routed workstation table
//!
//! The table name is the only interpolated identifier and comes from a
//! `WorkstationTable`; every value is bound.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::error::AdminError;
use crate::paging::{Page, PageRequest};

use super::router::WorkstationTable;

/// Listing filter; `None` means "no constraint"
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessFilter {
    /// Substring match on the process name
    pub process_name: Option<String>,
    pub process_order: Option<i64>,
    pub is_dedicated: Option<bool>,
    pub is_parallel: Option<bool>,
}

/// One row of a workstation table, tagged with its workstation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessConfigRow {
    pub id: i64,
    pub process_name: Option<String>,
    /// Stage the process belongs to
    pub process_order: Option<i64>,
    pub team_name: Option<String>,
    pub is_dedicated: Option<bool>,
    pub team_size: Option<i64>,
    pub duration: Option<f64>,
    pub is_parallel: Option<bool>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub workstation_id: String,
}

/// Values written by insert and update
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessConfigInput {
    pub id: Option<i64>,
    pub process_name: Option<String>,
    pub process_order: Option<i64>,
    pub team_name: Option<String>,
    pub is_dedicated: Option<bool>,
    pub team_size: Option<i64>,
    pub duration: Option<f64>,
    pub is_parallel: Option<bool>,
}

impl ProcessConfigInput {
    fn required_name(&self) -> Result<&str, AdminError> {
        self.process_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AdminError::Validation("Process name is required".to_string()))
    }
}

/// An empty name means no name constraint
fn name_filter(filter: &ProcessFilter) -> Option<&str> {
    filter.process_name.as_deref().filter(|n| !n.is_empty())
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ProcessFilter) {
    qb.push(" WHERE 1=1");
    if let Some(name) = name_filter(filter) {
        qb.push(" AND process_name LIKE '%' || ")
            .push_bind(name.to_string())
            .push(" || '%'");
    }
    if let Some(order) = filter.process_order {
        qb.push(" AND process_order = ").push_bind(order);
    }
    if let Some(dedicated) = filter.is_dedicated {
        qb.push(" AND is_dedicated = ").push_bind(dedicated);
    }
    if let Some(parallel) = filter.is_parallel {
        qb.push(" AND is_parallel = ").push_bind(parallel);
    }
}

fn select_from(table: &WorkstationTable) -> String {
    format!(
        r#"SELECT id,
               CAST(process_name AS TEXT) AS process_name,
               CAST(process_order AS INTEGER) AS process_order,
               CAST(team_name AS TEXT) AS team_name,
               CAST(is_dedicated AS INTEGER) AS is_dedicated,
               CAST(team_size AS INTEGER) AS team_size,
               CAST(duration AS REAL) AS duration,
               CAST(is_parallel AS INTEGER) AS is_parallel,
               CAST(created_at AS TEXT) AS created_at,
               CAST(updated_at AS TEXT) AS updated_at
        FROM {}"#,
        table.table_name()
    )
}

fn row_from(row: &SqliteRow, table: &WorkstationTable) -> Result<ProcessConfigRow> {
    let flag = |column: &str| -> Result<Option<bool>> {
        Ok(row.try_get::<Option<i64>, _>(column)?.map(|v| v != 0))
    };

    Ok(ProcessConfigRow {
        id: row.try_get("id")?,
        process_name: row.try_get("process_name")?,
        process_order: row.try_get("process_order")?,
        team_name: row.try_get("team_name")?,
        is_dedicated: flag("is_dedicated")?,
        team_size: row.try_get("team_size")?,
        duration: row.try_get("duration")?,
        is_parallel: flag("is_parallel")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        workstation_id: table.workstation_id().to_string(),
    })
}

pub async fn count(pool: &SqlitePool, table: &WorkstationTable, filter: &ProcessFilter) -> Result<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {}", table.table_name()));
    push_filter(&mut qb, filter);

    qb.build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .with_context(|| format!("Failed to count rows of {}", table))
}

/// Filtered page ordered by `process_order, id`
pub async fn list(
    pool: &SqlitePool,
    table: &WorkstationTable,
    filter: &ProcessFilter,
    page: PageRequest,
) -> Result<Page<ProcessConfigRow>> {
    let total = count(pool, table, filter).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(select_from(table));
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY process_order, id LIMIT ")
        .push_bind(page.page_size)
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows = qb
        .build()
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to list rows of {}", table))?;

    let records = rows
        .iter()
        .map(|row| row_from(row, table))
        .collect::<Result<Vec<_>>>()?;

    Ok(Page::new(records, total, page))
}

/// Every row, same order as `list`
pub async fn list_all(pool: &SqlitePool, table: &WorkstationTable) -> Result<Vec<ProcessConfigRow>> {
    let sql = format!("{} ORDER BY process_order, id", select_from(table));
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to list rows of {}", table))?;

    rows.iter().map(|row| row_from(row, table)).collect()
}

/// Insert a row; returns its id
pub async fn insert(pool: &SqlitePool, table: &WorkstationTable, input: &ProcessConfigInput) -> Result<i64> {
    let name = input.required_name()?;
    let sql = format!(
        r#"INSERT INTO {}
            (process_name, process_order, team_name, is_dedicated, team_size, duration, is_parallel, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)"#,
        table.table_name()
    );

    let result = sqlx::query(&sql)
        .bind(name)
        .bind(input.process_order)
        .bind(input.team_name.as_deref())
        .bind(input.is_dedicated)
        .bind(input.team_size)
        .bind(input.duration)
        .bind(input.is_parallel)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to insert into {}", table))?;

    Ok(result.last_insert_rowid())
}

/// Overwrite every field of row `id`; `Ok(false)` when the row does not exist
pub async fn update(
    pool: &SqlitePool,
    table: &WorkstationTable,
    id: i64,
    input: &ProcessConfigInput,
) -> Result<bool> {
    let name = input.required_name()?;
    let sql = format!(
        r#"UPDATE {} SET
            process_name = ?, process_order = ?, team_name = ?, is_dedicated = ?,
            team_size = ?, duration = ?, is_parallel = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?"#,
        table.table_name()
    );

    let result = sqlx::query(&sql)
        .bind(name)
        .bind(input.process_order)
        .bind(input.team_name.as_deref())
        .bind(input.is_dedicated)
        .bind(input.team_size)
        .bind(input.duration)
        .bind(input.is_parallel)
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to update row {} of {}", id, table))?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &SqlitePool, table: &WorkstationTable, id: i64) -> Result<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?", table.table_name());
    let result = sqlx::query(&sql)
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete row {} of {}", id, table))?;

    Ok(result.rows_affected() > 0)
}
