//! Repository for the inspection process catalogue (`process` table)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::error::AdminError;
use crate::paging::{Page, PageRequest};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub id: i64,
    pub process_name: String,
    /// Minutes
    pub duration: Option<i64>,
    pub stage: Option<i64>,
    pub team_id: Option<i64>,
    /// `false` dedicated crew, `true` shared crew
    pub is_shared: Option<bool>,
    /// `"Y"` marks a valid process
    pub is_valid: String,
    pub create_time: String,
    pub update_time: String,
}

/// Fields accepted on save/update; absent fields keep their stored value on update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessInput {
    pub id: Option<i64>,
    pub process_name: Option<String>,
    pub duration: Option<i64>,
    pub stage: Option<i64>,
    pub team_id: Option<i64>,
    pub is_shared: Option<bool>,
    pub is_valid: Option<String>,
}

const SELECT_PROCESS: &str = r#"
    SELECT id, process_name, duration, stage, team_id, is_shared, is_valid,
           CAST(create_time AS TEXT) AS create_time,
           CAST(update_time AS TEXT) AS update_time
    FROM process
"#;

fn process_from_row(row: &SqliteRow) -> Result<Process> {
    Ok(Process {
        id: row.try_get("id")?,
        process_name: row.try_get("process_name")?,
        duration: row.try_get("duration")?,
        stage: row.try_get("stage")?,
        team_id: row.try_get("team_id")?,
        is_shared: row.try_get::<Option<i64>, _>("is_shared")?.map(|v| v != 0),
        is_valid: row.try_get("is_valid")?,
        create_time: row.try_get("create_time")?,
        update_time: row.try_get("update_time")?,
    })
}

/// Treat empty strings and the literal `"null"` sent by form clients as absent
fn name_filter(name: Option<&str>) -> Option<&str> {
    name.map(str::trim)
        .filter(|n| !n.is_empty() && *n != "null")
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<Process>> {
    let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_PROCESS))
        .fetch_all(pool)
        .await
        .context("Failed to list processes")?;
    rows.iter().map(process_from_row).collect()
}

/// Exact-name lookup
pub async fn find_by_name(pool: &SqlitePool, process_name: &str) -> Result<Vec<Process>> {
    if process_name.trim().is_empty() {
        return Err(AdminError::Validation("Process name must not be empty".to_string()).into());
    }

    let rows = sqlx::query(&format!("{} WHERE process_name = ? ORDER BY id", SELECT_PROCESS))
        .bind(process_name)
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to find process '{}'", process_name))?;
    rows.iter().map(process_from_row).collect()
}

/// Insert a process; `is_valid` defaults to `"Y"`. Returns the new id.
pub async fn save(pool: &SqlitePool, input: &ProcessInput) -> Result<i64> {
    let name = input
        .process_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AdminError::Validation("Process name is required".to_string()))?;

    let result = sqlx::query(
        r#"
        INSERT INTO process (process_name, duration, stage, team_id, is_shared, is_valid)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(input.duration)
    .bind(input.stage)
    .bind(input.team_id)
    .bind(input.is_shared)
    .bind(input.is_valid.as_deref().unwrap_or("Y"))
    .execute(pool)
    .await
    .context("Failed to save process")?;

    Ok(result.last_insert_rowid())
}

/// Update by id; only the given fields change
pub async fn update(pool: &SqlitePool, input: &ProcessInput) -> Result<bool> {
    let id = input
        .id
        .ok_or_else(|| AdminError::Validation("Process id is required".to_string()))?;

    let result = sqlx::query(
        r#"
        UPDATE process SET
            process_name = COALESCE(?, process_name),
            duration = COALESCE(?, duration),
            stage = COALESCE(?, stage),
            team_id = COALESCE(?, team_id),
            is_shared = COALESCE(?, is_shared),
            is_valid = COALESCE(?, is_valid),
            update_time = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(input.process_name.as_deref())
    .bind(input.duration)
    .bind(input.stage)
    .bind(input.team_id)
    .bind(input.is_shared)
    .bind(input.is_valid.as_deref())
    .bind(id)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to update process {}", id))?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM process WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete process {}", id))?;
    Ok(result.rows_affected() > 0)
}

/// Page through processes, optionally filtered by a name substring
pub async fn page(
    pool: &SqlitePool,
    process_name: Option<&str>,
    request: PageRequest,
) -> Result<Page<Process>> {
    let name = name_filter(process_name);

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM process WHERE 1=1");
    let mut qb = QueryBuilder::<Sqlite>::new(format!("{} WHERE 1=1", SELECT_PROCESS));
    if let Some(name) = name {
        for builder in [&mut count, &mut qb] {
            builder
                .push(" AND process_name LIKE '%' || ")
                .push_bind(name.to_string())
                .push(" || '%'");
        }
    }

    let total = count
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .context("Failed to count processes")?;

    qb.push(" ORDER BY id LIMIT ")
        .push_bind(request.page_size)
        .push(" OFFSET ")
        .push_bind(request.offset());
    let rows = qb
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to page processes")?;

    let records = rows.iter().map(process_from_row).collect::<Result<Vec<_>>>()?;
    Ok(Page::new(records, total, request))
}

/// Duration lookup by process name, used to assemble scheduler parameters
pub async fn durations_by_name(pool: &SqlitePool) -> Result<Vec<(String, Option<i64>)>> {
    let rows: Vec<(String, Option<i64>)> = sqlx::query_as(
        "SELECT process_name, duration FROM process WHERE is_valid = 'Y' ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .context("Failed to load process durations")?;
    Ok(rows)
}
