//! Read `schedule_result_<date>_<time>` tables written by the scheduler

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;

use crate::config::repository::registry;
use crate::error::AdminError;

pub const RESULT_TABLE_PREFIX: &str = "schedule_result_";
const DEFAULT_COMMENT: &str = "Schedule result";

static RESULT_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^schedule_result_([0-9]{8})_([0-9]{6})$").expect("valid result table regex")
});

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultTableSummary {
    pub table_name: String,
    pub comment: String,
    pub created_time: String,
    pub task_count: i64,
    /// Latest end time in the table, 0.0 when empty
    pub makespan: f64,
}

/// One scheduled task, same shape for both table layouts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleTask {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub workpoint_name: Option<String>,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub workers: Option<i64>,
    pub order: Option<i64>,
    pub workpoint_id: Option<String>,
    pub team: Option<String>,
}

/// Table layouts written by different scheduler versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchemaVariant {
    /// `team` text column, `workpoint_id` stored as text
    Legacy,
    /// `team_id` + `team_name`, numeric `workpoint_id`
    Current,
}

impl SchemaVariant {
    fn detect(columns: &HashSet<String>) -> Self {
        if columns.contains("team_id") {
            SchemaVariant::Current
        } else {
            SchemaVariant::Legacy
        }
    }

    /// Columns read for this layout, with the cast applied to each
    fn columns(&self) -> &'static [(&'static str, &'static str)] {
        const SHARED: [(&str, &str); 7] = [
            ("task_id", "INTEGER"),
            ("task_name", "TEXT"),
            ("workpoint_name", "TEXT"),
            ("start_time", "REAL"),
            ("end_time", "REAL"),
            ("workers", "INTEGER"),
            ("process_order", "INTEGER"),
        ];
        const LEGACY: [(&str, &str); 9] = [
            SHARED[0], SHARED[1], SHARED[2], SHARED[3], SHARED[4], SHARED[5], SHARED[6],
            ("workpoint_id", "TEXT"),
            ("team", "TEXT"),
        ];
        const CURRENT: [(&str, &str); 10] = [
            SHARED[0], SHARED[1], SHARED[2], SHARED[3], SHARED[4], SHARED[5], SHARED[6],
            ("workpoint_id", "INTEGER"),
            ("team_id", "INTEGER"),
            ("team_name", "TEXT"),
        ];
        match self {
            SchemaVariant::Legacy => &LEGACY,
            SchemaVariant::Current => &CURRENT,
        }
    }

    /// A NULL id in the current layout stays `None` rather than becoming `workpoint_null`
    fn normalize(&self, row: &SqliteRow) -> Result<ScheduleTask> {
        let (workpoint_id, team) = match self {
            SchemaVariant::Current => (
                row.try_get::<Option<i64>, _>("workpoint_id")?
                    .map(|id| format!("workpoint_{}", id)),
                row.try_get::<Option<i64>, _>("team_id")?
                    .map(|id| format!("team{}", id)),
            ),
            SchemaVariant::Legacy => (row.try_get("workpoint_id")?, row.try_get("team")?),
        };

        Ok(ScheduleTask {
            id: row.try_get("task_id")?,
            name: row.try_get("task_name")?,
            workpoint_name: row.try_get("workpoint_name")?,
            start: row.try_get("start_time")?,
            end: row.try_get("end_time")?,
            workers: row.try_get("workers")?,
            order: row.try_get("process_order")?,
            workpoint_id,
            team,
        })
    }
}

pub fn is_result_table(table_name: &str) -> bool {
    RESULT_TABLE.is_match(table_name)
}

/// Creation time encoded in the table name, `YYYY-MM-DD HH:MM:SS`
fn created_from_name(table_name: &str) -> Option<String> {
    let caps = RESULT_TABLE.captures(table_name)?;
    let stamp = format!("{}_{}", &caps[1], &caps[2]);
    NaiveDateTime::parse_from_str(&stamp, "%Y%m%d_%H%M%S")
        .ok()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

async fn table_stats(pool: &SqlitePool, table_name: &str) -> Result<(i64, f64)> {
    let sql = format!(
        "SELECT COUNT(*) AS task_count, CAST(MAX(end_time) AS REAL) AS makespan FROM {}",
        table_name
    );
    let row = sqlx::query(&sql)
        .fetch_one(pool)
        .await
        .with_context(|| format!("Failed to read stats of {}", table_name))?;

    let task_count: i64 = row.try_get("task_count")?;
    let makespan: Option<f64> = row.try_get("makespan")?;
    Ok((task_count, makespan.unwrap_or(0.0)))
}

/// Result tables, most recently created first, at most `limit` of them.
/// A table whose stats cannot be read is skipped.
pub async fn list_result_tables(pool: &SqlitePool, limit: i64) -> Result<Vec<ResultTableSummary>> {
    if limit <= 0 {
        return Ok(Vec::new());
    }

    let mut candidates: Vec<(String, Option<String>, String)> =
        registry::tables_with_prefix(pool, RESULT_TABLE_PREFIX)
            .await?
            .into_iter()
            .filter(|t| is_result_table(&t.table_name))
            .map(|t| {
                let created = t
                    .created_at
                    .or_else(|| created_from_name(&t.table_name))
                    .unwrap_or_default();
                (t.table_name, t.comment, created)
            })
            .collect();

    candidates.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| b.0.cmp(&a.0)));
    candidates.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

    let mut summaries = Vec::with_capacity(candidates.len());
    for (table_name, comment, created_time) in candidates {
        match table_stats(pool, &table_name).await {
            Ok((task_count, makespan)) => summaries.push(ResultTableSummary {
                comment: comment
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_COMMENT.to_string()),
                table_name,
                created_time,
                task_count,
                makespan,
            }),
            Err(e) => {
                log::warn!("Skipping schedule result table {}: {:#}", table_name, e);
            }
        }
    }

    log::debug!("Found {} schedule result tables", summaries.len());
    Ok(summaries)
}

async fn column_names(pool: &SqlitePool, table_name: &str) -> Result<HashSet<String>> {
    let names: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info(?)")
        .bind(table_name)
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to inspect columns of {}", table_name))?;
    Ok(names.into_iter().collect())
}

/// Every task of a result table ordered by `start_time, task_id`
pub async fn read_result_table(pool: &SqlitePool, table_name: &str) -> Result<Vec<ScheduleTask>> {
    if !is_result_table(table_name) {
        return Err(AdminError::IllegalResultTable(table_name.to_string()).into());
    }
    if !registry::table_exists(pool, table_name).await? {
        return Err(AdminError::ResultTableNotFound(table_name.to_string()).into());
    }

    let columns = column_names(pool, table_name).await?;
    let variant = SchemaVariant::detect(&columns);
    log::debug!("Reading {} as {:?} layout", table_name, variant);

    // Missing columns read as NULL so partial tables still load
    let select_list = variant
        .columns()
        .iter()
        .map(|(column, cast)| {
            if columns.contains(*column) {
                format!("CAST({column} AS {cast}) AS {column}")
            } else {
                format!("NULL AS {column}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ");

    let order_by = ["start_time", "task_id"]
        .iter()
        .filter(|c| columns.contains(**c))
        .copied()
        .collect::<Vec<_>>();
    let order_clause = if order_by.is_empty() {
        String::new()
    } else {
        format!(" ORDER BY {}", order_by.join(", "))
    };

    let sql = format!("SELECT {} FROM {}{}", select_list, table_name, order_clause);
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to read {}", table_name))?;

    rows.iter().map(|row| variant.normalize(row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::repository::migrations::memory_pool;
    use crate::error::find_admin_error;

    async fn exec(pool: &SqlitePool, sql: &str) {
        sqlx::query(sql).execute(pool).await.unwrap();
    }

    async fn current_table(pool: &SqlitePool, name: &str) {
        exec(
            pool,
            &format!(
                "CREATE TABLE {name} (task_id INTEGER, task_name TEXT, workpoint_id INTEGER, \
                 workpoint_name TEXT, team_id INTEGER, team_name TEXT, start_time DECIMAL(10,2), \
                 end_time DECIMAL(10,2), duration DECIMAL(10,2), workers INTEGER, process_order INTEGER)"
            ),
        )
        .await;
    }

    #[tokio::test]
    async fn test_read_current_layout() {
        let pool = memory_pool().await;
        let table = "schedule_result_20250101_120000";
        current_table(&pool, table).await;
        exec(
            &pool,
            &format!(
                "INSERT INTO {table} VALUES \
                 (2, 'Grinding', 3, 'Boiler', 2, 'Team B', 5.0, 9.5, 4.5, 2, 3), \
                 (1, 'Scaffolding', 3, 'Boiler', 1, 'Team A', 0.0, 5.0, 5.0, 4, 1), \
                 (3, 'RT', 4, 'Yard', 1, 'Team A', 5.0, 7.0, 2.0, 1, 4)"
            ),
        )
        .await;

        let tasks = read_result_table(&pool, table).await.unwrap();
        let ids: Vec<i64> = tasks.iter().map(|t| t.id.unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        assert_eq!(tasks[0].workpoint_id.as_deref(), Some("workpoint_3"));
        assert_eq!(tasks[0].team.as_deref(), Some("team1"));
        assert_eq!(tasks[1].team.as_deref(), Some("team2"));
        assert_eq!(tasks[1].end, Some(9.5));
        assert_eq!(tasks[1].order, Some(3));
    }

    #[tokio::test]
    async fn test_read_current_layout_keeps_missing_ids_empty() {
        let pool = memory_pool().await;
        let table = "schedule_result_20250102_120000";
        current_table(&pool, table).await;
        exec(
            &pool,
            &format!(
                "INSERT INTO {table} (task_id, task_name, workpoint_id, team_id, start_time) VALUES \
                 (1, 'Scaffolding', NULL, 2, 0.0), (2, 'Grinding', 5, NULL, 1.0)"
            ),
        )
        .await;

        let tasks = read_result_table(&pool, table).await.unwrap();
        assert_eq!(tasks[0].workpoint_id, None);
        assert_eq!(tasks[0].team.as_deref(), Some("team2"));
        assert_eq!(tasks[1].workpoint_id.as_deref(), Some("workpoint_5"));
        assert_eq!(tasks[1].team, None);

        let json = serde_json::to_value(&tasks[0]).unwrap();
        assert!(json["workpointId"].is_null());
    }

    #[tokio::test]
    async fn test_read_legacy_layout_passes_values_through() {
        let pool = memory_pool().await;
        let table = "schedule_result_20240601_080000";
        exec(
            &pool,
            &format!(
                "CREATE TABLE {table} (task_id INTEGER, task_name TEXT, workpoint_id TEXT, \
                 workpoint_name TEXT, team TEXT, start_time REAL, end_time REAL, workers INTEGER, \
                 process_order INTEGER)"
            ),
        )
        .await;
        exec(
            &pool,
            &format!("INSERT INTO {table} VALUES (1, 'Scaffolding', 'workpoint_9', 'Dock', 'team4', 0, 3, 2, 1)"),
        )
        .await;

        let tasks = read_result_table(&pool, table).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].workpoint_id.as_deref(), Some("workpoint_9"));
        assert_eq!(tasks[0].team.as_deref(), Some("team4"));
        assert_eq!(tasks[0].start, Some(0.0));
    }

    #[tokio::test]
    async fn test_illegal_name_rejected_before_query() {
        let pool = memory_pool().await;
        for bad in [
            "schedule_result_abc",
            "schedule_result_2025010_120000",
            "schedule_result_20250101_120000; DROP TABLE process",
            "process",
        ] {
            let error = read_result_table(&pool, bad).await.unwrap_err();
            assert_eq!(
                find_admin_error(&error),
                Some(&AdminError::IllegalResultTable(bad.to_string()))
            );
        }
    }

    #[tokio::test]
    async fn test_missing_table_is_not_found() {
        let pool = memory_pool().await;
        let error = read_result_table(&pool, "schedule_result_20250101_120000")
            .await
            .unwrap_err();
        assert!(matches!(
            find_admin_error(&error),
            Some(AdminError::ResultTableNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_newest_first_with_stats_and_skips() {
        let pool = memory_pool().await;
        current_table(&pool, "schedule_result_20250101_120000").await;
        current_table(&pool, "schedule_result_20250301_090000").await;
        exec(
            &pool,
            "INSERT INTO schedule_result_20250301_090000 (task_id, end_time) VALUES (1, 12.5), (2, 40.25)",
        )
        .await;
        // Matches the pattern but has no end_time column: stats fail, table skipped
        exec(&pool, "CREATE TABLE schedule_result_20250201_000000 (task_id INTEGER)").await;
        // Does not match the pattern
        exec(&pool, "CREATE TABLE schedule_result_backup (task_id INTEGER)").await;

        let tables = list_result_tables(&pool, 50).await.unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.table_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["schedule_result_20250301_090000", "schedule_result_20250101_120000"]
        );

        assert_eq!(tables[0].task_count, 2);
        assert_eq!(tables[0].makespan, 40.25);
        assert_eq!(tables[0].created_time, "2025-03-01 09:00:00");
        assert_eq!(tables[0].comment, "Schedule result");
        assert_eq!(tables[1].task_count, 0);
        assert_eq!(tables[1].makespan, 0.0);

        let limited = list_result_tables(&pool, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert!(list_result_tables(&pool, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_registry_comment_and_time_win() {
        let pool = memory_pool().await;
        current_table(&pool, "schedule_result_20250101_120000").await;
        exec(
            &pool,
            "INSERT INTO table_registry (table_name, comment, created_at) \
             VALUES ('schedule_result_20250101_120000', 'Morning run', '2025-01-01 12:00:05')",
        )
        .await;

        let tables = list_result_tables(&pool, 10).await.unwrap();
        assert_eq!(tables[0].comment, "Morning run");
        assert_eq!(tables[0].created_time, "2025-01-01 12:00:05");
    }
}
