//! Repository for persisted daily scheduling summaries

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    pub id: i64,
    /// `YYYY-MM-DD`
    pub schedule_date: String,
    pub model_version: Option<String>,
    pub experiment_group: Option<String>,
    pub makespan: Option<f64>,
    pub resource_utilization: Option<f64>,
    pub total_workers: Option<i64>,
    pub execution_time: Option<f64>,
    pub schedule_details: Option<String>,
    pub gantt_chart: Option<String>,
    pub status: Option<String>,
    pub error: Option<String>,
    pub created_at: String,
}

/// Values written for one scheduling run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewScheduleRecord {
    pub schedule_date: NaiveDate,
    pub model_version: Option<String>,
    pub experiment_group: Option<String>,
    pub makespan: Option<f64>,
    pub resource_utilization: Option<f64>,
    pub total_workers: Option<i64>,
    pub execution_time: Option<f64>,
    pub schedule_details: Option<String>,
    pub gantt_chart: Option<String>,
    pub status: Option<String>,
    pub error: Option<String>,
}

fn record_from_row(row: &SqliteRow) -> Result<ScheduleRecord> {
    Ok(ScheduleRecord {
        id: row.try_get("id")?,
        schedule_date: row.try_get("schedule_date")?,
        model_version: row.try_get("model_version")?,
        experiment_group: row.try_get("experiment_group")?,
        makespan: row.try_get("makespan")?,
        resource_utilization: row.try_get("resource_utilization")?,
        total_workers: row.try_get("total_workers")?,
        execution_time: row.try_get("execution_time")?,
        schedule_details: row.try_get("schedule_details")?,
        gantt_chart: row.try_get("gantt_chart")?,
        status: row.try_get("status")?,
        error: row.try_get("error")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Insert the run for its date, replacing an earlier run of the same date
pub async fn upsert(pool: &SqlitePool, record: &NewScheduleRecord) -> Result<i64> {
    let date = record.schedule_date.format("%Y-%m-%d").to_string();

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO daily_schedule_records
            (schedule_date, model_version, experiment_group, makespan, resource_utilization,
             total_workers, execution_time, schedule_details, gantt_chart, status, error)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(schedule_date) DO UPDATE SET
            model_version = excluded.model_version,
            experiment_group = excluded.experiment_group,
            makespan = excluded.makespan,
            resource_utilization = excluded.resource_utilization,
            total_workers = excluded.total_workers,
            execution_time = excluded.execution_time,
            schedule_details = excluded.schedule_details,
            gantt_chart = excluded.gantt_chart,
            status = excluded.status,
            error = excluded.error,
            created_at = CURRENT_TIMESTAMP
        RETURNING id
        "#,
    )
    .bind(&date)
    .bind(record.model_version.as_deref())
    .bind(record.experiment_group.as_deref())
    .bind(record.makespan)
    .bind(record.resource_utilization)
    .bind(record.total_workers)
    .bind(record.execution_time)
    .bind(record.schedule_details.as_deref())
    .bind(record.gantt_chart.as_deref())
    .bind(record.status.as_deref())
    .bind(record.error.as_deref())
    .fetch_one(pool)
    .await
    .with_context(|| format!("Failed to save schedule record for {}", date))?;

    Ok(id)
}

/// Records dated on or after `since`, newest first
pub async fn history_since(pool: &SqlitePool, since: NaiveDate) -> Result<Vec<ScheduleRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, schedule_date, model_version, experiment_group,
               CAST(makespan AS REAL) AS makespan,
               CAST(resource_utilization AS REAL) AS resource_utilization,
               total_workers,
               CAST(execution_time AS REAL) AS execution_time,
               schedule_details, gantt_chart, status, error,
               CAST(created_at AS TEXT) AS created_at
        FROM daily_schedule_records
        WHERE schedule_date >= ?
        ORDER BY schedule_date DESC
        "#,
    )
    .bind(since.format("%Y-%m-%d").to_string())
    .fetch_all(pool)
    .await
    .context("Failed to load schedule history")?;

    rows.iter().map(record_from_row).collect()
}
