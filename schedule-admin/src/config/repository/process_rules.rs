//! Repository for per-process rule configuration (`process_rule` table)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::error::AdminError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRule {
    pub id: i64,
    pub process_code: String,
    pub process_name: String,
    pub base_duration: Option<f64>,
    /// hours / minutes / days
    pub duration_unit: Option<String>,
    pub stage_order: Option<i64>,
    pub team_name: Option<String>,
    pub team_size: Option<i64>,
    pub description: Option<String>,
    pub create_time: String,
    pub update_time: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessRuleInput {
    pub id: Option<i64>,
    pub process_code: Option<String>,
    pub process_name: Option<String>,
    pub base_duration: Option<f64>,
    pub duration_unit: Option<String>,
    pub stage_order: Option<i64>,
    pub team_name: Option<String>,
    pub team_size: Option<i64>,
    pub description: Option<String>,
}

const SELECT_RULE: &str = r#"
    SELECT id, process_code, process_name, CAST(base_duration AS REAL) AS base_duration,
           duration_unit, stage_order, team_name, team_size, description,
           CAST(create_time AS TEXT) AS create_time,
           CAST(update_time AS TEXT) AS update_time
    FROM process_rule
"#;

fn rule_from_row(row: &SqliteRow) -> Result<ProcessRule> {
    Ok(ProcessRule {
        id: row.try_get("id")?,
        process_code: row.try_get("process_code")?,
        process_name: row.try_get("process_name")?,
        base_duration: row.try_get("base_duration")?,
        duration_unit: row.try_get("duration_unit")?,
        stage_order: row.try_get("stage_order")?,
        team_name: row.try_get("team_name")?,
        team_size: row.try_get("team_size")?,
        description: row.try_get("description")?,
        create_time: row.try_get("create_time")?,
        update_time: row.try_get("update_time")?,
    })
}

/// All rules by stage, then code
pub async fn list(pool: &SqlitePool) -> Result<Vec<ProcessRule>> {
    let rows = sqlx::query(&format!("{} ORDER BY stage_order, process_code", SELECT_RULE))
        .fetch_all(pool)
        .await
        .context("Failed to list process rules")?;
    rows.iter().map(rule_from_row).collect()
}

pub async fn get_by_code(pool: &SqlitePool, process_code: &str) -> Result<Option<ProcessRule>> {
    let row = sqlx::query(&format!("{} WHERE process_code = ?", SELECT_RULE))
        .bind(process_code)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get process rule '{}'", process_code))?;
    row.as_ref().map(rule_from_row).transpose()
}

async fn update_one(conn: &mut SqliteConnection, rule: &ProcessRuleInput) -> Result<bool> {
    let id = rule
        .id
        .ok_or_else(|| AdminError::Validation("Rule id is required".to_string()))?;

    let result = sqlx::query(
        r#"
        UPDATE process_rule SET
            process_code = COALESCE(?, process_code),
            process_name = COALESCE(?, process_name),
            base_duration = COALESCE(?, base_duration),
            duration_unit = COALESCE(?, duration_unit),
            stage_order = COALESCE(?, stage_order),
            team_name = COALESCE(?, team_name),
            team_size = COALESCE(?, team_size),
            description = COALESCE(?, description),
            update_time = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(rule.process_code.as_deref())
    .bind(rule.process_name.as_deref())
    .bind(rule.base_duration)
    .bind(rule.duration_unit.as_deref())
    .bind(rule.stage_order)
    .bind(rule.team_name.as_deref())
    .bind(rule.team_size)
    .bind(rule.description.as_deref())
    .bind(id)
    .execute(conn)
    .await
    .with_context(|| format!("Failed to update process rule {}", id))?;

    Ok(result.rows_affected() > 0)
}

/// Update one rule by id; `Ok(false)` when no rule has that id
pub async fn update(pool: &SqlitePool, rule: &ProcessRuleInput) -> Result<bool> {
    let mut conn = pool.acquire().await.context("Failed to acquire connection")?;
    update_one(&mut conn, rule).await
}

/// Update several rules in one transaction; any missing id rolls back all of them
pub async fn batch_update(pool: &SqlitePool, rules: &[ProcessRuleInput]) -> Result<bool> {
    if rules.is_empty() {
        return Err(AdminError::Validation("Rule list must not be empty".to_string()).into());
    }

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    for rule in rules {
        if !update_one(&mut tx, rule).await? {
            log::warn!("Process rule {:?} not found, batch update rolled back", rule.id);
            return Ok(false);
        }
    }
    tx.commit().await.context("Failed to commit rule updates")?;

    log::info!("Updated {} process rules", rules.len());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::repository::migrations::memory_pool;

    async fn insert_rule(pool: &SqlitePool, code: &str, stage: i64) -> i64 {
        sqlx::query(
            "INSERT INTO process_rule (process_code, process_name, base_duration, stage_order) VALUES (?, ?, 1.5, ?)",
        )
        .bind(code)
        .bind(code.to_uppercase())
        .bind(stage)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_list_orders_by_stage_then_code() {
        let pool = memory_pool().await;
        insert_rule(&pool, "rework", 9).await;
        insert_rule(&pool, "scaffold", 1).await;
        insert_rule(&pool, "grinding", 1).await;

        let codes: Vec<String> = list(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.process_code)
            .collect();
        assert_eq!(codes, vec!["grinding", "scaffold", "rework"]);
    }

    #[tokio::test]
    async fn test_get_by_code() {
        let pool = memory_pool().await;
        insert_rule(&pool, "scaffold", 1).await;

        let rule = get_by_code(&pool, "scaffold").await.unwrap().unwrap();
        assert_eq!(rule.base_duration, Some(1.5));
        assert!(get_by_code(&pool, "unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_requires_id() {
        let pool = memory_pool().await;
        let error = update(&pool, &ProcessRuleInput::default()).await.unwrap_err();
        assert!(error.to_string().contains("id is required"));
    }

    #[tokio::test]
    async fn test_batch_update_is_all_or_nothing() {
        let pool = memory_pool().await;
        let id = insert_rule(&pool, "scaffold", 1).await;

        let rules = vec![
            ProcessRuleInput {
                id: Some(id),
                base_duration: Some(4.0),
                ..Default::default()
            },
            ProcessRuleInput {
                id: Some(id + 50),
                base_duration: Some(2.0),
                ..Default::default()
            },
        ];
        assert!(!batch_update(&pool, &rules).await.unwrap());
        let rule = get_by_code(&pool, "scaffold").await.unwrap().unwrap();
        assert_eq!(rule.base_duration, Some(1.5));

        assert!(batch_update(&pool, &rules[..1]).await.unwrap());
        let rule = get_by_code(&pool, "scaffold").await.unwrap().unwrap();
        assert_eq!(rule.base_duration, Some(4.0));

        assert!(batch_update(&pool, &[]).await.is_err());
    }
}
