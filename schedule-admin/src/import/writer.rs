//! Duplicate guard and transactional writer for imported pipeline cards

use anyhow::{Context, Result};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::error::AdminError;

use super::ImportRecord;

/// Exact-match lookup of a pipeline code
pub async fn pipeline_code_exists(conn: &mut SqliteConnection, pipeline_code: &str) -> Result<bool> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT id FROM pipeline_card WHERE pipeline_code = ? LIMIT 1")
            .bind(pipeline_code)
            .fetch_optional(conn)
            .await
            .context("Failed to check pipeline code")?;
    Ok(found.is_some())
}

/// Persist one card and all of its process rows as a single unit.
///
/// Returns the new card id. A duplicate pipeline code (from the guard or from the
/// UNIQUE constraint) surfaces as `AdminError::DuplicateKey`; nothing is written
/// in that case or on any other failure.
pub async fn write_record(pool: &SqlitePool, record: &ImportRecord) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    if pipeline_code_exists(&mut tx, &record.pipeline_code).await? {
        return Err(AdminError::DuplicateKey(record.pipeline_code.clone()).into());
    }

    let card_id = insert_card(&mut tx, record).await?;
    insert_processes(&mut tx, card_id, record).await?;

    tx.commit().await.context("Failed to commit pipeline card")?;
    Ok(card_id)
}

async fn insert_card(tx: &mut Transaction<'_, Sqlite>, record: &ImportRecord) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO pipeline_card (card_no, pipeline_code, status, create_time, update_time)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(&record.sequence_label)
    .bind(&record.pipeline_code)
    .bind(record.status.as_str())
    .execute(&mut **tx)
    .await;

    match result {
        Ok(done) => Ok(done.last_insert_rowid()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(AdminError::DuplicateKey(record.pipeline_code.clone()).into())
        }
        Err(e) => Err(e).context("Failed to insert pipeline card"),
    }
}

async fn insert_processes(
    tx: &mut Transaction<'_, Sqlite>,
    card_id: i64,
    record: &ImportRecord,
) -> Result<()> {
    for value in &record.process_values {
        sqlx::query(
            r#"
            INSERT INTO pipeline_card_process
                (card_id, process_name, process_code, required_count, process_order, create_time)
            VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(card_id)
        .bind(value.process.name)
        .bind(value.process.code)
        .bind(value.value.as_deref())
        .bind(value.process.process_order())
        .execute(&mut **tx)
        .await
        .with_context(|| format!("Failed to insert process {}", value.process.code))?;
    }
    Ok(())
}
