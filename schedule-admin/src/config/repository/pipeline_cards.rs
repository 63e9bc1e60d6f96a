//! Repository for imported pipeline cards and their process rows

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::cmp::Ordering;

use crate::error::AdminError;
use crate::import::columns::{PIPELINE_CODE_HEADER, SEQUENCE_LABEL_HEADER};
use crate::paging::{Page, PageRequest};

/// Listing filter; blank values are ignored
#[derive(Debug, Clone, Default)]
pub struct CardFilter {
    /// Substring match
    pub pipeline_code: Option<String>,
    /// Exact match
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineCard {
    pub id: i64,
    pub card_no: Option<String>,
    pub pipeline_code: String,
    pub status: String,
    pub create_time: String,
    pub update_time: String,
    pub processes: Vec<CardProcess>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardProcess {
    pub id: i64,
    pub card_id: i64,
    pub process_name: String,
    pub process_code: String,
    /// Raw cell text; `None` when the cell had no value
    pub required_count: Option<String>,
    pub process_order: i64,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &CardFilter) {
    if let Some(code) = non_blank(&filter.pipeline_code) {
        qb.push(" AND pipeline_code LIKE '%' || ")
            .push_bind(code.to_string())
            .push(" || '%'");
    }
    if let Some(status) = non_blank(&filter.status) {
        qb.push(" AND status = ").push_bind(status.to_string());
    }
}

const CARD_COLUMNS: &str = "id, card_no, pipeline_code, status, \
     CAST(create_time AS TEXT) AS create_time, CAST(update_time AS TEXT) AS update_time";

fn card_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<PipelineCard> {
    Ok(PipelineCard {
        id: row.try_get("id")?,
        card_no: row.try_get("card_no")?,
        pipeline_code: row.try_get("pipeline_code")?,
        status: row.try_get("status")?,
        create_time: row.try_get("create_time")?,
        update_time: row.try_get("update_time")?,
        processes: Vec::new(),
    })
}

/// Process rows of one card, in column order
pub async fn card_processes(pool: &SqlitePool, card_id: i64) -> Result<Vec<CardProcess>> {
    let rows = sqlx::query(
        r#"
        SELECT id, card_id, process_name, process_code, required_count, process_order
        FROM pipeline_card_process
        WHERE card_id = ?
        ORDER BY process_order, id
        "#,
    )
    .bind(card_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to load processes of card {}", card_id))?;

    let mut processes = Vec::with_capacity(rows.len());
    for row in rows {
        processes.push(CardProcess {
            id: row.try_get("id")?,
            card_id: row.try_get("card_id")?,
            process_name: row.try_get("process_name")?,
            process_code: row.try_get("process_code")?,
            required_count: row.try_get("required_count")?,
            process_order: row.try_get("process_order")?,
        });
    }
    Ok(processes)
}

/// Cards newest first, each with its processes
pub async fn list_page(
    pool: &SqlitePool,
    filter: &CardFilter,
    page: PageRequest,
) -> Result<Page<PipelineCard>> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM pipeline_card WHERE 1=1");
    push_filter(&mut count, filter);
    let total: i64 = count
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .context("Failed to count pipeline cards")?;

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM pipeline_card WHERE 1=1",
        CARD_COLUMNS
    ));
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY create_time DESC, id DESC LIMIT ")
        .push_bind(page.page_size)
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows = qb
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to list pipeline cards")?;

    let mut cards = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut card = card_from_row(row)?;
        card.processes = card_processes(pool, card.id).await?;
        cards.push(card);
    }

    Ok(Page::new(cards, total, page))
}

/// Sort key for the flat listing: numeric labels first in numeric order, then
/// everything else lexicographically. Total, so sorting never sees a cycle.
fn compare_card_no(a: &Option<String>, b: &Option<String>) -> Ordering {
    let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
    match (parse(a), parse(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.as_deref().unwrap_or("").cmp(b.as_deref().unwrap_or("")),
    }
}

/// One flat object per card: identity fields plus one key per process code.
/// Header-text rows are excluded; paging happens after sorting.
pub async fn list_flat(
    pool: &SqlitePool,
    filter: &CardFilter,
    page: PageRequest,
) -> Result<Page<Map<String, Value>>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM pipeline_card WHERE 1=1",
        CARD_COLUMNS
    ));
    push_filter(&mut qb, filter);
    qb.push(" AND pipeline_code <> ")
        .push_bind(PIPELINE_CODE_HEADER)
        .push(" AND (card_no IS NULL OR card_no <> ")
        .push_bind(SEQUENCE_LABEL_HEADER)
        .push(")");

    let rows = qb
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to list pipeline cards")?;

    let mut cards = rows.iter().map(card_from_row).collect::<Result<Vec<_>>>()?;
    cards.sort_by(|a, b| compare_card_no(&a.card_no, &b.card_no).then(a.id.cmp(&b.id)));

    let total = cards.len() as i64;
    let mut records = Vec::new();
    for card in page.slice(&cards) {
        let mut flat = Map::new();
        flat.insert("id".into(), Value::from(card.id));
        flat.insert("cardNo".into(), card.card_no.clone().map_or(Value::Null, Value::from));
        flat.insert("pipelineCode".into(), Value::from(card.pipeline_code.clone()));
        flat.insert("status".into(), Value::from(card.status.clone()));

        for process in card_processes(pool, card.id).await? {
            let value = process.required_count.map_or(Value::Null, Value::from);
            flat.insert(process.process_code, value);
        }
        records.push(flat);
    }

    Ok(Page::new(records, total, page))
}

/// Delete one card; process rows cascade
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM pipeline_card WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete pipeline card {}", id))?;
    Ok(result.rows_affected() > 0)
}

/// Delete several cards in one statement; returns whether anything was removed
pub async fn delete_batch(pool: &SqlitePool, ids: &[i64]) -> Result<bool> {
    if ids.is_empty() {
        return Err(AdminError::Validation("No card ids given".to_string()).into());
    }

    let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM pipeline_card WHERE id IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let result = qb
        .build()
        .execute(pool)
        .await
        .context("Failed to delete pipeline cards")?;

    log::info!("Deleted {} of {} pipeline cards", result.rows_affected(), ids.len());
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::repository::migrations::memory_pool;
    use crate::import::columns::PROCESS_COLUMNS;
    use crate::import::excel::reader::tests::{Fixture, workbook_bytes};
    use crate::import::writer::write_record;
    use crate::import::{CardStatus, ImportRecord, ProcessValue, import_workbook};

    async fn seed(pool: &SqlitePool) {
        let bytes = workbook_bytes(&[
            vec![Fixture::Number(10.0), Fixture::Text("AV-10"), Fixture::Number(1.0)],
            vec![Fixture::Text("x"), Fixture::Text("AV-X"), Fixture::Blank, Fixture::Number(2.5)],
            vec![Fixture::Number(1.0), Fixture::Text("BV-1")],
        ]);
        let summary = import_workbook(pool, &bytes).await.unwrap();
        assert_eq!(summary.success_count, 3);

        // Empty-string value stored as-is, distinct from a missing value
        let record = ImportRecord {
            sequence_label: Some("2".to_string()),
            pipeline_code: "AV-2".to_string(),
            status: CardStatus::Pending,
            process_values: PROCESS_COLUMNS
                .iter()
                .map(|process| ProcessValue {
                    process,
                    value: (process.code == "scaffold").then(String::new),
                })
                .collect(),
        };
        write_record(pool, &record).await.unwrap();
    }

    #[tokio::test]
    async fn test_flat_listing_sorts_numeric_card_numbers_first() {
        let pool = memory_pool().await;
        seed(&pool).await;

        let page = list_flat(&pool, &CardFilter::default(), PageRequest::new(1, 10).unwrap())
            .await
            .unwrap();
        let codes: Vec<&str> = page
            .records
            .iter()
            .map(|r| r["pipelineCode"].as_str().unwrap())
            .collect();

        assert_eq!(page.total, 4);
        assert_eq!(codes, vec!["BV-1", "AV-2", "AV-10", "AV-X"]);
    }

    #[tokio::test]
    async fn test_flat_listing_keeps_empty_string_and_null() {
        let pool = memory_pool().await;
        seed(&pool).await;

        let filter = CardFilter {
            pipeline_code: Some("AV-".to_string()),
            status: None,
        };
        let page = list_flat(&pool, &filter, PageRequest::new(1, 10).unwrap())
            .await
            .unwrap();

        let av2 = page
            .records
            .iter()
            .find(|r| r["pipelineCode"] == "AV-2")
            .unwrap();
        assert_eq!(av2["scaffold"], Value::String(String::new()));
        assert_eq!(av2["grinding"], Value::Null);

        let avx = page.records.iter().find(|r| r["pipelineCode"] == "AV-X").unwrap();
        assert_eq!(avx["remove_insulation"], Value::from("2.5"));
        assert_eq!(avx["cardNo"], Value::from("x"));
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn test_flat_listing_excludes_header_rows() {
        let pool = memory_pool().await;
        sqlx::query("INSERT INTO pipeline_card (card_no, pipeline_code) VALUES (?, ?)")
            .bind(SEQUENCE_LABEL_HEADER)
            .bind("AV-H")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO pipeline_card (card_no, pipeline_code) VALUES (NULL, ?)")
            .bind("AV-N")
            .execute(&pool)
            .await
            .unwrap();

        let page = list_flat(&pool, &CardFilter::default(), PageRequest::new(1, 10).unwrap())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.records[0]["pipelineCode"], "AV-N");
    }

    #[tokio::test]
    async fn test_list_page_attaches_processes() {
        let pool = memory_pool().await;
        seed(&pool).await;

        let filter = CardFilter {
            pipeline_code: None,
            status: Some("pending".to_string()),
        };
        let page = list_page(&pool, &filter, PageRequest::new(1, 3).unwrap())
            .await
            .unwrap();

        assert_eq!(page.total, 4);
        assert_eq!(page.records.len(), 3);
        assert_eq!(page.records[0].processes.len(), 16);
        assert_eq!(page.records[0].processes[0].process_order, 3);
    }

    #[tokio::test]
    async fn test_delete_cascades_and_reports_missing() {
        let pool = memory_pool().await;
        seed(&pool).await;

        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM pipeline_card ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();

        assert!(delete(&pool, ids[0]).await.unwrap());
        assert!(!delete(&pool, ids[0]).await.unwrap());
        assert!(delete_batch(&pool, &ids[1..3]).await.unwrap());
        assert!(!delete_batch(&pool, &[9999]).await.unwrap());
        assert!(delete_batch(&pool, &[]).await.is_err());

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pipeline_card_process")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 16);
    }
}
