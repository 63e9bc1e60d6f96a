//! Discover and provision workstation tables

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::config::repository::registry;

use super::router::{self, TABLE_PREFIX, WorkstationTable};

/// Comment suffixes dropped from display names, longest first
const COMMENT_SUFFIXES: [&str; 7] = [
    "process info table",
    "process table",
    "info table",
    "工序信息表",
    "table",
    "工序表",
    "信息表",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkstationInfo {
    /// `workstation_<N>`
    pub id: String,
    pub name: String,
    pub table_name: String,
}

/// Human-readable name from a table comment, `Workstation <N>` when there is none
pub fn display_name(comment: Option<&str>, number: u64) -> String {
    let fallback = || format!("Workstation {}", number);

    let Some(comment) = comment.map(str::trim).filter(|c| !c.is_empty()) else {
        return fallback();
    };

    let stripped = COMMENT_SUFFIXES
        .iter()
        .find_map(|suffix| comment.strip_suffix(*suffix))
        .unwrap_or(comment)
        .trim();

    if stripped.is_empty() {
        fallback()
    } else {
        stripped.to_string()
    }
}

/// Existing workstation tables in numeric order. Names that do not pass the
/// router check are ignored.
pub async fn list_workstations(pool: &SqlitePool) -> Result<Vec<WorkstationInfo>> {
    let tables = registry::tables_with_prefix(pool, TABLE_PREFIX).await?;

    let mut found: Vec<(WorkstationTable, Option<String>)> = tables
        .into_iter()
        .filter_map(|t| match WorkstationTable::from_table_name(&t.table_name) {
            Ok(table) => Some((table, t.comment)),
            Err(e) => {
                log::debug!("Ignoring table {}: {}", t.table_name, e);
                None
            }
        })
        .collect();
    found.sort_by_key(|(table, _)| table.number());

    Ok(found
        .into_iter()
        .map(|(table, comment)| info(&table, comment.as_deref()))
        .collect())
}

fn info(table: &WorkstationTable, comment: Option<&str>) -> WorkstationInfo {
    WorkstationInfo {
        id: table.workstation_id().to_string(),
        name: display_name(comment, table.number()),
        table_name: table.table_name().to_string(),
    }
}

/// One workstation by id; `None` when its table does not exist
pub async fn find_workstation(pool: &SqlitePool, workstation_id: &str) -> Result<Option<WorkstationInfo>> {
    let table = router::resolve(workstation_id)?;
    if !registry::table_exists(pool, table.table_name()).await? {
        return Ok(None);
    }
    let comment = registry::table_comment(pool, table.table_name()).await?;
    Ok(Some(info(&table, comment.as_deref())))
}

/// Create the table of a workstation if missing and record its display name
pub async fn create_workstation_table(
    pool: &SqlitePool,
    workstation_id: &str,
    name: &str,
) -> Result<WorkstationTable> {
    let table = router::resolve(workstation_id)?;

    let ddl = format!(
        r#"CREATE TABLE IF NOT EXISTS {} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            process_name TEXT NOT NULL,
            process_order INTEGER,
            team_name TEXT,
            is_dedicated INTEGER,
            team_size INTEGER,
            duration REAL,
            is_parallel INTEGER,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT
        )"#,
        table.table_name()
    );
    sqlx::query(&ddl)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to create {}", table))?;

    let name = name.trim();
    let comment = if name.is_empty() {
        format!("Workstation {} process info table", table.number())
    } else {
        format!("{} process info table", name)
    };
    registry::register_table(pool, table.table_name(), &comment).await?;

    log::info!("Workstation table {} ready ({})", table, comment);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::repository::migrations::memory_pool;

    #[test]
    fn test_display_name_strips_suffixes() {
        assert_eq!(display_name(Some("Furnace area process info table"), 1), "Furnace area");
        assert_eq!(display_name(Some("Boiler process table"), 1), "Boiler");
        assert_eq!(display_name(Some("Yard info table"), 1), "Yard");
        assert_eq!(display_name(Some("Dock table"), 1), "Dock");
        assert_eq!(display_name(Some("工作点1工序信息表"), 1), "工作点1");
        assert_eq!(display_name(Some("  Pump house  "), 1), "Pump house");
    }

    #[test]
    fn test_display_name_falls_back() {
        assert_eq!(display_name(None, 4), "Workstation 4");
        assert_eq!(display_name(Some("   "), 4), "Workstation 4");
        assert_eq!(display_name(Some("工序信息表"), 5), "Workstation 5");
        assert_eq!(display_name(Some("process info table"), 6), "Workstation 6");
    }

    #[tokio::test]
    async fn test_lists_created_workstations_numerically() {
        let pool = memory_pool().await;
        create_workstation_table(&pool, "workstation_10", "Tank farm").await.unwrap();
        create_workstation_table(&pool, "workstation_2", "").await.unwrap();
        sqlx::query("CREATE TABLE process_workstation_legacy (id INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("CREATE TABLE process_workstation_3 (id INTEGER)")
            .execute(&pool)
            .await
            .unwrap();

        let workstations = list_workstations(&pool).await.unwrap();
        let ids: Vec<&str> = workstations.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["workstation_2", "workstation_3", "workstation_10"]);

        assert_eq!(workstations[0].name, "Workstation 2");
        assert_eq!(workstations[1].name, "Workstation 3");
        assert_eq!(workstations[2].name, "Tank farm");
        assert_eq!(workstations[2].table_name, "process_workstation_10");
    }

    #[tokio::test]
    async fn test_create_is_idempotent_and_validated() {
        let pool = memory_pool().await;
        create_workstation_table(&pool, "workstation_1", "A").await.unwrap();
        create_workstation_table(&pool, "workstation_1", "B").await.unwrap();

        let workstations = list_workstations(&pool).await.unwrap();
        assert_eq!(workstations.len(), 1);
        assert_eq!(workstations[0].name, "B");

        assert!(create_workstation_table(&pool, "workstation_x", "C").await.is_err());
    }

    #[tokio::test]
    async fn test_find_workstation() {
        let pool = memory_pool().await;
        create_workstation_table(&pool, "workstation_4", "Boiler house").await.unwrap();

        let found = find_workstation(&pool, "workstation_4").await.unwrap().unwrap();
        assert_eq!(found.name, "Boiler house");
        assert_eq!(found.table_name, "process_workstation_4");

        assert_eq!(find_workstation(&pool, "workstation_5").await.unwrap(), None);
        assert!(find_workstation(&pool, "../etc").await.is_err());
    }
}
