use anyhow::Result;
use clap::Subcommand;

use super::{page_envelope, read_json_input};
use crate::cli::{AppContext, JsonInput, PageArgs};
use crate::dynamic::{self, ProcessConfigInput, ProcessConfigRow, ProcessFilter, executor};
use crate::error::AdminError;
use crate::paging::Page;
use crate::response::Envelope;

#[derive(Subcommand, Debug)]
pub enum WorkstationCommands {
    /// Workstations discovered from the schema
    List,
    /// One workstation and its display name
    Show {
        id: String,
    },
    /// Create the process table of a workstation
    Create {
        /// Workstation id, e.g. workstation_3
        id: String,
        /// Display name stored as the table comment
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Page through the processes of a workstation
    Processes {
        id: String,
        #[arg(long)]
        process_name: Option<String>,
        #[arg(long)]
        process_order: Option<i64>,
        #[arg(long)]
        dedicated: Option<bool>,
        #[arg(long)]
        parallel: Option<bool>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Every process of a workstation
    ListAll {
        id: String,
    },
    /// Add a process to a workstation
    Save {
        id: String,
        #[command(flatten)]
        input: JsonInput,
    },
    /// Overwrite a process row; the row id comes from the body or --row-id
    Update {
        id: String,
        #[arg(long)]
        row_id: Option<i64>,
        #[command(flatten)]
        input: JsonInput,
    },
    /// Delete a process row
    Delete {
        id: String,
        row_id: i64,
    },
}

pub async fn handle_workstation_command(ctx: &AppContext, cmd: WorkstationCommands) -> Envelope {
    match cmd {
        WorkstationCommands::List => match dynamic::list_workstations(&ctx.pool).await {
            Ok(workstations) => {
                let total = workstations.len() as i64;
                Envelope::ok_with_total(workstations, total)
            }
            Err(e) => Envelope::from_error("Query failed", &e),
        },
        WorkstationCommands::Show { id } => match dynamic::find_workstation(&ctx.pool, &id).await {
            Ok(Some(info)) => Envelope::ok(info),
            Ok(None) => Envelope::fail(format!("Workstation {} does not exist", id)),
            Err(e) => Envelope::from_error("Query failed", &e),
        },
        WorkstationCommands::Create { id, name } => {
            match dynamic::create_workstation_table(&ctx.pool, &id, &name).await {
                Ok(table) => Envelope::message(format!("Workstation table {} created", table)),
                Err(e) => Envelope::from_error("Create failed", &e),
            }
        }
        WorkstationCommands::Processes {
            id,
            process_name,
            process_order,
            dedicated,
            parallel,
            page,
        } => {
            let filter = ProcessFilter {
                process_name,
                process_order,
                is_dedicated: dedicated,
                is_parallel: parallel,
            };
            page_envelope(list_processes(ctx, &id, &filter, page).await, "Query failed")
        }
        WorkstationCommands::ListAll { id } => {
            match list_all(ctx, &id).await {
                Ok(rows) => {
                    let total = rows.len() as i64;
                    Envelope::ok_with_total(rows, total)
                }
                Err(e) => Envelope::from_error("Query failed", &e),
            }
        }
        WorkstationCommands::Save { id, input } => match save(ctx, &id, &input).await {
            Ok(row_id) => Envelope::ok(serde_json::json!({ "id": row_id })),
            Err(e) => Envelope::from_error("Save failed", &e),
        },
        WorkstationCommands::Update { id, row_id, input } => {
            match update(ctx, &id, row_id, &input).await {
                Ok(updated) => Envelope::from_affected(updated, "Updated", "Update failed"),
                Err(e) => Envelope::from_error("Update failed", &e),
            }
        }
        WorkstationCommands::Delete { id, row_id } => match delete(ctx, &id, row_id).await {
            Ok(deleted) => Envelope::from_affected(deleted, "Deleted", "Delete failed"),
            Err(e) => Envelope::from_error("Delete failed", &e),
        },
    }
}

async fn list_processes(
    ctx: &AppContext,
    id: &str,
    filter: &ProcessFilter,
    page: PageArgs,
) -> Result<Page<ProcessConfigRow>> {
    let table = dynamic::resolve(id)?;
    executor::list(&ctx.pool, &table, filter, page.request()?).await
}

async fn list_all(ctx: &AppContext, id: &str) -> Result<Vec<ProcessConfigRow>> {
    let table = dynamic::resolve(id)?;
    executor::list_all(&ctx.pool, &table).await
}

async fn save(ctx: &AppContext, id: &str, input: &JsonInput) -> Result<i64> {
    let table = dynamic::resolve(id)?;
    let row: ProcessConfigInput = read_json_input(input)?;
    executor::insert(&ctx.pool, &table, &row).await
}

async fn update(ctx: &AppContext, id: &str, row_id: Option<i64>, input: &JsonInput) -> Result<bool> {
    let table = dynamic::resolve(id)?;
    let row: ProcessConfigInput = read_json_input(input)?;
    let row_id = row_id
        .or(row.id)
        .ok_or_else(|| AdminError::Validation("Row id is required".to_string()))?;
    executor::update(&ctx.pool, &table, row_id, &row).await
}

async fn delete(ctx: &AppContext, id: &str, row_id: i64) -> Result<bool> {
    let table = dynamic::resolve(id)?;
    executor::delete(&ctx.pool, &table, row_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::config::repository::migrations::memory_pool;

    async fn context() -> AppContext {
        AppContext {
            pool: memory_pool().await,
            config: Config::default(),
        }
    }

    fn inline(json: &str) -> JsonInput {
        JsonInput {
            data: Some(json.to_string()),
            file: None,
        }
    }

    #[tokio::test]
    async fn test_create_save_update_delete() {
        let ctx = context().await;

        let created = handle_workstation_command(
            &ctx,
            WorkstationCommands::Create {
                id: "workstation_2".to_string(),
                name: "Furnace area".to_string(),
            },
        )
        .await;
        assert!(created.is_success(), "{}", created.msg);

        let saved = handle_workstation_command(
            &ctx,
            WorkstationCommands::Save {
                id: "workstation_2".to_string(),
                input: inline(r#"{"processName": "Grinding", "processOrder": 3, "isParallel": true}"#),
            },
        )
        .await;
        assert!(saved.is_success(), "{}", saved.msg);
        let row_id = saved.data["id"].as_i64().unwrap();

        let updated = handle_workstation_command(
            &ctx,
            WorkstationCommands::Update {
                id: "workstation_2".to_string(),
                row_id: None,
                input: inline(&format!(r#"{{"id": {}, "processName": "Polishing"}}"#, row_id)),
            },
        )
        .await;
        assert_eq!(updated.msg, "Updated");

        let listed = handle_workstation_command(
            &ctx,
            WorkstationCommands::ListAll {
                id: "workstation_2".to_string(),
            },
        )
        .await;
        assert_eq!(listed.total, Some(1));
        assert_eq!(listed.data[0]["processName"], "Polishing");
        assert_eq!(listed.data[0]["workstationId"], "workstation_2");

        let deleted = handle_workstation_command(
            &ctx,
            WorkstationCommands::Delete {
                id: "workstation_2".to_string(),
                row_id,
            },
        )
        .await;
        assert_eq!(deleted.msg, "Deleted");
    }

    #[tokio::test]
    async fn test_invalid_id_is_rejected() {
        let ctx = context().await;
        let envelope = handle_workstation_command(
            &ctx,
            WorkstationCommands::ListAll {
                id: "workstation_1; DROP TABLE process".to_string(),
            },
        )
        .await;
        assert!(!envelope.is_success());
        assert!(envelope.msg.contains("Invalid workstation id"));
    }

    #[tokio::test]
    async fn test_update_requires_row_id() {
        let ctx = context().await;
        dynamic::create_workstation_table(&ctx.pool, "workstation_1", "").await.unwrap();

        let envelope = handle_workstation_command(
            &ctx,
            WorkstationCommands::Update {
                id: "workstation_1".to_string(),
                row_id: None,
                input: inline(r#"{"processName": "Grinding"}"#),
            },
        )
        .await;
        assert!(envelope.msg.contains("Row id is required"));
    }
}
