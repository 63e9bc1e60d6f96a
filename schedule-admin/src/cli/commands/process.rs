use anyhow::Result;
use clap::Subcommand;

use super::{page_envelope, read_json_input};
use crate::cli::{AppContext, JsonInput, PageArgs};
use crate::config::repository::processes::{self, Process, ProcessInput};
use crate::paging::Page;
use crate::response::Envelope;

#[derive(Subcommand, Debug)]
pub enum ProcessCommands {
    /// Every process
    List,
    /// Processes with exactly this name
    Find {
        name: String,
    },
    /// Add a process
    Save {
        #[command(flatten)]
        input: JsonInput,
    },
    /// Update the fields present in the body; `id` is required
    Update {
        #[command(flatten)]
        input: JsonInput,
    },
    Delete {
        id: i64,
    },
    /// Page through processes, optionally by name substring
    Page {
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
}

pub async fn handle_process_command(ctx: &AppContext, cmd: ProcessCommands) -> Envelope {
    match cmd {
        ProcessCommands::List => match processes::list(&ctx.pool).await {
            Ok(list) => {
                let total = list.len() as i64;
                Envelope::ok_with_total(list, total)
            }
            Err(e) => Envelope::from_error("Query failed", &e),
        },
        ProcessCommands::Find { name } => match processes::find_by_name(&ctx.pool, &name).await {
            Ok(found) => Envelope::ok(found),
            Err(e) => Envelope::from_error("Query failed", &e),
        },
        ProcessCommands::Save { input } => match save(ctx, &input).await {
            Ok(id) => Envelope::ok(serde_json::json!({ "id": id })),
            Err(e) => Envelope::from_error("Save failed", &e),
        },
        ProcessCommands::Update { input } => match update(ctx, &input).await {
            Ok(updated) => Envelope::from_affected(updated, "Updated", "Update failed"),
            Err(e) => Envelope::from_error("Update failed", &e),
        },
        ProcessCommands::Delete { id } => match processes::delete(&ctx.pool, id).await {
            Ok(deleted) => Envelope::from_affected(deleted, "Deleted", "Delete failed"),
            Err(e) => Envelope::from_error("Delete failed", &e),
        },
        ProcessCommands::Page { name, page } => {
            page_envelope(page_processes(ctx, name.as_deref(), page).await, "Query failed")
        }
    }
}

async fn save(ctx: &AppContext, input: &JsonInput) -> Result<i64> {
    let process: ProcessInput = read_json_input(input)?;
    processes::save(&ctx.pool, &process).await
}

async fn update(ctx: &AppContext, input: &JsonInput) -> Result<bool> {
    let process: ProcessInput = read_json_input(input)?;
    processes::update(&ctx.pool, &process).await
}

async fn page_processes(ctx: &AppContext, name: Option<&str>, page: PageArgs) -> Result<Page<Process>> {
    processes::page(&ctx.pool, name, page.request()?).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::config::repository::migrations::memory_pool;

    fn inline(json: &str) -> JsonInput {
        JsonInput {
            data: Some(json.to_string()),
            file: None,
        }
    }

    #[tokio::test]
    async fn test_save_find_and_page() {
        let ctx = AppContext {
            pool: memory_pool().await,
            config: Config::default(),
        };

        for json in [
            r#"{"processName": "Grinding", "duration": 30}"#,
            r#"{"processName": "Surface testing", "duration": 45}"#,
        ] {
            let saved = handle_process_command(&ctx, ProcessCommands::Save { input: inline(json) }).await;
            assert!(saved.is_success(), "{}", saved.msg);
        }

        let found = handle_process_command(
            &ctx,
            ProcessCommands::Find {
                name: "Grinding".to_string(),
            },
        )
        .await;
        assert_eq!(found.data[0]["duration"], 30);

        let paged = handle_process_command(
            &ctx,
            ProcessCommands::Page {
                name: Some("testing".to_string()),
                page: PageArgs { page: 1, size: 10 },
            },
        )
        .await;
        assert_eq!(paged.total, Some(1));
        assert_eq!(paged.data["records"][0]["processName"], "Surface testing");
    }

    #[tokio::test]
    async fn test_save_without_name_fails() {
        let ctx = AppContext {
            pool: memory_pool().await,
            config: Config::default(),
        };
        let envelope = handle_process_command(
            &ctx,
            ProcessCommands::Save {
                input: inline(r#"{"duration": 5}"#),
            },
        )
        .await;
        assert!(!envelope.is_success());
        assert!(envelope.msg.starts_with("Save failed"));
    }
}
