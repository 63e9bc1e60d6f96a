//! `card` subcommands: import, listings, deletes, template

use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::page_envelope;
use crate::cli::{AppContext, PageArgs};
use crate::config::repository::pipeline_cards::{self, CardFilter, PipelineCard};
use crate::error::AdminError;
use crate::import::excel::{TEMPLATE_FILE_NAME, build_template};
use crate::import::{CardStatus, import_workbook};
use crate::paging::Page;
use crate::response::Envelope;

const ALLOWED_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

#[derive(Subcommand, Debug)]
pub enum CardCommands {
    /// Import pipeline cards from a workbook (.xlsx or .xls)
    Import {
        file: PathBuf,
    },
    /// Cards with their process rows, newest first
    List {
        #[arg(long)]
        pipeline_code: Option<String>,
        #[arg(long)]
        status: Option<CardStatus>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// One flat row per card, ordered by card number
    ListFlat {
        #[arg(long)]
        pipeline_code: Option<String>,
        #[arg(long)]
        status: Option<CardStatus>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Delete a card and its process rows
    Delete {
        id: i64,
    },
    /// Delete several cards
    DeleteBatch {
        #[arg(required = true, value_delimiter = ',')]
        ids: Vec<i64>,
    },
    /// Write the import template workbook
    Template {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

pub async fn handle_card_command(ctx: &AppContext, cmd: CardCommands) -> Envelope {
    match cmd {
        CardCommands::Import { file } => match import_file(ctx, &file).await {
            Ok(envelope) => envelope,
            Err(e) => Envelope::from_error("Import failed", &e),
        },
        CardCommands::List {
            pipeline_code,
            status,
            page,
        } => {
            let filter = CardFilter {
                pipeline_code,
                status: status.map(|s| s.as_str().to_string()),
            };
            page_envelope(list_cards(ctx, &filter, page).await, "Query failed")
        }
        CardCommands::ListFlat {
            pipeline_code,
            status,
            page,
        } => {
            let filter = CardFilter {
                pipeline_code,
                status: status.map(|s| s.as_str().to_string()),
            };
            page_envelope(list_flat(ctx, &filter, page).await, "Query failed")
        }
        CardCommands::Delete { id } => match pipeline_cards::delete(&ctx.pool, id).await {
            Ok(deleted) => Envelope::from_affected(deleted, "Deleted", "Delete failed"),
            Err(e) => Envelope::from_error("Delete failed", &e),
        },
        CardCommands::DeleteBatch { ids } => {
            match pipeline_cards::delete_batch(&ctx.pool, &ids).await {
                Ok(deleted) => {
                    Envelope::from_affected(deleted, "Batch delete succeeded", "Batch delete failed")
                }
                Err(e) => Envelope::from_error("Batch delete failed", &e),
            }
        }
        CardCommands::Template { output } => {
            let path = output.unwrap_or_else(|| PathBuf::from(TEMPLATE_FILE_NAME));
            match write_template(&path) {
                Ok(()) => Envelope::message(format!("Template written to {}", path.display())),
                Err(e) => Envelope::from_error("Template generation failed", &e),
            }
        }
    }
}

/// Reject uploads that are not workbooks, empty, or too large
pub fn check_upload(path: &Path, size: u64, max_bytes: u64) -> Result<(), AdminError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AdminError::Validation(
            "Only Excel files (.xlsx, .xls) can be imported".to_string(),
        ));
    }
    if size == 0 {
        return Err(AdminError::Validation("Please choose a non-empty file".to_string()));
    }
    if size > max_bytes {
        return Err(AdminError::Validation(format!(
            "File is {} bytes, the limit is {} bytes",
            size, max_bytes
        )));
    }
    Ok(())
}

async fn import_file(ctx: &AppContext, path: &Path) -> Result<Envelope> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    check_upload(path, metadata.len(), ctx.config.import.max_file_bytes)?;

    let bytes = fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    log::info!("Importing {} ({} bytes)", path.display(), bytes.len());

    let summary = import_workbook(&ctx.pool, &bytes).await?;
    let mut envelope = Envelope::ok(&summary);
    envelope.msg = summary.message();
    Ok(envelope)
}

async fn list_cards(ctx: &AppContext, filter: &CardFilter, page: PageArgs) -> Result<Page<PipelineCard>> {
    pipeline_cards::list_page(&ctx.pool, filter, page.request()?).await
}

async fn list_flat(
    ctx: &AppContext,
    filter: &CardFilter,
    page: PageArgs,
) -> Result<Page<Map<String, Value>>> {
    pipeline_cards::list_flat(&ctx.pool, filter, page.request()?).await
}

fn write_template(path: &Path) -> Result<()> {
    let bytes = build_template()?;
    fs::write(path, bytes).with_context(|| format!("Failed to write template: {}", path.display()))
}
