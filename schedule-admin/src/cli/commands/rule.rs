use anyhow::Result;
use clap::Subcommand;

use super::read_json_input;
use crate::cli::{AppContext, JsonInput};
use crate::config::repository::process_rules::{self, ProcessRuleInput};
use crate::response::Envelope;

#[derive(Subcommand, Debug)]
pub enum RuleCommands {
    /// Every rule by stage
    List,
    /// One rule by process code
    Get {
        code: String,
    },
    /// Update one rule; `id` is required in the body
    Update {
        #[command(flatten)]
        input: JsonInput,
    },
    /// Update a JSON array of rules atomically
    BatchUpdate {
        #[command(flatten)]
        input: JsonInput,
    },
}

pub async fn handle_rule_command(ctx: &AppContext, cmd: RuleCommands) -> Envelope {
    match cmd {
        RuleCommands::List => match process_rules::list(&ctx.pool).await {
            Ok(rules) => {
                let total = rules.len() as i64;
                Envelope::ok_with_total(rules, total)
            }
            Err(e) => Envelope::from_error("Query failed", &e),
        },
        RuleCommands::Get { code } => match process_rules::get_by_code(&ctx.pool, &code).await {
            Ok(Some(rule)) => Envelope::ok(rule),
            Ok(None) => Envelope::fail("Process rule not found"),
            Err(e) => Envelope::from_error("Query failed", &e),
        },
        RuleCommands::Update { input } => match update(ctx, &input).await {
            Ok(updated) => Envelope::from_affected(updated, "Updated", "Update failed"),
            Err(e) => Envelope::from_error("Update failed", &e),
        },
        RuleCommands::BatchUpdate { input } => match batch_update(ctx, &input).await {
            Ok(updated) => {
                Envelope::from_affected(updated, "Batch update succeeded", "Batch update failed")
            }
            Err(e) => Envelope::from_error("Batch update failed", &e),
        },
    }
}

async fn update(ctx: &AppContext, input: &JsonInput) -> Result<bool> {
    let rule: ProcessRuleInput = read_json_input(input)?;
    process_rules::update(&ctx.pool, &rule).await
}

async fn batch_update(ctx: &AppContext, input: &JsonInput) -> Result<bool> {
    let rules: Vec<ProcessRuleInput> = read_json_input(input)?;
    process_rules::batch_update(&ctx.pool, &rules).await
}
