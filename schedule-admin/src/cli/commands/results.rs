use clap::Subcommand;

use crate::cli::AppContext;
use crate::response::Envelope;
use crate::results;

#[derive(Subcommand, Debug)]
pub enum ResultsCommands {
    /// Schedule result tables, newest first
    List {
        /// Maximum number of tables (defaults to the configured limit)
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,
    },
    /// Tasks of one result table
    Read {
        table: String,
    },
}

pub async fn handle_results_command(ctx: &AppContext, cmd: ResultsCommands) -> Envelope {
    match cmd {
        ResultsCommands::List { limit } => {
            let limit = limit.unwrap_or(ctx.config.results.default_limit);
            match results::list_result_tables(&ctx.pool, limit).await {
                Ok(tables) => {
                    let total = tables.len() as i64;
                    Envelope::ok_with_total(tables, total)
                }
                Err(e) => Envelope::from_error("Failed to list schedule results", &e),
            }
        }
        ResultsCommands::Read { table } => {
            match results::read_result_table(&ctx.pool, &table).await {
                Ok(tasks) => {
                    let total = tasks.len() as i64;
                    Envelope::ok_with_total(tasks, total)
                }
                Err(e) => Envelope::from_error("Failed to read schedule result", &e),
            }
        }
    }
}
