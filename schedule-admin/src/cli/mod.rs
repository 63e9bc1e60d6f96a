//! Command-line surface
//!
//! Every command answers with a JSON envelope on stdout.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use sqlx::SqlitePool;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::AdminError;
use crate::paging::PageRequest;
use crate::response::Envelope;

#[derive(Parser, Debug)]
#[command(
    name = "schedule-admin",
    version,
    about = "Administration backend for inspection scheduling"
)]
pub struct Cli {
    /// Config file (defaults to <config dir>/schedule-admin/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colored status output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pipeline cards imported from spreadsheets
    #[command(subcommand)]
    Card(commands::card::CardCommands),

    /// Per-workstation process tables
    #[command(subcommand)]
    Workstation(commands::workstation::WorkstationCommands),

    /// Inspection process catalogue
    #[command(subcommand)]
    Process(commands::process::ProcessCommands),

    /// Process rule configuration
    #[command(subcommand)]
    Rule(commands::rule::RuleCommands),

    /// Historical schedule result tables
    #[command(subcommand)]
    Results(commands::results::ResultsCommands),

    /// External scheduling service
    #[command(subcommand)]
    Schedule(commands::schedule::ScheduleCommands),
}

/// Page selection shared by the listing commands
#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// 1-based page number
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub page: i64,

    /// Rows per page
    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    pub size: i64,
}

impl PageArgs {
    pub fn request(&self) -> Result<PageRequest, AdminError> {
        PageRequest::new(self.page, self.size)
    }
}

/// JSON payload given inline or as a file
#[derive(Args, Debug, Clone)]
pub struct JsonInput {
    /// Inline JSON
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,

    /// Path to a JSON file
    #[arg(long)]
    pub file: Option<PathBuf>,
}

/// Shared state handed to every command
pub struct AppContext {
    pub pool: SqlitePool,
    pub config: Config,
}

pub async fn dispatch(ctx: &AppContext, command: Commands) -> Envelope {
    match command {
        Commands::Card(cmd) => commands::card::handle_card_command(ctx, cmd).await,
        Commands::Workstation(cmd) => {
            commands::workstation::handle_workstation_command(ctx, cmd).await
        }
        Commands::Process(cmd) => commands::process::handle_process_command(ctx, cmd).await,
        Commands::Rule(cmd) => commands::rule::handle_rule_command(ctx, cmd).await,
        Commands::Results(cmd) => commands::results::handle_results_command(ctx, cmd).await,
        Commands::Schedule(cmd) => commands::schedule::handle_schedule_command(ctx, cmd).await,
    }
}
