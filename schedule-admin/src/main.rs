mod api;
mod cli;
mod config;
mod dynamic;
mod error;
mod import;
mod paging;
mod response;
mod results;
mod services;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;

use cli::{AppContext, Cli};
use config::Config;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the command succeeded
async fn run(cli: Cli) -> Result<bool> {
    let config = Config::load(cli.config.as_deref())?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    let pool = config::repository::migrations::connect(&config.database).await?;
    let ctx = AppContext { pool, config };

    let envelope = cli::dispatch(&ctx, cli.command).await;
    let output = serde_json::to_string_pretty(&envelope).context("Failed to serialize response")?;
    println!("{}", output);

    if envelope.is_success() {
        eprintln!("{} {}", "ok".green().bold(), envelope.msg);
    } else {
        eprintln!("{} {}", "failed".red().bold(), envelope.msg.dimmed());
    }

    ctx.pool.close().await;
    Ok(envelope.is_success())
}
