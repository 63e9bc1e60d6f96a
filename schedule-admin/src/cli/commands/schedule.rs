use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Subcommand;

use crate::api::{SchedulerClient, SchedulingApi};
use crate::cli::AppContext;
use crate::response::Envelope;
use crate::services::scheduling::{self, RunOutcome};

#[derive(Subcommand, Debug)]
pub enum ScheduleCommands {
    /// Call the scheduling service and store the result for the day
    Run {
        /// Comma separated durations; defaults to the process catalogue
        #[arg(long, value_delimiter = ',')]
        params: Option<Vec<f64>>,
        /// Schedule date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Durations that would be sent to the scheduler
    Params,
    /// Stored schedules of the last N days
    History {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
}

pub async fn handle_schedule_command(ctx: &AppContext, cmd: ScheduleCommands) -> Envelope {
    match cmd {
        ScheduleCommands::Run { params, date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let outcome = match SchedulerClient::new(&ctx.config.scheduler) {
                Ok(client) => run(ctx, &client, params, date).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(outcome) => Envelope::ok(outcome),
                Err(e) => Envelope::from_error("Scheduling failed", &e),
            }
        }
        ScheduleCommands::Params => match scheduling::scheduling_params(&ctx.pool).await {
            Ok(params) => Envelope::ok(params),
            Err(e) => Envelope::from_error("Query failed", &e),
        },
        ScheduleCommands::History { days } => {
            let today = Local::now().date_naive();
            match scheduling::history(&ctx.pool, days, today).await {
                Ok(records) => {
                    let total = records.len() as i64;
                    Envelope::ok_with_total(records, total)
                }
                Err(e) => Envelope::from_error("Query failed", &e),
            }
        }
    }
}

async fn run(
    ctx: &AppContext,
    api: &dyn SchedulingApi,
    params: Option<Vec<f64>>,
    date: NaiveDate,
) -> Result<RunOutcome> {
    scheduling::run(&ctx.pool, api, params, date).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::config::repository::migrations::memory_pool;

    #[tokio::test]
    async fn test_params_has_one_value_per_process() {
        let ctx = AppContext {
            pool: memory_pool().await,
            config: Config::default(),
        };
        let envelope = handle_schedule_command(&ctx, ScheduleCommands::Params).await;
        assert!(envelope.is_success());
        assert_eq!(envelope.data.as_array().unwrap().len(), 15);
    }

    #[tokio::test]
    async fn test_history_rejects_zero_days() {
        let ctx = AppContext {
            pool: memory_pool().await,
            config: Config::default(),
        };
        let envelope = handle_schedule_command(&ctx, ScheduleCommands::History { days: 0 }).await;
        assert!(!envelope.is_success());
        assert!(envelope.msg.contains("Days must be at least 1"));
    }

    #[tokio::test]
    async fn test_run_with_wrong_param_count_fails_before_calling_out() {
        let ctx = AppContext {
            pool: memory_pool().await,
            config: Config::default(),
        };
        let envelope = handle_schedule_command(
            &ctx,
            ScheduleCommands::Run {
                params: Some(vec![1.0, 2.0]),
                date: None,
            },
        )
        .await;
        assert!(envelope.msg.contains("Expected 15 scheduling params"));
    }
}
