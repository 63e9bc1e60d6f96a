//! Daily scheduling: gather durations, call the scheduler, persist the summary

use anyhow::Result;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::api::{PARAM_COUNT, SchedulingApi, SchedulingRequest, SchedulingResponse};
use crate::config::repository::processes;
use crate::config::repository::schedule_records::{self, NewScheduleRecord, ScheduleRecord};
use crate::error::AdminError;

/// Process names in the order the scheduler reads its parameters
pub const SCHEDULER_ORDER: [&str; PARAM_COUNT] = [
    "Scaffolding",
    "Insulation removal",
    "Grinding",
    "Macro inspection",
    "Wall thickness measurement",
    "Radiographic testing",
    "Surface testing",
    "Ultrasonic testing",
    "Other NDT",
    "Ferrite testing",
    "Hardness testing",
    "Metallographic examination",
    "Result evaluation",
    "Rework",
    "Qualified report issuance",
];

pub const DEFAULT_DURATION: f64 = 10.0;

/// One duration per scheduler process; processes without a duration get the default
pub async fn scheduling_params(pool: &SqlitePool) -> Result<Vec<f64>> {
    let durations: HashMap<String, Option<i64>> =
        processes::durations_by_name(pool).await?.into_iter().collect();

    let params = SCHEDULER_ORDER
        .iter()
        .map(|name| {
            durations
                .get(*name)
                .copied()
                .flatten()
                .map_or(DEFAULT_DURATION, |minutes| minutes as f64)
        })
        .collect::<Vec<_>>();

    log::info!("Scheduling params: {:?}", params);
    Ok(params)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub record_id: i64,
    pub response: SchedulingResponse,
}

fn details_text(details: Option<Value>) -> Option<String> {
    match details? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn to_record(date: NaiveDate, response: &SchedulingResponse) -> NewScheduleRecord {
    let metrics = response.results.clone().unwrap_or_default();
    NewScheduleRecord {
        schedule_date: date,
        model_version: response.model_version.clone(),
        experiment_group: response.experiment_group.clone(),
        makespan: metrics.makespan,
        resource_utilization: metrics.resource_utilization,
        total_workers: metrics.total_workers,
        execution_time: metrics.execution_time,
        schedule_details: details_text(response.schedule_details.clone()),
        gantt_chart: response.gantt_chart.clone(),
        status: response.status.clone(),
        error: response.error.clone(),
    }
}

/// Run the scheduler for `date`. Without explicit params the current process
/// durations are used. The response is stored as that date's record.
pub async fn run(
    pool: &SqlitePool,
    api: &dyn SchedulingApi,
    params: Option<Vec<f64>>,
    date: NaiveDate,
) -> Result<RunOutcome> {
    let params = match params {
        Some(params) => params,
        None => scheduling_params(pool).await?,
    };
    if params.len() != PARAM_COUNT {
        return Err(AdminError::Validation(format!(
            "Expected {} scheduling params, got {}",
            PARAM_COUNT,
            params.len()
        ))
        .into());
    }

    let request = SchedulingRequest {
        params,
        date: date.format("%Y-%m-%d").to_string(),
    };
    let response = api.run(&request).await?;

    if let Some(error) = response.error.as_deref().filter(|e| !e.is_empty()) {
        log::warn!("Scheduler reported an error for {}: {}", request.date, error);
    }

    let record_id = schedule_records::upsert(pool, &to_record(date, &response)).await?;
    log::info!(
        "Schedule for {} saved as record {} (status {})",
        request.date,
        record_id,
        response.status.as_deref().unwrap_or("unknown")
    );

    Ok(RunOutcome {
        record_id,
        response,
    })
}

/// Records of the last `days` days including `today`, newest first
pub async fn history(pool: &SqlitePool, days: u32, today: NaiveDate) -> Result<Vec<ScheduleRecord>> {
    if days == 0 {
        return Err(AdminError::Validation("Days must be at least 1".to_string()).into());
    }
    let since = today
        .checked_sub_days(Days::new(u64::from(days) - 1))
        .unwrap_or(NaiveDate::MIN);
    schedule_records::history_since(pool, since).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::SchedulingMetrics;
    use crate::config::repository::migrations::memory_pool;
    use crate::config::repository::processes::{ProcessInput, save};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockScheduler {
        requests: Mutex<Vec<SchedulingRequest>>,
        fail: bool,
    }

    impl MockScheduler {
        fn new(fail: bool) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl SchedulingApi for MockScheduler {
        async fn run(&self, request: &SchedulingRequest) -> Result<SchedulingResponse> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                anyhow::bail!("Scheduling service returned 500 Internal Server Error");
            }
            Ok(SchedulingResponse {
                status: Some("success".to_string()),
                model_version: Some("ddqn-v3".to_string()),
                experiment_group: Some("A".to_string()),
                results: Some(SchedulingMetrics {
                    makespan: Some(455.5),
                    resource_utilization: Some(0.8),
                    total_workers: Some(14),
                    execution_time: Some(2.1),
                }),
                schedule_details: Some(serde_json::json!([{"task": 1}])),
                ..Default::default()
            })
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_params_use_durations_and_default() {
        let pool = memory_pool().await;
        for (name, minutes) in [("Grinding", 30), ("Rework", 90)] {
            let input = ProcessInput {
                process_name: Some(name.to_string()),
                duration: Some(minutes),
                ..Default::default()
            };
            save(&pool, &input).await.unwrap();
        }

        let params = scheduling_params(&pool).await.unwrap();
        assert_eq!(params.len(), 15);
        assert_eq!(params[0], DEFAULT_DURATION);
        assert_eq!(params[2], 30.0);
        assert_eq!(params[13], 90.0);
    }

    #[tokio::test]
    async fn test_run_persists_record() {
        let pool = memory_pool().await;
        let api = MockScheduler::new(false);

        let outcome = run(&pool, &api, None, day(16)).await.unwrap();
        assert_eq!(outcome.response.status.as_deref(), Some("success"));

        let sent = api.requests.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].date, "2025-01-16");
        assert_eq!(sent[0].params, vec![DEFAULT_DURATION; 15]);

        let records = history(&pool, 7, day(16)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, outcome.record_id);
        assert_eq!(records[0].makespan, Some(455.5));
        assert_eq!(records[0].schedule_details.as_deref(), Some(r#"[{"task":1}]"#));
    }

    #[tokio::test]
    async fn test_run_rejects_wrong_param_count() {
        let pool = memory_pool().await;
        let api = MockScheduler::new(false);

        let error = run(&pool, &api, Some(vec![1.0; 3]), day(16)).await.unwrap_err();
        assert!(error.to_string().contains("Expected 15"));
        assert!(api.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_call_writes_nothing() {
        let pool = memory_pool().await;
        let api = MockScheduler::new(true);

        assert!(run(&pool, &api, None, day(16)).await.is_err());
        assert!(history(&pool, 30, day(16)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_window() {
        let pool = memory_pool().await;
        let api = MockScheduler::new(false);
        for d in [1, 10, 15, 16] {
            run(&pool, &api, None, day(d)).await.unwrap();
        }

        let dates: Vec<String> = history(&pool, 7, day(16))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.schedule_date)
            .collect();
        assert_eq!(dates, vec!["2025-01-16", "2025-01-15", "2025-01-10"]);
        assert!(history(&pool, 0, day(16)).await.is_err());
    }
}
