//! Wire types of the external scheduling service

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of process durations the scheduler expects
pub const PARAM_COUNT: usize = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingRequest {
    /// Durations in the scheduler's fixed process order
    pub params: Vec<f64>,
    /// `YYYY-MM-DD`
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulingResponse {
    pub status: Option<String>,
    pub date: Option<String>,
    pub model_version: Option<String>,
    pub experiment_group: Option<String>,
    pub results: Option<SchedulingMetrics>,
    /// Task list, kept as raw JSON
    pub schedule_details: Option<Value>,
    /// Base64-encoded chart image
    pub gantt_chart: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulingMetrics {
    pub makespan: Option<f64>,
    pub resource_utilization: Option<f64>,
    pub total_workers: Option<i64>,
    pub execution_time: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_parses_partial_payload() {
        let payload = json!({
            "status": "success",
            "modelVersion": "ddqn-v3",
            "experimentGroup": "B",
            "results": {"makespan": 455.5, "resourceUtilization": 0.82, "totalWorkers": 14},
            "scheduleDetails": [{"task": 1}],
            "unknownField": true
        });

        let response: SchedulingResponse = serde_json::from_value(payload).unwrap();
        assert_eq!(response.model_version.as_deref(), Some("ddqn-v3"));
        let metrics = response.results.unwrap();
        assert_eq!(metrics.total_workers, Some(14));
        assert_eq!(metrics.execution_time, None);
        assert!(response.gantt_chart.is_none());
    }

    #[test]
    fn test_request_shape() {
        let request = SchedulingRequest {
            params: vec![10.0; PARAM_COUNT],
            date: "2025-01-16".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["params"].as_array().unwrap().len(), 15);
        assert_eq!(value["date"], "2025-01-16");
    }
}
