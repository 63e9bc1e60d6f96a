//! HTTP client for the external scheduling service

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::SchedulerConfig;

use super::models::{SchedulingRequest, SchedulingResponse};

const RUN_PATH: &str = "/api/daily-scheduling/run";

/// Seam between the scheduling service and its callers
#[async_trait]
pub trait SchedulingApi: Send + Sync {
    async fn run(&self, request: &SchedulingRequest) -> Result<SchedulingResponse>;
}

pub struct SchedulerClient {
    http: reqwest::Client,
    base_url: String,
}

impl SchedulerClient {
    pub fn new(config: &SchedulerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn run_url(&self) -> String {
        format!("{}{}", self.base_url, RUN_PATH)
    }
}

#[async_trait]
impl SchedulingApi for SchedulerClient {
    async fn run(&self, request: &SchedulingRequest) -> Result<SchedulingResponse> {
        let url = self.run_url();
        log::info!("Requesting schedule for {} from {}", request.date, url);

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .with_context(|| format!("Failed to reach scheduling service at {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Scheduling service returned {}: {}", status, body.trim());
        }

        response
            .json::<SchedulingResponse>()
            .await
            .context("Failed to parse scheduling service response")
    }
}
