//! Client for the external scheduling (optimization) service

pub mod client;
pub mod models;

pub use client::{SchedulerClient, SchedulingApi};
pub use models::{PARAM_COUNT, SchedulingRequest, SchedulingResponse};
