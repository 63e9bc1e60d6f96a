//! Uniform result envelope returned by every command
//!
//! Failures never escape a command as errors: handlers wrap them here so the
//! caller always receives `{code, msg, total, data}`.

use serde::Serialize;
use serde_json::Value;

pub const CODE_SUCCESS: u16 = 200;
pub const CODE_FAILURE: u16 = 400;

#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub code: u16,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    pub data: Value,
}

impl Envelope {
    pub fn ok(data: impl Serialize) -> Self {
        Self {
            code: CODE_SUCCESS,
            msg: "success".to_string(),
            total: None,
            data: to_value(data),
        }
    }

    pub fn ok_with_total(data: impl Serialize, total: i64) -> Self {
        Self {
            total: Some(total),
            ..Self::ok(data)
        }
    }

    /// Success carrying only a message
    pub fn message(msg: impl Into<String>) -> Self {
        Self {
            code: CODE_SUCCESS,
            msg: msg.into(),
            total: None,
            data: Value::Null,
        }
    }

    pub fn fail(msg: impl Into<String>) -> Self {
        Self {
            code: CODE_FAILURE,
            msg: msg.into(),
            total: None,
            data: Value::Null,
        }
    }

    /// Business outcome of a mutation: `true` maps to success, `false` to a failure message
    pub fn from_affected(affected: bool, success_msg: &str, failure_msg: &str) -> Self {
        if affected {
            Self::message(success_msg)
        } else {
            Self::fail(failure_msg)
        }
    }

    /// Wrap any error as a failure, prefixing the caller's description
    pub fn from_error(prefix: &str, error: &anyhow::Error) -> Self {
        log::error!("{}: {:#}", prefix, error);
        Self::fail(format!("{}: {:#}", prefix, error))
    }

    pub fn is_success(&self) -> bool {
        self.code == CODE_SUCCESS
    }
}

fn to_value(data: impl Serialize) -> Value {
    serde_json::to_value(data).unwrap_or_else(|e| Value::String(format!("<unserializable: {}>", e)))
}
