//! Command handlers. Each returns an envelope; errors never escape.

pub mod card;
pub mod process;
pub mod results;
pub mod rule;
pub mod schedule;
pub mod workstation;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;

use super::JsonInput;
use crate::paging::Page;
use crate::response::Envelope;

/// Parse the JSON payload of a command from `--data` or `--file`
pub fn read_json_input<T: DeserializeOwned>(input: &JsonInput) -> Result<T> {
    let text = match (&input.data, &input.file) {
        (Some(_), Some(_)) => anyhow::bail!("Cannot specify both --data and --file"),
        (Some(data), None) => data.clone(),
        (None, Some(path)) => {
            if !path.exists() {
                anyhow::bail!("Input file does not exist: {}", path.display());
            }
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file: {}", path.display()))?
        }
        (None, None) => anyhow::bail!("Either provide --data or use --file to specify a JSON file"),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        anyhow::bail!("JSON input is empty");
    }
    serde_json::from_str(trimmed).context("Invalid JSON input")
}

/// Envelope for a page of rows, with `total` lifted to the top level
pub fn page_envelope<T: Serialize>(result: Result<Page<T>>, failure: &str) -> Envelope {
    match result {
        Ok(page) => {
            let total = page.total;
            Envelope::ok_with_total(page, total)
        }
        Err(e) => Envelope::from_error(failure, &e),
    }
}
