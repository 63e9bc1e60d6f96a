//! Pipeline-card import: workbook rows to persisted cards
//!
//! File-level problems (unreadable workbook, no sheet, missing header) fail the
//! whole import. Everything else is decided per row: a bad row is recorded in
//! the summary and the batch moves on. Each row commits on its own.

pub mod columns;
pub mod excel;
pub mod writer;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{AdminError, find_admin_error};
use columns::ProcessColumn;
use excel::{SheetRow, read_pipeline_rows};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    Pending,
    Processing,
    Completed,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Pending => "pending",
            CardStatus::Processing => "processing",
            CardStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for CardStatus {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CardStatus::Pending),
            "processing" => Ok(CardStatus::Processing),
            "completed" => Ok(CardStatus::Completed),
            other => Err(AdminError::Validation(format!("Unknown card status: {}", other))),
        }
    }
}

/// Raw value of one configured process column; `None` is "no value"
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessValue {
    pub process: &'static ProcessColumn,
    pub value: Option<String>,
}

/// One spreadsheet row ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRecord {
    pub sequence_label: Option<String>,
    pub pipeline_code: String,
    pub status: CardStatus,
    /// One entry per configured column, in column order
    pub process_values: Vec<ProcessValue>,
}

impl ImportRecord {
    /// Build a record from a sheet row; `None` when the pipeline code is blank
    pub fn from_row(row: &SheetRow) -> Option<Self> {
        let pipeline_code = row
            .pipeline_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())?;

        Some(Self {
            sequence_label: row.sequence_label.clone(),
            pipeline_code: pipeline_code.to_string(),
            status: CardStatus::Pending,
            process_values: row
                .process_values
                .iter()
                .map(|(process, value)| ProcessValue {
                    process: *process,
                    value: value.clone(),
                })
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub success_count: usize,
    pub fail_count: usize,
    pub total_count: usize,
    pub errors: Vec<String>,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        format!(
            "Import finished: {} succeeded, {} failed",
            self.success_count, self.fail_count
        )
    }

    fn fail(&mut self, message: String) {
        log::warn!("{}", message);
        self.fail_count += 1;
        self.errors.push(message);
    }
}

/// Import every data row of the workbook's first sheet
pub async fn import_workbook(pool: &SqlitePool, bytes: &[u8]) -> Result<ImportSummary> {
    let rows = read_pipeline_rows(bytes)?;
    let mut summary = ImportSummary {
        total_count: rows.len(),
        ..Default::default()
    };

    for row in &rows {
        let Some(record) = ImportRecord::from_row(row) else {
            summary.fail(format!("Row {}: empty pipeline code, row skipped", row.row_number));
            continue;
        };

        match writer::write_record(pool, &record).await {
            Ok(card_id) => {
                log::debug!(
                    "Row {}: imported {} as card {}",
                    row.row_number,
                    record.pipeline_code,
                    card_id
                );
                summary.success_count += 1;
            }
            Err(e) => match find_admin_error(&e) {
                Some(duplicate @ AdminError::DuplicateKey(_)) => {
                    summary.fail(format!("Row {}: {}", row.row_number, duplicate));
                }
                _ => {
                    summary.fail(format!("Row {}: import failed: {:#}", row.row_number, e));
                }
            },
        }
    }

    log::info!("{}", summary.message());
    Ok(summary)
}
