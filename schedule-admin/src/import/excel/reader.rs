//! Read pipeline-card rows from a workbook
//!
//! Only the first sheet is read. Row 0 must be a non-empty header row; data rows
//! start at row 1. Fully empty rows are skipped.

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use std::io::Cursor;

use crate::error::AdminError;
use crate::import::columns::{PROCESS_COLUMNS, ProcessColumn, cols};

use super::cell::{normalize, normalize_opt};

/// One data row with every cell already normalized
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    /// 1-based spreadsheet row number, for messages
    pub row_number: usize,
    pub sequence_label: Option<String>,
    pub pipeline_code: Option<String>,
    /// One entry per configured process column, in column order
    pub process_values: Vec<(&'static ProcessColumn, Option<String>)>,
}

/// Parse workbook bytes (xlsx, xlsm, xlsb, xls, ods) into data rows
pub fn read_pipeline_rows(bytes: &[u8]) -> Result<Vec<SheetRow>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| AdminError::WorkbookFormat(format!("unreadable workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AdminError::WorkbookFormat("workbook has no sheets".to_string()))?
        .map_err(|e| AdminError::WorkbookFormat(format!("unreadable first sheet: {}", e)))?;

    rows_from_range(&range).context("Failed to read pipeline rows")
}

fn rows_from_range(range: &Range<Data>) -> Result<Vec<SheetRow>> {
    let (end_row, end_col) = match range.end() {
        Some(end) => end,
        None => return Err(missing_header().into()),
    };

    if !has_header(range, end_col) {
        return Err(missing_header().into());
    }

    let mut rows = Vec::new();
    for row in 1..=end_row {
        if is_empty_row(range, row, end_col) {
            continue;
        }

        let cell = |col: usize| range.get_value((row, col as u32));

        let process_values = PROCESS_COLUMNS
            .iter()
            .map(|process| (process, normalize_opt(cell(process.column))))
            .collect();

        rows.push(SheetRow {
            row_number: row as usize + 1,
            sequence_label: normalize_opt(cell(cols::SEQUENCE_LABEL)),
            pipeline_code: normalize_opt(cell(cols::PIPELINE_CODE)),
            process_values,
        });
    }

    Ok(rows)
}

fn missing_header() -> AdminError {
    AdminError::WorkbookFormat("missing header row (row 1)".to_string())
}

/// Row 0 must exist and hold at least one non-blank cell
fn has_header(range: &Range<Data>, end_col: u32) -> bool {
    (0..=end_col).any(|col| {
        range
            .get_value((0, col))
            .and_then(normalize)
            .is_some_and(|text| !text.trim().is_empty())
    })
}

fn is_empty_row(range: &Range<Data>, row: u32, end_col: u32) -> bool {
    let last = end_col.max(cols::LAST_PROCESS as u32);
    (0..=last).all(|col| matches!(range.get_value((row, col)), None | Some(Data::Empty)))
}
