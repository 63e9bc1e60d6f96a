//! Import template workbook
//!
//! The first sheet holds the header row and three example rows, so the
//! template itself imports cleanly. Filling instructions live on a second sheet.

use anyhow::{Context, Result};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::import::columns::header_titles;

pub const TEMPLATE_FILE_NAME: &str = "pipeline-import-template.xlsx";

const DATA_SHEET: &str = "Pipelines";
const NOTES_SHEET: &str = "Instructions";

/// Example rows; empty strings leave the cell blank, digits are written as numbers
const EXAMPLE_ROWS: [[&str; 18]; 3] = [
    ["1", "AV-32130", "1", "1", "1", "1", "1", "", "2", "", "", "", "1", "", "1", "1", "", "1"],
    ["2", "AV-32140", "1", "1", "1", "1", "1", "2", "", "2", "", "", "", "1", "", "1", "", "1"],
    ["3", "AV-32150", "1", "1", "1", "1", "1", "", "", "", "2", "1", "1", "1", "1", "1", "", "1"],
];

const NOTES: [&str; 5] = [
    "Filling instructions:",
    "1. Pipeline No.: a number such as 1, 2, 3...",
    "2. Pipeline Code: the unique code of the pipeline; duplicates are rejected",
    "3. Process columns: how many times the process is required; leave blank when not needed",
    "4. Only the first sheet is imported; keep the header row and the data rows",
];

/// Build the import template in memory
pub fn build_template() -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let data_sheet = workbook.add_worksheet();
    data_sheet.set_name(DATA_SHEET)?;
    write_data_sheet(data_sheet)?;

    let notes_sheet = workbook.add_worksheet();
    notes_sheet.set_name(NOTES_SHEET)?;
    write_notes(notes_sheet)?;

    workbook
        .save_to_buffer()
        .context("Failed to build import template")
}

fn write_data_sheet(ws: &mut Worksheet) -> Result<()> {
    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xBDD7EE))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin);
    let data_format = Format::new()
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin);

    for (col, title) in header_titles().iter().enumerate() {
        let col = col as u16;
        ws.write_string_with_format(0, col, *title, &header_format)?;
        ws.set_column_width(col, 15)?;
    }

    for (index, example) in EXAMPLE_ROWS.iter().enumerate() {
        let row = (index + 1) as u32;
        for (col, value) in example.iter().enumerate() {
            let col = col as u16;
            if value.is_empty() {
                ws.write_blank(row, col, &data_format)?;
            } else if let Ok(number) = value.parse::<i64>() {
                ws.write_number_with_format(row, col, number as f64, &data_format)?;
            } else {
                ws.write_string_with_format(row, col, *value, &data_format)?;
            }
        }
    }

    Ok(())
}

fn write_notes(ws: &mut Worksheet) -> Result<()> {
    ws.set_column_width(0, 90)?;
    for (row, note) in NOTES.iter().enumerate() {
        ws.write_string(row as u32, 0, *note)?;
    }
    Ok(())
}
