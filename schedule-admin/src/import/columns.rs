//! Fixed spreadsheet layout for pipeline-card imports
//!
//! Columns 0 and 1 identify the pipeline; columns 2..=17 hold one process each,
//! in the order below. The order is also the persisted `process_order`.

/// Column positions of the identity fields (must match the template writer)
pub mod cols {
    pub const SEQUENCE_LABEL: usize = 0;
    pub const PIPELINE_CODE: usize = 1;
    pub const FIRST_PROCESS: usize = 2;
    pub const LAST_PROCESS: usize = 17;
}

pub const SEQUENCE_LABEL_HEADER: &str = "Pipeline No.";
pub const PIPELINE_CODE_HEADER: &str = "Pipeline Code";

/// One process column of the import layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessColumn {
    /// 0-based spreadsheet column
    pub column: usize,
    pub code: &'static str,
    pub name: &'static str,
}

impl ProcessColumn {
    /// 1-based column number, stored as the ordering key of child rows
    pub fn process_order(&self) -> i64 {
        self.column as i64 + 1
    }
}

const fn column(column: usize, code: &'static str, name: &'static str) -> ProcessColumn {
    ProcessColumn { column, code, name }
}

pub static PROCESS_COLUMNS: [ProcessColumn; 16] = [
    column(2, "scaffold", "Scaffolding"),
    column(3, "remove_insulation", "Insulation removal"),
    column(4, "grinding", "Grinding"),
    column(5, "macro_inspection", "Macro inspection"),
    column(6, "thickness_test", "Wall thickness measurement"),
    column(7, "rt_test", "RT (radiographic) testing"),
    column(8, "mt_test", "MT (magnetic particle) testing"),
    column(9, "pt_test", "PT (penetrant) testing"),
    column(10, "ut_test", "UT (ultrasonic) testing"),
    column(11, "other_ndt", "Other NDT"),
    column(12, "hardness_test", "Hardness testing"),
    column(13, "metallography", "Metallography"),
    column(14, "ferrite_test", "Ferrite testing"),
    column(15, "result_evaluation", "Result evaluation"),
    column(16, "rework", "Rework"),
    column(17, "final_confirm", "Rework confirmation and qualified report"),
];

/// Header row of the import template, identity columns first
pub fn header_titles() -> Vec<&'static str> {
    let mut headers = vec![SEQUENCE_LABEL_HEADER, PIPELINE_CODE_HEADER];
    headers.extend(PROCESS_COLUMNS.iter().map(|c| c.name));
    headers
}
