//! Spreadsheet I/O for pipeline-card imports

pub mod cell;
pub mod reader;
pub mod template;

pub use reader::{SheetRow, read_pipeline_rows};
pub use template::{TEMPLATE_FILE_NAME, build_template};
