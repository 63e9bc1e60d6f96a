//! Historical schedule results

pub mod reader;

pub use reader::{list_result_tables, read_result_table};
