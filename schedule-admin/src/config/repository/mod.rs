//! Repository layer for database operations

pub mod migrations;
pub mod pipeline_cards;
pub mod process_rules;
pub mod processes;
pub mod registry;
pub mod schedule_records;
