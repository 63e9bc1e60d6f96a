//! Workstation id to physical table name
//!
//! `WorkstationTable` can only be built through `resolve` (or from a discovered
//! table name that passes the same check), so every table name the executor
//! interpolates into SQL has been validated.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::error::AdminError;

pub const WORKSTATION_PREFIX: &str = "workstation_";
pub const TABLE_PREFIX: &str = "process_workstation_";

static WORKSTATION_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^workstation_([1-9][0-9]*)$").expect("valid workstation id regex"));

static TABLE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^process_workstation_([1-9][0-9]*)$").expect("valid table name regex")
});

/// A validated routing target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkstationTable {
    number: u64,
    workstation_id: String,
    table_name: String,
}

impl WorkstationTable {
    pub fn number(&self) -> u64 {
        self.number
    }

    /// `workstation_<N>`
    pub fn workstation_id(&self) -> &str {
        &self.workstation_id
    }

    /// `process_workstation_<N>`
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn from_number(number: u64) -> Result<Self, AdminError> {
        let workstation_id = format!("{}{}", WORKSTATION_PREFIX, number);
        let table_name = format!("process_{}", workstation_id);

        if !TABLE_NAME.is_match(&table_name) {
            return Err(AdminError::InvalidTableName(table_name));
        }

        Ok(Self {
            number,
            workstation_id,
            table_name,
        })
    }

    /// Rebuild the routing target of an existing table
    pub fn from_table_name(table_name: &str) -> Result<Self, AdminError> {
        let number = TABLE_NAME
            .captures(table_name)
            .and_then(|caps| caps[1].parse::<u64>().ok())
            .ok_or_else(|| AdminError::InvalidTableName(table_name.to_string()))?;
        Self::from_number(number)
    }
}

impl fmt::Display for WorkstationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.table_name)
    }
}

/// Validate `workstation_<positive integer>` and derive its table
pub fn resolve(workstation_id: &str) -> Result<WorkstationTable, AdminError> {
    let number = WORKSTATION_ID
        .captures(workstation_id)
        .and_then(|caps| caps[1].parse::<u64>().ok())
        .ok_or_else(|| AdminError::InvalidWorkstationId(workstation_id.to_string()))?;

    WorkstationTable::from_number(number)
}
