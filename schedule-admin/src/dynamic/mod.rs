//! Per-workstation process tables
//!
//! Each workstation owns a table `process_workstation_<N>`. The set is open
//! ended: tables are discovered from the schema, never configured.

pub mod discovery;
pub mod executor;
pub mod router;

pub use discovery::{create_workstation_table, find_workstation, list_workstations};
pub use executor::{ProcessConfigInput, ProcessConfigRow, ProcessFilter};
pub use router::resolve;
