use thiserror::Error;

/// Domain errors raised by the import pipeline and the dynamic table layer.
///
/// Plumbing failures (sqlx, calamine, io) travel as `anyhow::Error` with context;
/// these variants mark the cases callers branch on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    #[error("Invalid workstation id: {0}")]
    InvalidWorkstationId(String),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Illegal schedule result table name: {0}")]
    IllegalResultTable(String),

    #[error("Schedule result table does not exist: {0}")]
    ResultTableNotFound(String),

    #[error("Workbook format error: {0}")]
    WorkbookFormat(String),

    #[error("Invalid pagination: page {page}, size {size} (both must be >= 1)")]
    InvalidPage { page: i64, size: i64 },

    #[error("Pipeline code {0} already exists, duplicate import is not allowed")]
    DuplicateKey(String),

    #[error("{0}")]
    Validation(String),
}

/// Look through an `anyhow::Error` chain for a domain error.
pub fn find_admin_error(error: &anyhow::Error) -> Option<&AdminError> {
    error.chain().find_map(|cause| cause.downcast_ref::<AdminError>())
}
