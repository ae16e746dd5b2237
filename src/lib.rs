//! # Tesseract - findings store and report viewer
//!
//! Local persistence for security-scan results with pluggable viewers.
//!
//! Tesseract provides:
//! - A single-file SQLite store for scans, wordlists, exploits and code-analysis reports
//! - Typed CRUD over a closed set of entity kinds
//! - A plugin contract and registry for display units mounted by a host
//! - A report viewer plugin for triaging code-analysis findings

pub mod entity;
pub mod storage;
pub mod plugin;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use entity::{CodeAnalysisReport, Entity, EntityKind, ExploitEntry, ReportStatus, Scan, WordlistEntry};
pub use plugin::{Plugin, PluginRegistry};
pub use storage::SqliteStore;

/// Result type alias for Tesseract operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Tesseract operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    #[error("Storage error: {0}")]
    Storage(#[source] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Plugin error: {0}")]
    Plugin(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::Constraint(msg.unwrap_or_else(|| code.to_string()))
            }
            other => Error::Storage(other),
        }
    }
}

impl Error {
    /// Whether this error is a uniqueness/check constraint violation
    pub fn is_constraint(&self) -> bool {
        matches!(self, Error::Constraint(_))
    }

    /// Whether this error reports a missing row
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_storage_error_keeps_source() {
        let err = Error::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, Error::Storage(_)));
        assert!(err.source().is_some());
    }
}
