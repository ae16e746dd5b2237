//! Storage Layer - SQLite-backed persistence
//!
//! System of record is one SQLite file with tables:
//! - scans(scan_type, target, start_time, end_time, status, results)
//! - wordlist_entries(word UNIQUE, category, source, added_date)
//! - exploit_entries(name UNIQUE, description, cve_id, exploit_type, platform, language, path, added_date)
//! - code_analysis_reports(scan_id, file_path, issue_type, severity, description, line_number, code_snippet, analysis_date, status)

pub mod schema;
pub mod record;
pub mod sqlite;
pub mod seed;

pub use record::Record;
pub use seed::SeedSummary;
pub use sqlite::{DbStats, SchemaReport, SqliteStore};

/// Default database file name
pub const DEFAULT_DATABASE: &str = "tesseract.db";
