//! Database schema definitions
//!
//! Creation is additive only: every statement is `IF NOT EXISTS` and nothing
//! here drops or alters an existing table.

/// SQL to create the scans table
pub const CREATE_SCANS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS scans (
    id INTEGER PRIMARY KEY,
    scan_type TEXT,
    target TEXT,
    start_time TEXT,
    end_time TEXT,
    status TEXT,
    results TEXT
)
"#;

/// SQL to create the wordlist_entries table
pub const CREATE_WORDLIST_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS wordlist_entries (
    id INTEGER PRIMARY KEY,
    word TEXT NOT NULL UNIQUE,
    category TEXT,
    source TEXT,
    added_date TEXT
)
"#;

/// SQL to create the exploit_entries table
pub const CREATE_EXPLOITS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS exploit_entries (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    cve_id TEXT,
    exploit_type TEXT,
    platform TEXT,
    language TEXT,
    path TEXT,
    added_date TEXT
)
"#;

/// SQL to create the code_analysis_reports table
///
/// `scan_id` references scans without an ON DELETE action and foreign key
/// enforcement stays off, so deleting a scan leaves its reports untouched.
pub const CREATE_REPORTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS code_analysis_reports (
    id INTEGER PRIMARY KEY,
    scan_id INTEGER REFERENCES scans(id),
    file_path TEXT NOT NULL,
    issue_type TEXT NOT NULL,
    severity TEXT,
    description TEXT,
    line_number INTEGER,
    code_snippet TEXT,
    analysis_date TEXT,
    status TEXT NOT NULL DEFAULT 'New'
        CHECK (status IN ('New', 'Triaged', 'FalsePositive', 'Fixed', 'Ignored'))
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS ix_wordlist_entries_word ON wordlist_entries(word)",
    "CREATE INDEX IF NOT EXISTS ix_exploit_entries_cve_id ON exploit_entries(cve_id)",
    "CREATE INDEX IF NOT EXISTS ix_code_analysis_reports_scan_id ON code_analysis_reports(scan_id)",
];

/// Table name and creation statement, in creation order
pub const TABLES: &[(&str, &str)] = &[
    ("scans", CREATE_SCANS_TABLE),
    ("wordlist_entries", CREATE_WORDLIST_TABLE),
    ("exploit_entries", CREATE_EXPLOITS_TABLE),
    ("code_analysis_reports", CREATE_REPORTS_TABLE),
];

/// Query used to check whether a table already exists
pub const TABLE_EXISTS: &str =
    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1";
