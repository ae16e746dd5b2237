//! SQLite storage implementation
//!
//! The store holds only a path. Every operation opens its own connection and
//! drops it before returning, and every mutation runs in its own transaction.

use std::path::{Path, PathBuf};
use std::time::Duration;
use rusqlite::{params, Connection, OptionalExtension, Params};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use crate::{Error, Result};
use crate::entity::{CodeAnalysisReport, Entity, EntityKind, ExploitEntry, ReportStatus, Scan, WordlistEntry};
use super::record::Record;
use super::schema;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Which tables `initialize` found and which it created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    pub created: Vec<String>,
    pub existing: Vec<String>,
}

/// SQLite-backed storage for scans, wordlists, exploits and reports
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Open a database file (creates it and its tables if missing)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self { path: path.as_ref().to_path_buf() };
        store.initialize()?;
        Ok(store)
    }

    /// Path of the backing database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure every table and index exists.
    ///
    /// Idempotent; existing tables are reported, never dropped or altered.
    pub fn initialize(&self) -> Result<SchemaReport> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = self.connect()?;
        let mut report = SchemaReport::default();

        for (table, create) in schema::TABLES {
            let count: i64 = conn.query_row(schema::TABLE_EXISTS, [table], |row| row.get(0))?;
            if count > 0 {
                debug!(table = %table, "Table already exists");
                report.existing.push(table.to_string());
            } else {
                conn.execute(create, [])?;
                info!(table = %table, "Created table");
                report.created.push(table.to_string());
            }
        }

        for stmt in schema::CREATE_INDEXES {
            conn.execute(stmt, [])?;
        }

        Ok(report)
    }

    /// Open a fresh connection for one operation
    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // scan_id is advisory; bundled builds default enforcement on
        conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
        Ok(conn)
    }

    // ========== Mutations ==========

    /// Insert one row and return its store-assigned id.
    ///
    /// A constraint violation or storage fault rolls the insert back and is
    /// returned as an error.
    pub fn add(&self, entity: impl Into<Entity>) -> Result<i64> {
        let entity = entity.into();
        let kind = entity.kind();
        let result = match &entity {
            Entity::Scan(scan) => self.insert_record(scan),
            Entity::Wordlist(entry) => self.insert_record(entry),
            Entity::Exploit(entry) => self.insert_record(entry),
            Entity::Report(report) => self.insert_record(report),
        };

        match &result {
            Ok(id) => info!(kind = %kind, id, "Added entry"),
            Err(e) => error!(kind = %kind, error = %e, "Failed to add entry"),
        }
        result
    }

    fn insert_record<R: Record>(&self, record: &R) -> Result<i64> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        record.insert(&tx)?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    /// Set the triage status of a report.
    ///
    /// Fails with `NotFound` and writes nothing if the report is absent.
    pub fn update_report_status(&self, report_id: i64, status: ReportStatus) -> Result<()> {
        let result = (|| -> Result<()> {
            let mut conn = self.connect()?;
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE code_analysis_reports SET status = ?2 WHERE id = ?1",
                params![report_id, status],
            )?;
            if changed == 0 {
                return Err(Error::NotFound { kind: EntityKind::Report, id: report_id });
            }
            tx.commit()?;
            Ok(())
        })();

        match &result {
            Ok(()) => info!(report_id, status = %status, "Updated report status"),
            Err(e) if e.is_not_found() => warn!(report_id, "Report not found"),
            Err(e) => error!(report_id, error = %e, "Failed to update report status"),
        }
        result
    }

    /// Remove a persisted entity
    pub fn delete(&self, entity: &Entity) -> Result<()> {
        match entity.id() {
            Some(id) => self.delete_by_id(entity.kind(), id),
            None => {
                let err = Error::InvalidValue(format!("cannot delete an unsaved {}", entity.kind()));
                error!(error = %err, "Failed to delete entry");
                Err(err)
            }
        }
    }

    /// Remove one row of a kind by id.
    ///
    /// Never cascades: deleting a scan leaves its reports in place.
    pub fn delete_by_id(&self, kind: EntityKind, id: i64) -> Result<()> {
        let result = (|| -> Result<()> {
            let mut conn = self.connect()?;
            let tx = conn.transaction()?;
            let sql = format!("DELETE FROM {} WHERE id = ?1", kind.table_name());
            let changed = tx.execute(&sql, [id])?;
            if changed == 0 {
                return Err(Error::NotFound { kind, id });
            }
            tx.commit()?;
            Ok(())
        })();

        match &result {
            Ok(()) => info!(kind = %kind, id, "Deleted entry"),
            Err(e) if e.is_not_found() => warn!(kind = %kind, id, "Entry not found"),
            Err(e) => error!(kind = %kind, id, error = %e, "Failed to delete entry"),
        }
        result
    }

    // ========== Queries ==========

    /// All rows of a kind in insertion order.
    ///
    /// Never fails: a storage fault is logged and yields an empty list.
    /// Rows that cannot be decoded (a report status outside the vocabulary in
    /// a table created without the CHECK constraint) are skipped, so the
    /// result can be shorter than `count`.
    pub fn list_all(&self, kind: EntityKind) -> Vec<Entity> {
        match kind {
            EntityKind::Scan => self.list::<Scan>(),
            EntityKind::Wordlist => self.list::<WordlistEntry>(),
            EntityKind::Exploit => self.list::<ExploitEntry>(),
            EntityKind::Report => self.list::<CodeAnalysisReport>(),
        }
    }

    pub fn list_scans(&self) -> Vec<Scan> {
        self.list_records()
    }

    pub fn list_wordlist(&self) -> Vec<WordlistEntry> {
        self.list_records()
    }

    pub fn list_exploits(&self) -> Vec<ExploitEntry> {
        self.list_records()
    }

    pub fn list_reports(&self) -> Vec<CodeAnalysisReport> {
        self.list_records()
    }

    fn list<R: Record>(&self) -> Vec<Entity> {
        self.list_records::<R>().into_iter().map(R::into_entity).collect()
    }

    fn list_records<R: Record>(&self) -> Vec<R> {
        match self.select::<R, _>("", []) {
            Ok(rows) => rows,
            Err(e) => {
                error!(kind = %R::KIND, error = %e, "Failed to list entries");
                Vec::new()
            }
        }
    }

    /// Run `SELECT COLUMNS FROM table <filter> ORDER BY id`, skipping rows that fail to decode
    fn select<R: Record, P: Params>(&self, filter: &str, params: P) -> Result<Vec<R>> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT {} FROM {} {} ORDER BY id",
            R::COLUMNS,
            R::KIND.table_name(),
            filter
        );
        let mut stmt = conn.prepare(&sql)?;

        let mut records = Vec::new();
        for row in stmt.query_map(params, |row| R::from_row(row))? {
            match row {
                Ok(record) => records.push(record),
                Err(e) => warn!(kind = %R::KIND, error = %e, "Skipping undecodable row"),
            }
        }
        debug!(kind = %R::KIND, count = records.len(), "Selected rows");
        Ok(records)
    }

    fn find_one<R: Record>(&self, id: i64) -> Result<Option<R>> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            R::COLUMNS,
            R::KIND.table_name()
        );
        conn.query_row(&sql, [id], |row| R::from_row(row))
            .optional()
            .map_err(Into::into)
    }

    /// Get a scan by id
    pub fn get_scan(&self, id: i64) -> Result<Option<Scan>> {
        self.find_one(id)
    }

    /// Get a report by id
    pub fn get_report(&self, id: i64) -> Result<Option<CodeAnalysisReport>> {
        self.find_one(id)
    }

    /// Reports that reference a scan, in insertion order
    pub fn reports_for_scan(&self, scan_id: i64) -> Result<Vec<CodeAnalysisReport>> {
        self.select("WHERE scan_id = ?1", [scan_id])
    }

    /// First scan of a given type
    pub fn find_scan_by_type(&self, scan_type: &str) -> Result<Option<Scan>> {
        let scans: Vec<Scan> = self.select("WHERE scan_type = ?1", [scan_type])?;
        Ok(scans.into_iter().next())
    }

    /// Count rows of a kind
    pub fn count(&self, kind: EntityKind) -> Result<usize> {
        let conn = self.connect()?;
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table_name());
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Row counts for every kind
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            scans: self.count(EntityKind::Scan)?,
            wordlist: self.count(EntityKind::Wordlist)?,
            exploits: self.count(EntityKind::Exploit)?,
            reports: self.count(EntityKind::Report)?,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    pub scans: usize,
    pub wordlist: usize,
    pub exploits: usize,
    pub reports: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Scans: {}", self.scans)?;
        writeln!(f, "  Wordlist entries: {}", self.wordlist)?;
        writeln!(f, "  Exploits: {}", self.exploits)?;
        writeln!(f, "  Reports: {}", self.reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, SqliteStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path().join("tesseract.db")).unwrap();
        (dir, store)
    }

    fn sample_report(scan_id: i64, severity: &str) -> CodeAnalysisReport {
        CodeAnalysisReport::new("src/net/scanner.py", "BadPractice", severity)
            .with_scan(scan_id)
            .with_description("Shell command built from user input")
            .with_line(45)
            .with_snippet("os.system(\"nmap \" + target)")
    }

    #[test]
    fn test_initialize_creates_then_reports_existing() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore { path: dir.path().join("nested").join("t.db") };

        let first = store.initialize().unwrap();
        assert_eq!(first.created, ["scans", "wordlist_entries", "exploit_entries", "code_analysis_reports"]);
        assert!(first.existing.is_empty());

        let second = store.initialize().unwrap();
        assert!(second.created.is_empty());
        assert_eq!(second.existing.len(), 4);
    }

    #[test]
    fn test_initialize_twice_keeps_data() {
        let (dir, store) = temp_store();
        store.add(WordlistEntry::new("admin")).unwrap();

        let reopened = SqliteStore::open(dir.path().join("tesseract.db")).unwrap();
        reopened.initialize().unwrap();
        assert_eq!(reopened.count(EntityKind::Wordlist).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_word_rejected() {
        let (_dir, store) = temp_store();
        store.add(WordlistEntry::new("password").with_category("common_passwords")).unwrap();

        let err = store.add(WordlistEntry::new("password").with_source("custom")).unwrap_err();
        assert!(err.is_constraint());
        assert_eq!(store.count(EntityKind::Wordlist).unwrap(), 1);
        assert_eq!(store.list_wordlist()[0].category.as_deref(), Some("common_passwords"));
    }

    #[test]
    fn test_duplicate_exploit_name_rejected() {
        let (_dir, store) = temp_store();
        store.add(ExploitEntry::new("eternalblue").with_cve("CVE-2017-0144")).unwrap();

        let err = store.add(ExploitEntry::new("eternalblue")).unwrap_err();
        assert!(err.is_constraint());
        assert_eq!(store.count(EntityKind::Exploit).unwrap(), 1);
    }

    #[test]
    fn test_add_returns_assigned_ids() {
        let (_dir, store) = temp_store();
        let first = store.add(Scan::new("network", "10.0.0.0/24", "running")).unwrap();
        let second = store.add(Scan::new("host", "10.0.0.5", "completed")).unwrap();
        assert!(second > first);

        let scans = store.list_scans();
        assert_eq!(scans.len(), 2);
        assert_eq!(scans[0].id, Some(first));
        assert_eq!(scans[1].target, "10.0.0.5");
    }

    #[test]
    fn test_list_all_tags_kind() {
        let (_dir, store) = temp_store();
        store.add(ExploitEntry::new("ms08-067").with_platform("Windows")).unwrap();

        let rows = store.list_all(EntityKind::Exploit);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind(), EntityKind::Exploit);
        assert!(store.list_all(EntityKind::Scan).is_empty());
    }

    #[test]
    fn test_list_all_on_fault_is_empty() {
        let (_dir, store) = temp_store();
        store.add(WordlistEntry::new("root")).unwrap();
        store.connect().unwrap().execute_batch("DROP TABLE wordlist_entries").unwrap();

        assert!(store.list_all(EntityKind::Wordlist).is_empty());
    }

    #[test]
    fn test_status_round_trip() {
        let (_dir, store) = temp_store();
        let scan_id = store.add(Scan::new("initial_code_scan", "core", "completed")).unwrap();
        let id = store.add(sample_report(scan_id, "Medium")).unwrap();
        let before = store.get_report(id).unwrap().unwrap();
        assert_eq!(before.status, ReportStatus::New);

        store.update_report_status(id, ReportStatus::Triaged).unwrap();

        let after = store.list_reports();
        assert_eq!(after.len(), 1);
        let mut expected = before.clone();
        expected.status = ReportStatus::Triaged;
        assert_eq!(after[0], expected);
    }

    #[test]
    fn test_update_missing_report_is_not_found() {
        let (_dir, store) = temp_store();
        let id = store.add(sample_report(1, "Low")).unwrap();

        let err = store.update_report_status(9999, ReportStatus::Fixed).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.get_report(id).unwrap().unwrap().status, ReportStatus::New);
    }

    #[test]
    fn test_status_vocabulary_enforced_by_store() {
        let (_dir, store) = temp_store();
        let result = store.connect().unwrap().execute(
            "INSERT INTO code_analysis_reports (file_path, issue_type, status) VALUES ('a.py', 'Vulnerability', 'Closed')",
            [],
        );
        assert!(result.is_err());
        assert_eq!(store.count(EntityKind::Report).unwrap(), 0);
    }

    #[test]
    fn test_delete_scan_does_not_cascade() {
        let (_dir, store) = temp_store();
        let scan_id = store.add(Scan::new("initial_code_scan", "core", "completed")).unwrap();
        store.add(sample_report(scan_id, "High")).unwrap();
        store.add(sample_report(scan_id, "Low")).unwrap();

        let scan = store.get_scan(scan_id).unwrap().unwrap();
        store.delete(&Entity::Scan(scan)).unwrap();

        assert!(store.get_scan(scan_id).unwrap().is_none());
        let reports = store.reports_for_scan(scan_id).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.scan_id == Some(scan_id)));
    }

    #[test]
    fn test_delete_missing_and_unsaved() {
        let (_dir, store) = temp_store();
        let err = store.delete_by_id(EntityKind::Exploit, 42).unwrap_err();
        assert!(err.is_not_found());

        let unsaved = Entity::from(WordlistEntry::new("never-stored"));
        assert!(matches!(store.delete(&unsaved), Err(Error::InvalidValue(_))));
    }

    #[test]
    fn test_failed_insert_rolls_back() {
        let (_dir, store) = temp_store();
        store
            .connect()
            .unwrap()
            .execute_batch(
                r#"
                CREATE TRIGGER fail_report_insert
                AFTER INSERT ON code_analysis_reports
                BEGIN
                    SELECT RAISE(FAIL, 'forced report insert failure');
                END;
                "#,
            )
            .unwrap();

        assert!(store.add(sample_report(1, "Critical")).is_err());
        assert_eq!(store.count(EntityKind::Report).unwrap(), 0);
    }

    #[test]
    fn test_failed_delete_rolls_back() {
        let (_dir, store) = temp_store();
        let id = store.add(WordlistEntry::new("letmein")).unwrap();
        store
            .connect()
            .unwrap()
            .execute_batch(
                r#"
                CREATE TRIGGER fail_word_delete
                AFTER DELETE ON wordlist_entries
                BEGIN
                    SELECT RAISE(FAIL, 'forced word delete failure');
                END;
                "#,
            )
            .unwrap();

        assert!(store.delete_by_id(EntityKind::Wordlist, id).is_err());
        let words = store.list_wordlist();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].word, "letmein");
    }

    #[test]
    fn test_failed_status_update_rolls_back() {
        let (_dir, store) = temp_store();
        let id = store.add(sample_report(1, "High")).unwrap();
        store
            .connect()
            .unwrap()
            .execute_batch(
                r#"
                CREATE TRIGGER fail_report_update
                AFTER UPDATE ON code_analysis_reports
                BEGIN
                    SELECT RAISE(FAIL, 'forced report update failure');
                END;
                "#,
            )
            .unwrap();

        assert!(store.update_report_status(id, ReportStatus::Fixed).is_err());
        assert_eq!(store.get_report(id).unwrap().unwrap().status, ReportStatus::New);
    }

    #[test]
    fn test_legacy_reports_table_null_status_reads_as_new() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch(
                r#"
                CREATE TABLE code_analysis_reports (
                    id INTEGER PRIMARY KEY,
                    scan_id INTEGER,
                    file_path TEXT NOT NULL,
                    issue_type TEXT NOT NULL,
                    severity TEXT,
                    description TEXT,
                    line_number INTEGER,
                    code_snippet TEXT,
                    analysis_date TEXT,
                    status TEXT
                );
                INSERT INTO code_analysis_reports (file_path, issue_type, status) VALUES ('a.py', 'Vulnerability', 'New');
                INSERT INTO code_analysis_reports (file_path, issue_type, status) VALUES ('b.py', 'Vulnerability', 'Closed');
                INSERT INTO code_analysis_reports (file_path, issue_type, status) VALUES ('c.py', 'Vulnerability', NULL);
                "#,
            )
            .unwrap();

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count(EntityKind::Report).unwrap(), 3);

        let reports = store.list_reports();
        let files: Vec<_> = reports.iter().map(|r| r.file_path.as_str()).collect();
        assert_eq!(files, ["a.py", "c.py"]);
        assert!(reports.iter().all(|r| r.status == ReportStatus::New));
    }

    #[test]
    fn test_existing_tables_logged_below_info() {
        use std::sync::{Arc, Mutex};
        use tracing::field::{Field, Visit};
        use tracing::{Event, Level, Subscriber};
        use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

        type Seen = Arc<Mutex<Vec<(Level, String)>>>;

        struct Capture(Seen);

        struct Message(String);

        impl Visit for Message {
            fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.0 = format!("{:?}", value);
                }
            }
        }

        impl<S: Subscriber> Layer<S> for Capture {
            fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
                let mut message = Message(String::new());
                event.record(&mut message);
                self.0.lock().unwrap().push((*event.metadata().level(), message.0));
            }
        }

        let (_dir, store) = temp_store();
        let seen: Seen = Arc::default();
        let subscriber = tracing_subscriber::registry().with(Capture(seen.clone()));
        tracing::subscriber::with_default(subscriber, || store.initialize().unwrap());

        let seen = seen.lock().unwrap();
        let existing: Vec<_> = seen.iter().filter(|(_, m)| m == "Table already exists").collect();
        assert_eq!(existing.len(), 4);
        assert!(existing.iter().all(|(level, _)| *level == Level::DEBUG));
        assert!(!seen.iter().any(|(level, _)| *level == Level::INFO));
    }

    #[test]
    fn test_find_scan_by_type() {
        let (_dir, store) = temp_store();
        store.add(Scan::new("network", "lan", "completed")).unwrap();
        let id = store.add(Scan::new("initial_code_scan", "core", "completed")).unwrap();

        let found = store.find_scan_by_type("initial_code_scan").unwrap().unwrap();
        assert_eq!(found.id, Some(id));
        assert!(store.find_scan_by_type("wifi").unwrap().is_none());
    }

    #[test]
    fn test_stats() {
        let (_dir, store) = temp_store();
        store.add(WordlistEntry::new("a")).unwrap();
        store.add(WordlistEntry::new("b")).unwrap();
        store.add(ExploitEntry::new("x")).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!((stats.scans, stats.wordlist, stats.exploits, stats.reports), (0, 2, 1, 0));
    }
}
