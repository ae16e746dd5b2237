//! Row mapping for each entity kind
//!
//! `Record` is implemented for exactly the four entity structs; the store is
//! generic over it so every kind shares one insert/select/delete path.

use crate::entity::{CodeAnalysisReport, Entity, EntityKind, ExploitEntry, ReportStatus, Scan, WordlistEntry};
use chrono::NaiveDateTime;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, Row};

/// A typed row of one table
pub trait Record: Sized {
    /// The entity kind this record belongs to
    const KIND: EntityKind;

    /// Select list, `id` first, in `from_row` order
    const COLUMNS: &'static str;

    /// Decode a row selected with `COLUMNS`
    fn from_row(row: &Row) -> rusqlite::Result<Self>;

    /// Insert the record; `id` is ignored and assigned by the store
    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize>;

    fn into_entity(self) -> Entity;
}

impl ToSql for ReportStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ReportStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        // Tables created without the column default may hold NULL
        if let ValueRef::Null = value {
            return Ok(ReportStatus::New);
        }
        value
            .as_str()?
            .parse()
            .map_err(|e: crate::Error| FromSqlError::Other(Box::new(e)))
    }
}

/// Timestamps written by other tools may be NULL; treat them as the epoch
fn timestamp(row: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    Ok(row.get::<_, Option<NaiveDateTime>>(idx)?.unwrap_or_default())
}

fn text(row: &Row, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

impl Record for Scan {
    const KIND: EntityKind = EntityKind::Scan;
    const COLUMNS: &'static str = "id, scan_type, target, start_time, end_time, status, results";

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Scan {
            id: Some(row.get(0)?),
            scan_type: text(row, 1)?,
            target: text(row, 2)?,
            start_time: timestamp(row, 3)?,
            end_time: row.get(4)?,
            status: text(row, 5)?,
            results: row.get(6)?,
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            r#"
            INSERT INTO scans (scan_type, target, start_time, end_time, status, results)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                self.scan_type,
                self.target,
                self.start_time,
                self.end_time,
                self.status,
                self.results,
            ],
        )
    }

    fn into_entity(self) -> Entity {
        Entity::Scan(self)
    }
}

impl Record for WordlistEntry {
    const KIND: EntityKind = EntityKind::Wordlist;
    const COLUMNS: &'static str = "id, word, category, source, added_date";

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(WordlistEntry {
            id: Some(row.get(0)?),
            word: row.get(1)?,
            category: row.get(2)?,
            source: row.get(3)?,
            added_date: timestamp(row, 4)?,
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO wordlist_entries (word, category, source, added_date) VALUES (?1, ?2, ?3, ?4)",
            params![self.word, self.category, self.source, self.added_date],
        )
    }

    fn into_entity(self) -> Entity {
        Entity::Wordlist(self)
    }
}

impl Record for ExploitEntry {
    const KIND: EntityKind = EntityKind::Exploit;
    const COLUMNS: &'static str =
        "id, name, description, cve_id, exploit_type, platform, language, path, added_date";

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ExploitEntry {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            description: row.get(2)?,
            cve_id: row.get(3)?,
            exploit_type: row.get(4)?,
            platform: row.get(5)?,
            language: row.get(6)?,
            path: row.get(7)?,
            added_date: timestamp(row, 8)?,
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            r#"
            INSERT INTO exploit_entries (name, description, cve_id, exploit_type, platform, language, path, added_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                self.name,
                self.description,
                self.cve_id,
                self.exploit_type,
                self.platform,
                self.language,
                self.path,
                self.added_date,
            ],
        )
    }

    fn into_entity(self) -> Entity {
        Entity::Exploit(self)
    }
}

impl Record for CodeAnalysisReport {
    const KIND: EntityKind = EntityKind::Report;
    const COLUMNS: &'static str = "id, scan_id, file_path, issue_type, severity, description, line_number, code_snippet, analysis_date, status";

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(CodeAnalysisReport {
            id: Some(row.get(0)?),
            scan_id: row.get(1)?,
            file_path: row.get(2)?,
            issue_type: row.get(3)?,
            severity: text(row, 4)?,
            description: row.get(5)?,
            line_number: row.get(6)?,
            code_snippet: row.get(7)?,
            analysis_date: timestamp(row, 8)?,
            status: row.get(9)?,
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            r#"
            INSERT INTO code_analysis_reports (scan_id, file_path, issue_type, severity, description, line_number, code_snippet, analysis_date, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                self.scan_id,
                self.file_path,
                self.issue_type,
                self.severity,
                self.description,
                self.line_number,
                self.code_snippet,
                self.analysis_date,
                self.status,
            ],
        )
    }

    fn into_entity(self) -> Entity {
        Entity::Report(self)
    }
}
