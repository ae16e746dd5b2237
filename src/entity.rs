//! Entity types - the four record kinds held by the store
//!
//! - `Scan`: one scan run (type, target, time range, status, opaque results)
//! - `WordlistEntry`: a word for password/username guessing lists
//! - `ExploitEntry`: a catalogued exploit
//! - `CodeAnalysisReport`: one finding produced by a scan, with a triage status
//!
//! `id` is `None` until the store assigns one on insert.

use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Current local time, used for creation timestamps
pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// The closed set of entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Scan,
    Wordlist,
    Exploit,
    Report,
}

impl EntityKind {
    /// Backing table name
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Scan => "scans",
            EntityKind::Wordlist => "wordlist_entries",
            EntityKind::Exploit => "exploit_entries",
            EntityKind::Report => "code_analysis_reports",
        }
    }

    /// Human readable label
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Scan => "scan",
            EntityKind::Wordlist => "wordlist entry",
            EntityKind::Exploit => "exploit",
            EntityKind::Report => "report",
        }
    }

    /// All kinds, in schema creation order
    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Scan,
            EntityKind::Wordlist,
            EntityKind::Exploit,
            EntityKind::Report,
        ]
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "scan" | "scans" => Ok(EntityKind::Scan),
            "word" | "words" | "wordlist" | "wordlist_entries" => Ok(EntityKind::Wordlist),
            "exploit" | "exploits" | "exploit_entries" => Ok(EntityKind::Exploit),
            "report" | "reports" | "code_analysis_reports" => Ok(EntityKind::Report),
            _ => Err(Error::InvalidValue(format!("Unknown entity kind: {}", s))),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Triage status of a code-analysis report.
///
/// Reports start as `New` and only ever move between these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReportStatus {
    #[default]
    New,
    Triaged,
    FalsePositive,
    Fixed,
    Ignored,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::New => "New",
            ReportStatus::Triaged => "Triaged",
            ReportStatus::FalsePositive => "FalsePositive",
            ReportStatus::Fixed => "Fixed",
            ReportStatus::Ignored => "Ignored",
        }
    }

    pub fn all() -> &'static [ReportStatus] {
        &[
            ReportStatus::New,
            ReportStatus::Triaged,
            ReportStatus::FalsePositive,
            ReportStatus::Fixed,
            ReportStatus::Ignored,
        ]
    }
}

impl FromStr for ReportStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "new" => Ok(ReportStatus::New),
            "triaged" => Ok(ReportStatus::Triaged),
            "falsepositive" | "fp" => Ok(ReportStatus::FalsePositive),
            "fixed" => Ok(ReportStatus::Fixed),
            "ignored" => Ok(ReportStatus::Ignored),
            _ => Err(Error::InvalidValue(format!("Unknown report status: {}", s))),
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A record of one security/code scan run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    pub id: Option<i64>,
    /// e.g. `network`, `host`, `initial_code_scan`
    pub scan_type: String,
    /// IP, hostname, MAC, SSID or code module
    pub target: String,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    /// `running`, `completed` or `failed` by convention
    pub status: String,
    /// Opaque result payload, usually JSON
    pub results: Option<String>,
}

impl Scan {
    pub fn new(
        scan_type: impl Into<String>,
        target: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            scan_type: scan_type.into(),
            target: target.into(),
            start_time: now(),
            end_time: None,
            status: status.into(),
            results: None,
        }
    }

    pub fn with_start_time(mut self, start_time: NaiveDateTime) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_end_time(mut self, end_time: NaiveDateTime) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn with_results(mut self, results: impl Into<String>) -> Self {
        self.results = Some(results.into());
        self
    }

    /// The results payload parsed as JSON, if it is JSON
    pub fn results_json(&self) -> Option<serde_json::Value> {
        self.results
            .as_deref()
            .and_then(|r| serde_json::from_str(r).ok())
    }
}

/// A word in a guessing list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordlistEntry {
    pub id: Option<i64>,
    pub word: String,
    /// e.g. `common_passwords`, `usernames`
    pub category: Option<String>,
    /// e.g. `OSINT_crawl`, `custom`
    pub source: Option<String>,
    pub added_date: NaiveDateTime,
}

impl WordlistEntry {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            id: None,
            word: word.into(),
            category: None,
            source: None,
            added_date: now(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A catalogued exploit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExploitEntry {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub cve_id: Option<String>,
    /// e.g. `remote`, `local`, `web_app`
    pub exploit_type: Option<String>,
    pub platform: Option<String>,
    pub language: Option<String>,
    /// Location of the exploit file
    pub path: Option<String>,
    pub added_date: NaiveDateTime,
}

impl ExploitEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            cve_id: None,
            exploit_type: None,
            platform: None,
            language: None,
            path: None,
            added_date: now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_cve(mut self, cve_id: impl Into<String>) -> Self {
        self.cve_id = Some(cve_id.into());
        self
    }

    pub fn with_exploit_type(mut self, exploit_type: impl Into<String>) -> Self {
        self.exploit_type = Some(exploit_type.into());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// One finding produced by a code analysis scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeAnalysisReport {
    pub id: Option<i64>,
    /// Advisory link to the originating scan; never cascaded
    pub scan_id: Option<i64>,
    pub file_path: String,
    /// e.g. `Vulnerability`, `BadPractice`, `InformationLeak`
    pub issue_type: String,
    /// `Critical`, `High`, `Medium`, `Low` or `Informational` by convention
    pub severity: String,
    pub description: Option<String>,
    pub line_number: Option<u32>,
    pub code_snippet: Option<String>,
    pub analysis_date: NaiveDateTime,
    pub status: ReportStatus,
}

impl CodeAnalysisReport {
    pub fn new(
        file_path: impl Into<String>,
        issue_type: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            scan_id: None,
            file_path: file_path.into(),
            issue_type: issue_type.into(),
            severity: severity.into(),
            description: None,
            line_number: None,
            code_snippet: None,
            analysis_date: now(),
            status: ReportStatus::New,
        }
    }

    pub fn with_scan(mut self, scan_id: i64) -> Self {
        self.scan_id = Some(scan_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_line(mut self, line_number: u32) -> Self {
        self.line_number = Some(line_number);
        self
    }

    pub fn with_snippet(mut self, code_snippet: impl Into<String>) -> Self {
        self.code_snippet = Some(code_snippet.into());
        self
    }
}

/// Any one row of the store, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Scan(Scan),
    Wordlist(WordlistEntry),
    Exploit(ExploitEntry),
    Report(CodeAnalysisReport),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Scan(_) => EntityKind::Scan,
            Entity::Wordlist(_) => EntityKind::Wordlist,
            Entity::Exploit(_) => EntityKind::Exploit,
            Entity::Report(_) => EntityKind::Report,
        }
    }

    /// Store-assigned id, if the entity has been persisted
    pub fn id(&self) -> Option<i64> {
        match self {
            Entity::Scan(s) => s.id,
            Entity::Wordlist(w) => w.id,
            Entity::Exploit(e) => e.id,
            Entity::Report(r) => r.id,
        }
    }
}

impl From<Scan> for Entity {
    fn from(scan: Scan) -> Self {
        Entity::Scan(scan)
    }
}

impl From<WordlistEntry> for Entity {
    fn from(entry: WordlistEntry) -> Self {
        Entity::Wordlist(entry)
    }
}

impl From<ExploitEntry> for Entity {
    fn from(entry: ExploitEntry) -> Self {
        Entity::Exploit(entry)
    }
}

impl From<CodeAnalysisReport> for Entity {
    fn from(report: CodeAnalysisReport) -> Self {
        Entity::Report(report)
    }
}
