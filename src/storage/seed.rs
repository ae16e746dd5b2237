//! Demo dataset
//!
//! One completed `initial_code_scan` and five findings against it. Seeding is
//! idempotent: the scan is reused if present and reports are only added when
//! the scan has none.

use chrono::Duration;
use serde::Serialize;
use tracing::info;
use crate::Result;
use crate::entity::{now, CodeAnalysisReport, Scan};
use super::SqliteStore;

pub const DEMO_SCAN_TYPE: &str = "initial_code_scan";
pub const DEMO_TARGET: &str = "Tesseract_Core_Modules";

/// What a seeding run changed
#[derive(Debug, Clone, Serialize)]
pub struct SeedSummary {
    pub scan_id: i64,
    pub scan_created: bool,
    pub reports_added: usize,
}

fn demo_reports(scan_id: i64) -> Vec<CodeAnalysisReport> {
    vec![
        CodeAnalysisReport::new("/tesseract/core/agents/ai_logic.py", "Vulnerability", "Critical")
            .with_scan(scan_id)
            .with_description("Hardcoded API key found in AI agent communication module.")
            .with_line(123)
            .with_snippet("api_key = \"sk_hardcoded_secret_123\""),
        CodeAnalysisReport::new("/tesseract/plugins/network_scanner.py", "BadPractice", "Medium")
            .with_scan(scan_id)
            .with_description("Use of os.system() instead of subprocess.run() for external commands.")
            .with_line(45)
            .with_snippet("os.system(\"nmap -sV \" + target_ip)"),
        CodeAnalysisReport::new("/tesseract/db_manager.py", "Informational", "Low")
            .with_scan(scan_id)
            .with_description("Missing index on \"description\" column in ExploitEntry table (potential performance issue).")
            .with_snippet("class ExploitEntry(Base): ... description = Column(Text)"),
        CodeAnalysisReport::new("/tesseract/core/krypto/hash_cracker.py", "Vulnerability", "High")
            .with_scan(scan_id)
            .with_description("Weak hashing algorithm (MD5) used for internal password storage.")
            .with_line(78)
            .with_snippet("hashed_pass = hashlib.md5(password.encode()).hexdigest()"),
        CodeAnalysisReport::new("/tesseract/utils/log_parser.py", "InformationLeak", "Medium")
            .with_scan(scan_id)
            .with_description("Sensitive data (IP addresses) logged without redaction.")
            .with_line(20)
            .with_snippet("logger.info(f\"Connection from {client_ip}\")"),
    ]
}

impl SqliteStore {
    /// Insert the demo scan and its findings if they are not already present
    pub fn seed_demo_data(&self) -> Result<SeedSummary> {
        let (scan_id, scan_created) = match self.find_scan_by_type(DEMO_SCAN_TYPE)? {
            Some(Scan { id: Some(id), .. }) => {
                info!(scan_id = id, "Demo scan already exists");
                (id, false)
            }
            _ => {
                let finished = now();
                let scan = Scan::new(DEMO_SCAN_TYPE, DEMO_TARGET, "completed")
                    .with_start_time(finished - Duration::days(7))
                    .with_end_time(finished)
                    .with_results(r#"{"files_scanned": 150, "total_issues": 10}"#);
                (self.add(scan)?, true)
            }
        };

        let mut reports_added = 0;
        if self.reports_for_scan(scan_id)?.is_empty() {
            for report in demo_reports(scan_id) {
                self.add(report)?;
                reports_added += 1;
            }
        } else {
            info!(scan_id, "Demo reports already exist");
        }

        Ok(SeedSummary { scan_id, scan_created, reports_added })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityKind, ReportStatus};
    use tempfile::TempDir;

    #[test]
    fn test_seed_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path().join("seed.db")).unwrap();

        let first = store.seed_demo_data().unwrap();
        assert!(first.scan_created);
        assert_eq!(first.reports_added, 5);

        let second = store.seed_demo_data().unwrap();
        assert!(!second.scan_created);
        assert_eq!(second.reports_added, 0);
        assert_eq!(second.scan_id, first.scan_id);

        assert_eq!(store.count(EntityKind::Scan).unwrap(), 1);
        assert_eq!(store.count(EntityKind::Report).unwrap(), 5);
    }

    #[test]
    fn test_seed_contents() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path().join("seed.db")).unwrap();
        let summary = store.seed_demo_data().unwrap();

        let scan = store.get_scan(summary.scan_id).unwrap().unwrap();
        assert_eq!(scan.target, DEMO_TARGET);
        assert_eq!(scan.results_json().unwrap()["files_scanned"], 150);
        assert!(scan.end_time.unwrap() > scan.start_time);

        let reports = store.reports_for_scan(summary.scan_id).unwrap();
        let severities: Vec<_> = reports.iter().map(|r| r.severity.as_str()).collect();
        assert_eq!(severities, ["Critical", "Medium", "Low", "High", "Medium"]);
        assert!(reports.iter().all(|r| r.status == ReportStatus::New));
        assert_eq!(reports[2].line_number, None);
    }
}
