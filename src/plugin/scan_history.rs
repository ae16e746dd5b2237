//! Scan history viewer: every scan with the number of findings it produced

use crate::Result;
use crate::entity::Scan;
use crate::storage::SqliteStore;
use super::contract::{Lifecycle, Plugin, PluginInfo, PluginStatus, RunOptions};
use super::registry::PluginContext;
use super::surface::{MountPoint, Surface};
use std::collections::HashMap;

pub static INFO: PluginInfo = PluginInfo {
    name: "Scan History",
    category: "scan_viewer",
    stream_type: "scan",
    description: "Lists recorded scans with their finding counts.",
    author: "Tesseract Core Team",
    version: "0.1",
};

const COLUMNS: &[&str] = &["ID", "Type", "Target", "Status", "Started", "Finished", "Reports"];

pub struct ScanHistory {
    store: SqliteStore,
    surface: Option<Surface>,
    lifecycle: Lifecycle,
}

impl ScanHistory {
    pub fn new(store: SqliteStore) -> Self {
        Self { store, surface: None, lifecycle: Lifecycle::new() }
    }

    pub fn factory(context: &PluginContext) -> Result<Box<dyn Plugin>> {
        Ok(Box::new(Self::new(context.open_store()?)))
    }

    fn rows(&self) -> Vec<Vec<String>> {
        let mut counts: HashMap<i64, usize> = HashMap::new();
        for report in self.store.list_reports() {
            if let Some(scan_id) = report.scan_id {
                *counts.entry(scan_id).or_default() += 1;
            }
        }

        self.store
            .list_scans()
            .into_iter()
            .map(|scan| {
                let reports = scan.id.and_then(|id| counts.get(&id)).copied().unwrap_or(0);
                scan_row(scan, reports)
            })
            .collect()
    }
}

fn scan_row(scan: Scan, reports: usize) -> Vec<String> {
    vec![
        scan.id.map(|id| id.to_string()).unwrap_or_default(),
        scan.scan_type,
        scan.target,
        scan.status,
        scan.start_time.format("%Y-%m-%d %H:%M").to_string(),
        scan.end_time.map(|t| t.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_default(),
        reports.to_string(),
    ]
}

impl Plugin for ScanHistory {
    fn info(&self) -> &'static PluginInfo {
        &INFO
    }

    fn create_gui(&mut self, mount: &MountPoint) -> Result<Surface> {
        let surface = Surface::new(mount, "Scan History", COLUMNS);
        self.surface = Some(surface.clone());
        Ok(surface)
    }

    fn run(&mut self, options: &RunOptions) -> Result<()> {
        self.lifecycle.start(options);
        self.update_gui()
    }

    fn stop(&mut self) {
        self.lifecycle.stop();
    }

    fn update_gui(&mut self) -> Result<()> {
        if let Some(surface) = &self.surface {
            surface.set_rows(self.rows());
        }
        Ok(())
    }

    fn get_status(&self) -> PluginStatus {
        self.lifecycle.status(&INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::CodeAnalysisReport;
    use tempfile::TempDir;

    #[test]
    fn test_rows_count_reports_per_scan() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path().join("history.db")).unwrap();
        let busy = store.add(Scan::new("initial_code_scan", "core", "completed")).unwrap();
        store.add(Scan::new("network", "lan", "running")).unwrap();
        for _ in 0..3 {
            store.add(CodeAnalysisReport::new("x.py", "Vulnerability", "High").with_scan(busy)).unwrap();
        }

        let mut plugin = ScanHistory::new(store);
        let surface = plugin.create_gui(&MountPoint::new("scans")).unwrap();
        plugin.run(&RunOptions::default()).unwrap();

        let rows = surface.snapshot().rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][6], "3");
        assert_eq!(rows[1][6], "0");
        assert_eq!(rows[1][5], "");
    }
}
