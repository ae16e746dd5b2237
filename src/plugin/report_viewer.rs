//! Code analysis report viewer
//!
//! Lists every code-analysis finding, shows a detail view per finding and
//! lets a finding's triage status be changed. A failed status change leaves
//! the listed rows as they were and puts a notice on the surface.

use crate::Result;
use crate::entity::{CodeAnalysisReport, ReportStatus};
use crate::storage::SqliteStore;
use crate::ui::table::TableBuilder;
use super::contract::{Lifecycle, Plugin, PluginInfo, PluginStatus, RunOptions};
use super::registry::PluginContext;
use super::surface::{MountPoint, Surface};
use tracing::{debug, info};

pub static INFO: PluginInfo = PluginInfo {
    name: "Code Analysis Reports",
    category: "analysis_viewer",
    stream_type: "code_analysis",
    description: "Shows findings from code analysis scans and their triage status.",
    author: "Tesseract Core Team",
    version: "0.1",
};

const COLUMNS: &[&str] = &[
    "ID", "File Path", "Issue Type", "Severity", "Description", "Line", "Snippet", "Date", "Status",
];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct ReportViewer {
    store: SqliteStore,
    surface: Option<Surface>,
    reports: Vec<CodeAnalysisReport>,
    lifecycle: Lifecycle,
}

impl ReportViewer {
    pub fn new(store: SqliteStore) -> Self {
        Self {
            store,
            surface: None,
            reports: Vec::new(),
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn factory(context: &PluginContext) -> Result<Box<dyn Plugin>> {
        Ok(Box::new(Self::new(context.open_store()?)))
    }

    /// Reports as of the last refresh
    pub fn reports(&self) -> &[CodeAnalysisReport] {
        &self.reports
    }

    /// Reload reports from the store and redraw
    pub fn refresh_reports(&mut self) -> usize {
        self.reports = self.store.list_reports();
        self.redraw();
        info!(count = self.reports.len(), "Loaded code analysis reports");
        self.reports.len()
    }

    /// Change a report's status, then reload.
    ///
    /// On failure the previous rows stay on screen with an error notice.
    pub fn save_status(&mut self, report_id: i64, status: ReportStatus) -> Result<()> {
        match self.store.update_report_status(report_id, status) {
            Ok(()) => {
                self.refresh_reports();
                self.notify(format!("Status for report {} updated to '{}'.", report_id, status));
                Ok(())
            }
            Err(e) => {
                self.notify(format!("Failed to update status for report {}: {}", report_id, e));
                Err(e)
            }
        }
    }

    /// Detail view of one listed report, with the statuses it can move to
    pub fn detail(&self, report_id: i64) -> Option<String> {
        let report = self.reports.iter().find(|r| r.id == Some(report_id))?;

        let mut builder = TableBuilder::new();
        builder.add_row("ID", &report_id.to_string());
        if let Some(scan_id) = report.scan_id {
            builder.add_row("Scan", &scan_id.to_string());
        }
        builder.add_row("File Path", &report.file_path);
        builder.add_row("Issue Type", &report.issue_type);
        builder.add_row("Severity", &report.severity);
        builder.add_row("Description", report.description.as_deref().unwrap_or(""));
        builder.add_row("Line Number", &line_label(report.line_number));
        builder.add_row("Code Snippet", report.code_snippet.as_deref().unwrap_or(""));
        builder.add_row("Analysis Date", &report.analysis_date.format(DATE_FORMAT).to_string());
        builder.add_row("Status", report.status.as_str());

        let options: Vec<&str> = ReportStatus::all().iter().map(|s| s.as_str()).collect();
        builder.add_row("Update Status", &options.join(" | "));
        Some(builder.build())
    }

    fn notify(&self, message: String) {
        if let Some(surface) = &self.surface {
            surface.set_notice(Some(message));
        }
    }

    fn redraw(&self) {
        let Some(surface) = &self.surface else {
            debug!("Report viewer not mounted, skipping redraw");
            return;
        };
        surface.set_rows(self.reports.iter().map(report_row).collect());
        surface.set_notice(None);
    }
}

fn line_label(line: Option<u32>) -> String {
    line.map(|l| l.to_string()).unwrap_or_else(|| "N/A".to_string())
}

fn report_row(report: &CodeAnalysisReport) -> Vec<String> {
    vec![
        report.id.map(|id| id.to_string()).unwrap_or_default(),
        report.file_path.clone(),
        report.issue_type.clone(),
        report.severity.clone(),
        report.description.clone().unwrap_or_default(),
        line_label(report.line_number),
        report.code_snippet.clone().unwrap_or_default(),
        report.analysis_date.format(DATE_FORMAT).to_string(),
        report.status.to_string(),
    ]
}

impl Plugin for ReportViewer {
    fn info(&self) -> &'static PluginInfo {
        &INFO
    }

    fn create_gui(&mut self, mount: &MountPoint) -> Result<Surface> {
        let surface = Surface::new(mount, "Code Analysis Reports", COLUMNS);
        self.surface = Some(surface.clone());
        self.redraw();
        Ok(surface)
    }

    fn run(&mut self, options: &RunOptions) -> Result<()> {
        self.lifecycle.start(options);
        self.refresh_reports();
        info!(plugin = INFO.name, "Plugin started");
        Ok(())
    }

    fn stop(&mut self) {
        self.lifecycle.stop();
        info!(plugin = INFO.name, "Plugin stopped");
    }

    fn update_gui(&mut self) -> Result<()> {
        self.refresh_reports();
        Ok(())
    }

    fn get_status(&self) -> PluginStatus {
        self.lifecycle.status(&INFO)
    }
}
