use tempfile::TempDir;
use tesseract::plugin::{default_registry, MountPoint, PluginContext, RunOptions};
use tesseract::{CodeAnalysisReport, EntityKind, ReportStatus, Scan, SqliteStore};

#[test]
fn test_scan_with_findings_triage_flow() {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(dir.path().join("tesseract.db")).unwrap();

    let scan_id = store
        .add(Scan::new("initial_code_scan", "Tesseract_Core_Modules", "completed"))
        .unwrap();
    let mut report_ids = Vec::new();
    for severity in ["Critical", "Medium", "Low", "High", "Medium"] {
        let report = CodeAnalysisReport::new("core/module.py", "Vulnerability", severity).with_scan(scan_id);
        report_ids.push(store.add(report).unwrap());
    }

    store.update_report_status(report_ids[0], ReportStatus::Triaged).unwrap();

    let reports = store.list_reports();
    assert_eq!(reports.len(), 5);
    assert_eq!(reports[0].status, ReportStatus::Triaged);
    assert!(reports[1..].iter().all(|r| r.status == ReportStatus::New));
    assert!(reports.iter().all(|r| r.scan_id == Some(scan_id)));

    // Reopening the same file sees the same data
    let reopened = SqliteStore::open(store.path()).unwrap();
    assert_eq!(reopened.count(EntityKind::Report).unwrap(), 5);
    assert_eq!(reopened.get_report(report_ids[0]).unwrap().unwrap().status, ReportStatus::Triaged);
}

#[test]
fn test_registry_viewer_sees_seeded_findings() {
    let dir = TempDir::new().unwrap();
    let database = dir.path().join("tesseract.db");
    SqliteStore::open(&database).unwrap().seed_demo_data().unwrap();

    let mut registry = default_registry(PluginContext::new(&database));
    assert_eq!(registry.load_plugins(), 2);

    let viewer = registry.get_plugin_mut("Code Analysis Reports").unwrap();
    let surface = viewer.create_gui(&MountPoint::new("reports")).unwrap();
    viewer.run(&RunOptions::default()).unwrap();
    assert_eq!(surface.snapshot().rows.len(), 5);

    // A finding added behind the viewer's back shows up on the next tick
    SqliteStore::open(&database)
        .unwrap()
        .add(CodeAnalysisReport::new("late.py", "Informational", "Low"))
        .unwrap();
    assert_eq!(registry.update_all(), 1);
    assert_eq!(surface.snapshot().rows.len(), 6);

    registry.stop_all();
    assert!(registry.statuses().iter().all(|s| !s.is_running));
}
