use crate::{emit_success, ExploitCommand, OutputMode, ReportCommand, ScanCommand, WordCommand};
use anyhow::Context as _;
use owo_colors::OwoColorize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tesseract::config::{write_config, TesseractConfig};
use tesseract::entity::now;
use tesseract::plugin::{default_registry, MountPoint, Plugin, PluginContext, ReportViewer, RunOptions, Surface};
use tesseract::ui::{self, Icons};
use tesseract::{
    CodeAnalysisReport, EntityKind, ExploitEntry, ReportStatus, Scan, SqliteStore, WordlistEntry,
};

/// Settings resolved from flags and config
pub struct Context {
    pub output_mode: OutputMode,
    pub database: PathBuf,
    pub config: TesseractConfig,
    pub config_path: PathBuf,
}

impl Context {
    fn store(&self) -> anyhow::Result<SqliteStore> {
        SqliteStore::open(&self.database)
            .with_context(|| format!("Failed to open database {}", self.database.display()))
    }

    fn is_human(&self) -> bool {
        self.output_mode.is_human()
    }
}

fn print_grid(title: &str, headers: &[&str], rows: Vec<Vec<String>>) {
    ui::section(title);
    if rows.is_empty() {
        println!("  {}", ui::dim("(no entries)"));
        return;
    }
    let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    println!("{}", ui::grid(&headers, &rows));
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn deleted(ctx: &Context, command: &str, kind: EntityKind, id: i64) -> anyhow::Result<()> {
    if ctx.is_human() {
        println!("{} Deleted {} {}", Icons::DEL, kind, id);
    }
    emit_success(ctx.output_mode, command, serde_json::json!({ "kind": kind, "id": id }))
}

fn added(ctx: &Context, command: &str, kind: EntityKind, id: i64) -> anyhow::Result<()> {
    if ctx.is_human() {
        ui::success(&format!("Added {} {}", kind, id));
    }
    emit_success(ctx.output_mode, command, serde_json::json!({ "kind": kind, "id": id }))
}

pub fn run_init(ctx: &Context, write: bool, force: bool) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let schema = store.initialize()?;

    if write {
        let config = TesseractConfig {
            database: Some(ctx.database.to_string_lossy().to_string()),
            ..ctx.config.clone()
        };
        write_config(&ctx.config_path, &config, force)?;
    }

    if ctx.is_human() {
        ui::header("Tesseract database ready");
        ui::info(&format!("{} Database", Icons::DATABASE), &store.path().display().to_string());
        for table in &schema.created {
            println!("  {} created {}", Icons::NEW, table);
        }
        for table in &schema.existing {
            ui::summary_row("exists", table);
        }
        if write {
            ui::info("Config", &ctx.config_path.display().to_string());
        }
    }
    emit_success(ctx.output_mode, "init", &schema)
}

pub fn run_seed(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let summary = store.seed_demo_data()?;

    if ctx.is_human() {
        if summary.scan_created {
            ui::success(&format!("Created demo scan {}", summary.scan_id));
        } else {
            ui::info("Demo scan already present", &summary.scan_id.to_string());
        }
        ui::summary_row("Findings added:", &summary.reports_added.to_string());
    }
    emit_success(ctx.output_mode, "seed", &summary)
}

pub fn run_stats(ctx: &Context) -> anyhow::Result<()> {
    let stats = ctx.store()?.stats()?;
    if ctx.is_human() {
        ui::section(&format!("{} Database Statistics", Icons::STATS));
        ui::summary_row("Scans:", &stats.scans.to_string());
        ui::summary_row("Wordlist entries:", &stats.wordlist.to_string());
        ui::summary_row("Exploits:", &stats.exploits.to_string());
        ui::summary_row("Reports:", &stats.reports.to_string());
    }
    emit_success(ctx.output_mode, "stats", &stats)
}

pub fn run_scan(ctx: &Context, cmd: ScanCommand) -> anyhow::Result<()> {
    let store = ctx.store()?;
    match cmd {
        ScanCommand::Add { scan_type, target, status, results, finished } => {
            if let Some(raw) = &results {
                if serde_json::from_str::<serde_json::Value>(raw).is_err() {
                    ui::warn("Results payload is not valid JSON; storing it as text");
                }
            }
            let mut scan = Scan::new(scan_type, target, status);
            if let Some(raw) = results {
                scan = scan.with_results(raw);
            }
            if finished {
                scan = scan.with_end_time(now());
            }
            let id = store.add(scan)?;
            added(ctx, "scan.add", EntityKind::Scan, id)
        }
        ScanCommand::List => {
            let scans = store.list_scans();
            if ctx.is_human() {
                let rows = scans
                    .iter()
                    .map(|s| {
                        vec![
                            s.id.map(|id| id.to_string()).unwrap_or_default(),
                            s.scan_type.clone(),
                            s.target.clone(),
                            s.status.clone(),
                            s.start_time.format("%Y-%m-%d %H:%M").to_string(),
                        ]
                    })
                    .collect();
                print_grid("Scans", &["ID", "Type", "Target", "Status", "Started"], rows);
            }
            emit_success(ctx.output_mode, "scan.list", &scans)
        }
        ScanCommand::Show { id } => {
            let scan = store
                .get_scan(id)?
                .with_context(|| format!("Scan {} not found", id))?;
            let reports = store.reports_for_scan(id)?;

            if ctx.is_human() {
                let mut table = ui::TableBuilder::new();
                table.add_row("ID", &id.to_string());
                table.add_row("Type", &scan.scan_type);
                table.add_row("Target", &scan.target);
                table.add_row("Status", &scan.status);
                table.add_row("Started", &scan.start_time.to_string());
                table.add_row(
                    "Finished",
                    &scan.end_time.map(|t| t.to_string()).unwrap_or_default(),
                );
                table.add_row("Results", &opt(&scan.results));
                table.add_row("Findings", &reports.len().to_string());
                println!("{}", table.build());
                if !reports.is_empty() {
                    ui::section("Findings by severity");
                    ui::severity_breakdown(&severity_counts(&reports));
                }
            }
            emit_success(
                ctx.output_mode,
                "scan.show",
                serde_json::json!({ "scan": scan, "reports": reports }),
            )
        }
        ScanCommand::Delete { id } => {
            store.delete_by_id(EntityKind::Scan, id)?;
            deleted(ctx, "scan.delete", EntityKind::Scan, id)
        }
    }
}

pub fn run_word(ctx: &Context, cmd: WordCommand) -> anyhow::Result<()> {
    let store = ctx.store()?;
    match cmd {
        WordCommand::Add { word, category, source } => {
            let mut entry = WordlistEntry::new(word.clone());
            if let Some(category) = category {
                entry = entry.with_category(category);
            }
            if let Some(source) = source {
                entry = entry.with_source(source);
            }
            let id = store
                .add(entry)
                .with_context(|| format!("Could not add word '{}'", word))?;
            added(ctx, "word.add", EntityKind::Wordlist, id)
        }
        WordCommand::List => {
            let words = store.list_wordlist();
            if ctx.is_human() {
                let rows = words
                    .iter()
                    .map(|w| {
                        vec![
                            w.id.map(|id| id.to_string()).unwrap_or_default(),
                            w.word.clone(),
                            opt(&w.category),
                            opt(&w.source),
                            w.added_date.format("%Y-%m-%d").to_string(),
                        ]
                    })
                    .collect();
                print_grid("Wordlist", &["ID", "Word", "Category", "Source", "Added"], rows);
            }
            emit_success(ctx.output_mode, "word.list", &words)
        }
        WordCommand::Delete { id } => {
            store.delete_by_id(EntityKind::Wordlist, id)?;
            deleted(ctx, "word.delete", EntityKind::Wordlist, id)
        }
    }
}

pub fn run_exploit(ctx: &Context, cmd: ExploitCommand) -> anyhow::Result<()> {
    let store = ctx.store()?;
    match cmd {
        ExploitCommand::Add { name, description, cve, exploit_type, platform, language, path } => {
            let mut entry = ExploitEntry::new(name.clone());
            if let Some(v) = description {
                entry = entry.with_description(v);
            }
            if let Some(v) = cve {
                entry = entry.with_cve(v);
            }
            if let Some(v) = exploit_type {
                entry = entry.with_exploit_type(v);
            }
            if let Some(v) = platform {
                entry = entry.with_platform(v);
            }
            if let Some(v) = language {
                entry = entry.with_language(v);
            }
            if let Some(v) = path {
                entry = entry.with_path(v);
            }
            let id = store
                .add(entry)
                .with_context(|| format!("Could not add exploit '{}'", name))?;
            added(ctx, "exploit.add", EntityKind::Exploit, id)
        }
        ExploitCommand::List => {
            let exploits = store.list_exploits();
            if ctx.is_human() {
                let rows = exploits
                    .iter()
                    .map(|e| {
                        vec![
                            e.id.map(|id| id.to_string()).unwrap_or_default(),
                            e.name.clone(),
                            opt(&e.cve_id),
                            opt(&e.exploit_type),
                            opt(&e.platform),
                            opt(&e.language),
                        ]
                    })
                    .collect();
                print_grid(
                    "Exploits",
                    &["ID", "Name", "CVE", "Type", "Platform", "Language"],
                    rows,
                );
            }
            emit_success(ctx.output_mode, "exploit.list", &exploits)
        }
        ExploitCommand::Delete { id } => {
            store.delete_by_id(EntityKind::Exploit, id)?;
            deleted(ctx, "exploit.delete", EntityKind::Exploit, id)
        }
    }
}

/// Findings per severity, known levels first from most to least severe
fn severity_counts(reports: &[CodeAnalysisReport]) -> Vec<(String, usize)> {
    const ORDER: [&str; 5] = ["critical", "high", "medium", "low", "informational"];

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for report in reports {
        *counts.entry(report.severity.clone()).or_default() += 1;
    }

    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by_key(|(severity, _)| {
        ORDER
            .iter()
            .position(|s| s.eq_ignore_ascii_case(severity))
            .unwrap_or(ORDER.len())
    });
    counts
}

pub fn run_report(ctx: &Context, cmd: ReportCommand) -> anyhow::Result<()> {
    let store = ctx.store()?;
    match cmd {
        ReportCommand::Add { file_path, issue_type, severity, scan, description, line, snippet } => {
            let mut report = CodeAnalysisReport::new(file_path, issue_type, severity);
            if let Some(scan_id) = scan {
                report = report.with_scan(scan_id);
            }
            if let Some(v) = description {
                report = report.with_description(v);
            }
            if let Some(v) = line {
                report = report.with_line(v);
            }
            if let Some(v) = snippet {
                report = report.with_snippet(v);
            }
            let id = store.add(report)?;
            added(ctx, "report.add", EntityKind::Report, id)
        }
        ReportCommand::List { scan } => {
            let reports = match scan {
                Some(scan_id) => store.reports_for_scan(scan_id)?,
                None => store.list_reports(),
            };
            if ctx.is_human() {
                let rows = reports
                    .iter()
                    .map(|r| {
                        vec![
                            r.id.map(|id| id.to_string()).unwrap_or_default(),
                            r.scan_id.map(|id| id.to_string()).unwrap_or_default(),
                            r.file_path.clone(),
                            r.issue_type.clone(),
                            r.severity.clone(),
                            r.line_number.map(|l| l.to_string()).unwrap_or_else(|| "N/A".to_string()),
                            r.status.to_string(),
                        ]
                    })
                    .collect();
                print_grid(
                    "Code Analysis Reports",
                    &["ID", "Scan", "File Path", "Issue Type", "Severity", "Line", "Status"],
                    rows,
                );
                if !reports.is_empty() {
                    println!();
                    ui::severity_breakdown(&severity_counts(&reports));
                }
            }
            emit_success(ctx.output_mode, "report.list", &reports)
        }
        ReportCommand::Show { id } => {
            let mut viewer = ReportViewer::new(store);
            viewer.refresh_reports();
            let detail = viewer
                .detail(id)
                .with_context(|| format!("Report {} not found", id))?;
            if ctx.is_human() {
                println!("{}", detail);
            }
            let report = viewer.reports().iter().find(|r| r.id == Some(id));
            emit_success(ctx.output_mode, "report.show", report)
        }
        ReportCommand::Status { id, status } => {
            let status: ReportStatus = status.parse()?;
            let mut viewer = ReportViewer::new(store);
            let surface = viewer.create_gui(&MountPoint::new("cli"))?;
            let result = viewer.save_status(id, status);
            let notice = surface.snapshot().notice.unwrap_or_default();

            match result {
                Ok(()) => {
                    if ctx.is_human() {
                        ui::success(&notice);
                    }
                    emit_success(
                        ctx.output_mode,
                        "report.status",
                        serde_json::json!({ "id": id, "status": status }),
                    )
                }
                Err(e) => {
                    if ctx.is_human() {
                        ui::error(&notice);
                    }
                    Err(e.into())
                }
            }
        }
        ReportCommand::Delete { id } => {
            store.delete_by_id(EntityKind::Report, id)?;
            deleted(ctx, "report.delete", EntityKind::Report, id)
        }
    }
}

fn registry(ctx: &Context) -> tesseract::PluginRegistry {
    let mut registry = default_registry(PluginContext::new(&ctx.database))
        .with_disabled(ctx.config.plugins.disabled.iter().cloned());
    registry.load_plugins();
    for skipped in registry.skipped() {
        let name = skipped.name.as_deref().unwrap_or("<unnamed>");
        ui::warn(&format!("Plugin {} skipped: {}", name, skipped.reason));
    }
    registry
}

pub fn run_plugins(ctx: &Context) -> anyhow::Result<()> {
    let registry = registry(ctx);

    if ctx.is_human() {
        ui::section(&format!("{} Plugins", Icons::PLUGIN));
        for name in registry.names() {
            if let Some(plugin) = registry.get_plugin(name) {
                let info = plugin.info();
                println!(
                    "  {} {} {}",
                    info.name.style(ui::theme().header),
                    ui::dim(&format!("v{} [{}/{}]", info.version, info.category, info.stream_type)),
                    plugin.get_status().state
                );
                println!("      {}", info.description);
            }
        }
    }

    let infos: Vec<_> = registry
        .names()
        .into_iter()
        .filter_map(|name| registry.get_plugin(name))
        .map(|p| serde_json::json!({ "info": p.info(), "status": p.get_status() }))
        .collect();
    emit_success(
        ctx.output_mode,
        "plugins",
        serde_json::json!({ "plugins": infos, "skipped": registry.skipped() }),
    )
}

pub fn run_view(ctx: &Context, name: Option<&str>, ticks: u32) -> anyhow::Result<()> {
    let mut registry = registry(ctx);
    let names: Vec<&'static str> = match name {
        Some(name) => {
            let plugin = registry
                .get_plugin(name)
                .with_context(|| format!("No plugin named '{}'", name))?;
            vec![plugin.info().name]
        }
        None => registry.names(),
    };

    let interval = ctx.config.refresh_interval();
    let options = RunOptions { refresh_interval: Some(interval) };
    let mut surfaces = Vec::new();
    for name in &names {
        if let Some(plugin) = registry.get_plugin_mut(name) {
            let surface = plugin.create_gui(&MountPoint::new(*name))?;
            plugin.run(&options)?;
            surfaces.push(surface);
        }
    }

    let render = |surfaces: &[Surface]| -> anyhow::Result<()> {
        if ctx.is_human() {
            for surface in surfaces {
                println!("{}", surface.render());
            }
            Ok(())
        } else {
            let frames: Vec<_> = surfaces.iter().map(|s| s.snapshot()).collect();
            emit_success(ctx.output_mode, "view", &frames)
        }
    };

    render(&surfaces)?;
    for _ in 0..ticks {
        std::thread::sleep(interval);
        let refreshed = registry.update_all();
        tracing::debug!(refreshed, "Periodic refresh");
        render(&surfaces)?;
    }

    registry.stop_all();
    Ok(())
}
