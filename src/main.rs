//! Tesseract CLI - findings store and report viewer

mod commands;

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "tesseract")]
#[command(version)]
#[command(about = "Local store for security-scan findings, with pluggable viewers")]
#[command(long_about = r#"
Tesseract keeps scans, wordlists, exploit references and code-analysis
findings in a single SQLite file and shows them through display plugins.

Example usage:
  tesseract init --write-config
  tesseract seed
  tesseract report list
  tesseract report status 1 triaged
  tesseract view "Code Analysis Reports"
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./tesseract.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database tables if they are missing
    Init {
        /// Also write a tesseract.toml with the resolved settings
        #[arg(long)]
        write_config: bool,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Insert the demo scan and its findings (safe to repeat)
    Seed,

    /// Show row counts per table
    Stats,

    /// Manage scans
    #[command(subcommand)]
    Scan(ScanCommand),

    /// Manage wordlist entries
    #[command(subcommand)]
    Word(WordCommand),

    /// Manage exploit references
    #[command(subcommand)]
    Exploit(ExploitCommand),

    /// Manage code-analysis findings
    #[command(subcommand)]
    Report(ReportCommand),

    /// List display plugins and their status
    Plugins,

    /// Render one plugin (or all of them)
    View {
        /// Plugin name, e.g. "Code Analysis Reports"
        name: Option<String>,

        /// Refresh and re-render this many times at the configured interval
        #[arg(long, default_value = "0")]
        ticks: u32,
    },
}

#[derive(Subcommand)]
pub enum ScanCommand {
    /// Record a scan
    Add {
        scan_type: String,
        target: String,

        #[arg(short, long, default_value = "completed")]
        status: String,

        /// Raw results payload, typically JSON
        #[arg(short, long)]
        results: Option<String>,

        /// Set the end time to now
        #[arg(long)]
        finished: bool,
    },
    /// List scans
    List,
    /// Show a scan and its findings
    Show { id: i64 },
    /// Delete a scan (its findings are kept)
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum WordCommand {
    /// Add a word; duplicates are rejected
    Add {
        word: String,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        source: Option<String>,
    },
    List,
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum ExploitCommand {
    /// Add an exploit reference; names are unique
    Add {
        name: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        cve: Option<String>,

        #[arg(long = "type")]
        exploit_type: Option<String>,

        #[arg(long)]
        platform: Option<String>,

        #[arg(long)]
        language: Option<String>,

        #[arg(long)]
        path: Option<String>,
    },
    List,
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum ReportCommand {
    /// Record a finding
    Add {
        file_path: String,
        issue_type: String,
        severity: String,

        #[arg(long)]
        scan: Option<i64>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        line: Option<u32>,

        #[arg(long)]
        snippet: Option<String>,
    },
    /// List findings, optionally for one scan
    List {
        #[arg(long)]
        scan: Option<i64>,
    },
    /// Show one finding in detail
    Show { id: i64 },
    /// Change a finding's triage status (New, Triaged, FalsePositive, Fixed, Ignored)
    Status { id: i64, status: String },
    Delete { id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        *self == OutputMode::Human
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    ok: bool,
    command: &'a str,
    data: T,
}

/// Print a JSON success envelope
pub fn emit_success<T: Serialize>(mode: OutputMode, command: &str, data: T) -> anyhow::Result<()> {
    if mode == OutputMode::Json {
        let envelope = Envelope { ok: true, command, data };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };
    let config = tesseract::config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let database = config.database_path(cli.database.as_deref());
    tracing::debug!("Using database {}", database.display());

    let ctx = commands::Context {
        output_mode,
        database,
        config,
        config_path: cli.config.unwrap_or_else(tesseract::config::default_config_path),
    };

    match cli.command {
        Commands::Init { write_config, force } => commands::run_init(&ctx, write_config, force),
        Commands::Seed => commands::run_seed(&ctx),
        Commands::Stats => commands::run_stats(&ctx),
        Commands::Scan(cmd) => commands::run_scan(&ctx, cmd),
        Commands::Word(cmd) => commands::run_word(&ctx, cmd),
        Commands::Exploit(cmd) => commands::run_exploit(&ctx, cmd),
        Commands::Report(cmd) => commands::run_report(&ctx, cmd),
        Commands::Plugins => commands::run_plugins(&ctx),
        Commands::View { name, ticks } => commands::run_view(&ctx, name.as_deref(), ticks),
    }
}
