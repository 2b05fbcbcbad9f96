use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::bulk;
use crate::config::{self, WriteMode};
use crate::logging::LogFormat;
use crate::model::ledger::LedgerRow;
use crate::sync::{self, SheetsConnector, SyncOutcome};
use crate::tracker::github::GitHubTracker;

/// Mirror bounty-labelled GitHub issues into a Google Sheets ledger.
#[derive(Debug, Parser)]
#[command(name = "bounty-sync", version)]
pub struct Cli {
    /// Config file (default: ~/.bounty-sync/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// More output; repeat for more
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upsert the issue from a GitHub event payload into the ledger
    Sync(SyncArgs),
    /// Create GitHub issues from a CSV task list
    Create(CreateArgs),
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Event payload written by GitHub Actions
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event: Option<PathBuf>,

    /// Spreadsheet ID (overrides SHEET_ID and the config file)
    #[arg(long)]
    pub sheet_id: Option<String>,

    /// Worksheet name; the first sheet when omitted
    #[arg(long)]
    pub worksheet: Option<String>,

    /// Extract and print the row without writing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// CSV with Title, Body and Labels columns
    #[arg(default_value = bulk::DEFAULT_CSV)]
    pub csv: PathBuf,

    /// Target repository as owner/name (overrides GITHUB_REPOSITORY)
    #[arg(long)]
    pub repo: Option<String>,
}

pub async fn handle_sync(config_path: Option<PathBuf>, args: SyncArgs) -> Result<()> {
    info!("starting Sheets sync (upsert)");
    let mut config = config::load_config(config_path.as_deref())?;
    if args.sheet_id.is_some() {
        config.sheets.sheet_id = args.sheet_id;
    }
    if args.worksheet.is_some() {
        config.sheets.worksheet = args.worksheet;
    }

    let mode = config
        .sheets
        .write_mode(args.dry_run)
        .context("Invalid Sheets configuration")?;
    if let WriteMode::Live(target) = &mode {
        info!(sheet_id = %target.sheet_id, worksheet = target.worksheet.as_deref().unwrap_or("<first>"), "live write enabled");
    }

    match sync::run(args.event.as_deref(), &mode, &SheetsConnector).await? {
        SyncOutcome::Skipped(reason) => info!(?reason, "nothing to sync"),
        SyncOutcome::DryRun { row, reason } => {
            println!("Dry run ({reason}). Row that would be upserted:");
            print_row(&row);
        }
        SyncOutcome::Written { row, outcome } => {
            println!("Synced task {}: {outcome:?}", row.id());
        }
    }
    Ok(())
}

pub async fn handle_create(config_path: Option<PathBuf>, args: CreateArgs) -> Result<()> {
    let mut config = config::load_config(config_path.as_deref())?;
    if args.repo.is_some() {
        config.github.repo = args.repo;
    }
    let target = config.github.target()?;
    info!(repo = %target.repo, "creating issues");

    let tracker = GitHubTracker::new(&target);
    let summary = bulk::create_from_csv(&tracker, &args.csv, Duration::from_secs(1)).await?;

    println!(
        "Created {}, already existed {}, skipped {}, failed {}",
        summary.created, summary.duplicates, summary.skipped, summary.failed
    );
    Ok(())
}

fn print_row(row: &LedgerRow) {
    for (header, value) in LedgerRow::headers().iter().zip(row.cells()) {
        let shown = value.lines().next().unwrap_or("");
        let more = if value.lines().count() > 1 { " …" } else { "" };
        println!("  {header:<17} {shown}{more}");
    }
}
