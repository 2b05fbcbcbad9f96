use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tracing::{info, warn};

use crate::config::{DryRunReason, SheetTarget, WriteMode};
use crate::extract::extract;
use crate::ledger::{upsert, Ledger, UpsertOutcome};
use crate::model::issue::{IssueEvent, IssueRecord};
use crate::model::ledger::LedgerRow;
use crate::sheets::SheetsLedger;

/// Opens the ledger a live sync writes to.
#[async_trait]
pub trait Connect: Send + Sync {
    async fn connect(&self, target: &SheetTarget) -> Result<Box<dyn Ledger>>;
}

pub struct SheetsConnector;

#[async_trait]
impl Connect for SheetsConnector {
    async fn connect(&self, target: &SheetTarget) -> Result<Box<dyn Ledger>> {
        let ledger = SheetsLedger::connect(target)
            .await
            .context("Failed to authenticate with Google Sheets")?;
        Ok(Box::new(ledger))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoEventFile,
    NotIssueEvent,
    NoBountyLabel,
}

#[derive(Debug)]
pub enum SyncOutcome {
    Skipped(SkipReason),
    DryRun {
        row: LedgerRow,
        reason: DryRunReason,
    },
    Written {
        row: LedgerRow,
        outcome: UpsertOutcome,
    },
}

/// What the event file yielded.
#[derive(Debug)]
pub enum Loaded {
    Issue(IssueRecord),
    Skip(SkipReason),
}

/// Read the event file. A missing file or a non-issue payload is a skip, not
/// an error; unreadable JSON is an error.
pub fn load_issue(event_path: Option<&Path>) -> Result<Loaded> {
    let Some(path) = event_path.filter(|p| p.exists()) else {
        warn!(path = ?event_path, "no event file found");
        return Ok(Loaded::Skip(SkipReason::NoEventFile));
    };
    info!(path = %path.display(), "reading event file");

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read event file {}", path.display()))?;
    let event: IssueEvent = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse event file {}", path.display()))?;

    match event.issue {
        Some(issue) => {
            info!(action = event.action.as_deref().unwrap_or("-"), number = ?issue.number, "issue event");
            Ok(Loaded::Issue(issue))
        }
        None => {
            warn!("not an issue event");
            Ok(Loaded::Skip(SkipReason::NotIssueEvent))
        }
    }
}

/// Gate, extract and write one issue.
pub async fn sync_issue(
    issue: &IssueRecord,
    mode: &WriteMode,
    connector: &dyn Connect,
) -> Result<SyncOutcome> {
    if !issue.has_bounty_label() {
        warn!(number = ?issue.number, "no bounty label present; skipping sync");
        return Ok(SyncOutcome::Skipped(SkipReason::NoBountyLabel));
    }

    let row = extract(issue);
    info!(number = ?issue.number, task_id = row.id(), "issue mapped to ledger row");
    info!(row = ?row.cells(), "row to upsert");

    let target = match mode {
        WriteMode::DryRun(reason) => {
            info!(%reason, "dry run only; ledger not touched");
            return Ok(SyncOutcome::DryRun {
                row,
                reason: *reason,
            });
        }
        WriteMode::Live(target) => target,
    };

    let ledger = connector.connect(target).await?;
    let outcome = upsert(ledger.as_ref(), &row)
        .await
        .with_context(|| format!("Failed to upsert task {} into {}", row.id(), ledger.name()))?;
    info!("sync complete");
    Ok(SyncOutcome::Written { row, outcome })
}

/// Full sync run for one event file.
pub async fn run(
    event_path: Option<&Path>,
    mode: &WriteMode,
    connector: &dyn Connect,
) -> Result<SyncOutcome> {
    match load_issue(event_path)? {
        Loaded::Issue(issue) => sync_issue(&issue, mode, connector).await,
        Loaded::Skip(reason) => Ok(SyncOutcome::Skipped(reason)),
    }
}
