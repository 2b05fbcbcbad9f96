use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::model::ledger::LedgerRow;

/// A spreadsheet-like store of ledger rows, keyed by its first column.
#[async_trait]
pub trait Ledger: Send + Sync {
    fn name(&self) -> &str;
    /// Values of the first column, top to bottom. Index 0 is sheet row 1.
    async fn id_column(&self) -> Result<Vec<String>>;
    async fn append_row(&self, row: &LedgerRow) -> Result<()>;
    /// Overwrite the row at 1-based sheet row `row_number`.
    async fn update_row(&self, row_number: usize, row: &LedgerRow) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Appended,
    Updated { row_number: usize },
}

/// 1-based row number of the first cell whose trimmed value equals `id`.
pub fn find_row(id_column: &[String], id: &str) -> Option<usize> {
    id_column
        .iter()
        .position(|cell| cell.trim() == id)
        .map(|idx| idx + 1)
}

/// Update the row whose first column matches the row's ID, or append it.
pub async fn upsert(ledger: &dyn Ledger, row: &LedgerRow) -> Result<UpsertOutcome> {
    let id = row.id();
    let ids = ledger.id_column().await?;

    match find_row(&ids, id) {
        Some(row_number) => {
            ledger.update_row(row_number, row).await?;
            info!(ledger = ledger.name(), task_id = id, row_number, "updated existing row");
            Ok(UpsertOutcome::Updated { row_number })
        }
        None => {
            ledger.append_row(row).await?;
            info!(ledger = ledger.name(), task_id = id, "appended new row");
            Ok(UpsertOutcome::Appended)
        }
    }
}
