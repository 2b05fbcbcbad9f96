pub mod rules;
pub mod sections;

use crate::model::issue::IssueRecord;
use crate::model::ledger::LedgerRow;

use rules::{Context, RULES};

/// Derive a ledger row from an issue.
///
/// Never fails: body text takes precedence over `prefix:value` labels, which
/// take precedence over the tracker's own fields, and a column with no value
/// anywhere is left as the empty string.
pub fn extract(issue: &IssueRecord) -> LedgerRow {
    let cx = Context::new(issue);
    let mut row = LedgerRow::default();
    for rule in RULES.iter() {
        row.set(rule.column, rule.resolve(&cx));
    }
    row
}
