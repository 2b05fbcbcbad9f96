pub mod issue;
pub mod ledger;
