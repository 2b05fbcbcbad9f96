pub mod github;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    pub number: u64,
    pub url: String,
}

/// The issue tracker operations the bulk creator needs.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    fn name(&self) -> &str;
    /// URL of an existing issue (open or closed) whose trimmed title matches.
    async fn find_by_title(&self, title: &str) -> Result<Option<String>>;
    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue>;
    /// Replace the issue's labels. Re-sending the same set still emits a
    /// `labeled` event, which is what triggers the ledger sync.
    async fn set_labels(&self, number: u64, labels: &[String]) -> Result<()>;
}
