use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::tracker::{IssueTracker, NewIssue};

pub const DEFAULT_CSV: &str = "verisphere_mvp_tasks.csv";

#[derive(Debug, Deserialize)]
struct TaskRow {
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Body", default)]
    body: String,
    #[serde(rename = "Labels", default)]
    labels: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BulkSummary {
    pub created: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Split a comma-separated label cell, dropping blanks and making sure the
/// `bounty` tag is present so the sync workflow picks the issue up.
pub fn normalize_labels(raw: &str) -> Vec<String> {
    let mut labels: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();
    if !labels.iter().any(|l| l.eq_ignore_ascii_case("bounty")) {
        labels.push("bounty".to_string());
    }
    labels
}

impl From<TaskRow> for NewIssue {
    fn from(row: TaskRow) -> Self {
        NewIssue {
            title: row.title.trim().to_string(),
            body: row.body.trim().to_string(),
            labels: normalize_labels(&row.labels),
        }
    }
}

/// Read every row of the task list. Short rows fill the missing trailing
/// columns with blanks; a row that still cannot be read is returned as its
/// error so the caller can skip just that row.
fn read_tasks(path: &Path) -> Result<Vec<csv::Result<NewIssue>>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("CSV file not found: {}", path.display()))?;

    Ok(reader
        .deserialize::<TaskRow>()
        .map(|record| record.map(NewIssue::from))
        .collect())
}

/// Create one tracker issue per CSV row, skipping titles that already exist.
///
/// Per-row failures are logged and counted; only an unreadable CSV aborts.
pub async fn create_from_csv(
    tracker: &dyn IssueTracker,
    path: &Path,
    relabel_delay: Duration,
) -> Result<BulkSummary> {
    info!(tracker = tracker.name(), csv = %path.display(), "using CSV");
    let tasks = read_tasks(path)?;
    let mut summary = BulkSummary::default();

    for (idx, task) in tasks.into_iter().enumerate() {
        let task = match task {
            Ok(task) => task,
            Err(e) => {
                // +2: one for the header, one for 1-based numbering
                warn!(row = idx + 2, error = %e, "skipping malformed CSV row");
                summary.skipped += 1;
                continue;
            }
        };
        if task.title.is_empty() {
            warn!("skipping row with empty title");
            summary.skipped += 1;
            continue;
        }
        info!(title = %task.title, "preparing issue");

        match tracker.find_by_title(&task.title).await {
            Ok(Some(url)) => {
                warn!(%url, "issue already exists");
                summary.duplicates += 1;
                continue;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not fetch existing issues"),
        }

        let created = match tracker.create_issue(&task).await {
            Ok(created) => created,
            Err(e) => {
                warn!(title = %task.title, error = %e, "failed to create issue");
                summary.failed += 1;
                continue;
            }
        };
        info!(url = %created.url, "created issue");
        summary.created += 1;

        tokio::time::sleep(relabel_delay).await;
        match tracker.set_labels(created.number, &task.labels).await {
            Ok(()) => info!(number = created.number, "labeled event triggered"),
            Err(e) => warn!(number = created.number, error = %e, "failed to trigger labeled event"),
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::CreatedIssue;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockTracker {
        existing: Vec<String>,
        created: Mutex<Vec<NewIssue>>,
        relabeled: Mutex<Vec<(u64, Vec<String>)>>,
        fail_listing: bool,
        fail_create_for: Option<String>,
    }

    #[async_trait]
    impl IssueTracker for MockTracker {
        fn name(&self) -> &str {
            "mock"
        }

        async fn find_by_title(&self, title: &str) -> Result<Option<String>> {
            if self.fail_listing {
                anyhow::bail!("Mock failure");
            }
            Ok(self
                .existing
                .iter()
                .find(|t| t.trim() == title.trim())
                .map(|t| format!("https://example.test/{t}")))
        }

        async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue> {
            if self.fail_create_for.as_deref() == Some(issue.title.as_str()) {
                anyhow::bail!("Mock failure");
            }
            let mut created = self.created.lock().unwrap();
            created.push(issue.clone());
            let number = created.len() as u64;
            Ok(CreatedIssue {
                number,
                url: format!("https://example.test/issues/{number}"),
            })
        }

        async fn set_labels(&self, number: u64, labels: &[String]) -> Result<()> {
            self.relabeled.lock().unwrap().push((number, labels.to_vec()));
            Ok(())
        }
    }

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), contents).unwrap();
        file
    }

    #[test]
    fn normalize_adds_bounty_once() {
        assert_eq!(normalize_labels("phase:1, hours:40 ,"), vec!["phase:1", "hours:40", "bounty"]);
        assert_eq!(normalize_labels("Bounty,phase:2"), vec!["Bounty", "phase:2"]);
        assert_eq!(normalize_labels(""), vec!["bounty"]);
    }

    #[test]
    fn bounty_value_label_still_gets_bare_tag() {
        assert_eq!(normalize_labels("bounty:5000"), vec!["bounty:5000", "bounty"]);
    }

    #[tokio::test]
    async fn creates_new_rows_and_skips_the_rest() {
        let csv = write_csv(
            "Title,Body,Labels\n\
             Staking engine,\"Task ID: 2.1\nPhase: 2\",\"phase:2,hours:120\"\n\
             Existing task,body,\n\
             ,orphan body,\n\
             Governance hub,Task ID: 3.1,bounty\n",
        );
        let tracker = MockTracker {
            existing: vec!["Existing task".into()],
            ..Default::default()
        };

        let summary = create_from_csv(&tracker, csv.path(), Duration::ZERO).await.unwrap();

        assert_eq!(
            summary,
            BulkSummary {
                created: 2,
                duplicates: 1,
                skipped: 1,
                failed: 0
            }
        );
        let created = tracker.created.lock().unwrap();
        assert_eq!(created[0].title, "Staking engine");
        assert_eq!(created[0].body, "Task ID: 2.1\nPhase: 2");
        assert_eq!(created[0].labels, vec!["phase:2", "hours:120", "bounty"]);
        assert_eq!(created[1].labels, vec!["bounty"]);

        let relabeled = tracker.relabeled.lock().unwrap();
        assert_eq!(relabeled.len(), 2);
        assert_eq!(relabeled[0], (1, vec!["phase:2".to_string(), "hours:120".into(), "bounty".into()]));
    }

    #[tokio::test]
    async fn listing_failure_does_not_block_creation() {
        let csv = write_csv("Title,Body,Labels\nA,,\n");
        let tracker = MockTracker {
            fail_listing: true,
            ..Default::default()
        };
        let summary = create_from_csv(&tracker, csv.path(), Duration::ZERO).await.unwrap();
        assert_eq!(summary.created, 1);
    }

    #[tokio::test]
    async fn create_failure_moves_on() {
        let csv = write_csv("Title,Body,Labels\nA,,\nB,,\n");
        let tracker = MockTracker {
            fail_create_for: Some("A".into()),
            ..Default::default()
        };
        let summary = create_from_csv(&tracker, csv.path(), Duration::ZERO).await.unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.created, 1);
        assert_eq!(tracker.relabeled.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_columns_default_to_empty() {
        let csv = write_csv("Title\nOnly a title\n");
        let tracker = MockTracker::default();
        let summary = create_from_csv(&tracker, csv.path(), Duration::ZERO).await.unwrap();
        assert_eq!(summary.created, 1);
        assert_eq!(tracker.created.lock().unwrap()[0].body, "");
    }

    #[tokio::test]
    async fn short_row_uses_blank_columns() {
        let csv = write_csv("Title,Body,Labels\nA,body,phase:1\nB\nC,body,\n");
        let tracker = MockTracker::default();

        let summary = create_from_csv(&tracker, csv.path(), Duration::ZERO).await.unwrap();

        assert_eq!(summary.created, 3);
        assert_eq!(summary.skipped, 0);
        let created = tracker.created.lock().unwrap();
        let titles: Vec<&str> = created.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert_eq!(created[1].body, "");
        assert_eq!(created[1].labels, vec!["bounty"]);
    }

    #[tokio::test]
    async fn unreadable_row_is_skipped_not_fatal() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut bytes = b"Title,Body,Labels\nA,,\n".to_vec();
        bytes.extend_from_slice(b"\xff\xfe,,\nC,,\n");
        std::fs::write(file.path(), bytes).unwrap();
        let tracker = MockTracker::default();

        let summary = create_from_csv(&tracker, file.path(), Duration::ZERO).await.unwrap();

        assert_eq!(summary.created, 2);
        assert_eq!(summary.skipped, 1);
    }

    #[tokio::test]
    async fn missing_csv_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = MockTracker::default();
        let err = create_from_csv(&tracker, &dir.path().join("nope.csv"), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("CSV file not found"));
    }
}
