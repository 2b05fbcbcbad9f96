use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{CreatedIssue, IssueTracker, NewIssue};
use crate::config::GitHubTarget;

const PER_PAGE: usize = 100;

pub struct GitHubTracker {
    issues_url: String,
    token: String,
    client: reqwest::Client,
}

impl GitHubTracker {
    pub fn new(target: &GitHubTarget) -> Self {
        Self {
            issues_url: format!(
                "{}/repos/{}/issues",
                target.api_base.trim_end_matches('/'),
                target.repo
            ),
            token: target.token.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("User-Agent", concat!("bounty-sync/", env!("CARGO_PKG_VERSION")))
    }
}

#[derive(Deserialize)]
struct GhIssue {
    number: u64,
    #[serde(default)]
    title: String,
    html_url: String,
}

async fn error_body(resp: reqwest::Response) -> String {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    format!("{status}: {}", text.chars().take(300).collect::<String>())
}

#[async_trait]
impl IssueTracker for GitHubTracker {
    fn name(&self) -> &str {
        "GitHub"
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<String>> {
        let wanted = title.trim();
        let mut page = 1usize;
        loop {
            let resp = self
                .request(reqwest::Method::GET, &self.issues_url)
                .query(&[
                    ("state", "all".to_string()),
                    ("per_page", PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ])
                .send()
                .await
                .context("GitHub API request failed")?;
            if !resp.status().is_success() {
                anyhow::bail!("Could not list issues: {}", error_body(resp).await);
            }

            let issues: Vec<GhIssue> =
                resp.json().await.context("Failed to parse GitHub issues")?;
            debug!(page, count = issues.len(), "listed issues");
            if let Some(issue) = issues.iter().find(|i| i.title.trim() == wanted) {
                return Ok(Some(issue.html_url.clone()));
            }
            if issues.len() < PER_PAGE {
                return Ok(None);
            }
            page += 1;
        }
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue> {
        let resp = self
            .request(reqwest::Method::POST, &self.issues_url)
            .json(issue)
            .send()
            .await
            .context("GitHub API request failed")?;
        if !resp.status().is_success() {
            anyhow::bail!("Error creating issue: {}", error_body(resp).await);
        }

        let created: GhIssue = resp.json().await.context("Failed to parse created issue")?;
        Ok(CreatedIssue {
            number: created.number,
            url: created.html_url,
        })
    }

    async fn set_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        let url = format!("{}/{number}", self.issues_url);
        let resp = self
            .request(reqwest::Method::PATCH, &url)
            .json(&serde_json::json!({ "labels": labels }))
            .send()
            .await
            .context("GitHub API request failed")?;
        if !resp.status().is_success() {
            anyhow::bail!("Failed to update labels: {}", error_body(resp).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tracker(server: &MockServer) -> GitHubTracker {
        GitHubTracker::new(&GitHubTarget {
            token: "ghp_test".into(),
            repo: "acme/docs".into(),
            api_base: server.uri(),
        })
    }

    fn issue_json(number: u64, title: &str) -> serde_json::Value {
        serde_json::json!({
            "number": number,
            "title": title,
            "html_url": format!("https://github.com/acme/docs/issues/{number}"),
            "state": "open"
        })
    }

    #[tokio::test]
    async fn finds_existing_issue_by_trimmed_title() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/docs/issues"))
            .and(query_param("state", "all"))
            .and(header("authorization", "Bearer ghp_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                issue_json(1, "Other task"),
                issue_json(2, "  Staking engine "),
            ])))
            .mount(&server)
            .await;

        let found = tracker(&server).find_by_title("Staking engine").await.unwrap();
        assert_eq!(found.as_deref(), Some("https://github.com/acme/docs/issues/2"));

        let missing = tracker(&server).find_by_title("Governance hub").await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn follows_pages_until_a_short_one() {
        let server = MockServer::start().await;
        let full_page: Vec<_> = (1..=100).map(|n| issue_json(n, &format!("Task {n}"))).collect();
        Mock::given(method("GET"))
            .and(path("/repos/acme/docs/issues"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(full_page))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/docs/issues"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([issue_json(101, "Late task")])),
            )
            .mount(&server)
            .await;

        let found = tracker(&server).find_by_title("Late task").await.unwrap();
        assert_eq!(found.as_deref(), Some("https://github.com/acme/docs/issues/101"));
    }

    #[tokio::test]
    async fn listing_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
            .mount(&server)
            .await;

        let err = tracker(&server).find_by_title("x").await.unwrap_err();
        assert!(err.to_string().contains("Bad credentials"));
    }

    #[tokio::test]
    async fn creates_issue_and_relabels() {
        let server = MockServer::start().await;
        let new_issue = NewIssue {
            title: "Staking engine".into(),
            body: "Task ID: 2.1".into(),
            labels: vec!["phase:2".into(), "bounty".into()],
        };
        Mock::given(method("POST"))
            .and(path("/repos/acme/docs/issues"))
            .and(body_json(serde_json::json!({
                "title": "Staking engine",
                "body": "Task ID: 2.1",
                "labels": ["phase:2", "bounty"]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(issue_json(87, "Staking engine")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/repos/acme/docs/issues/87"))
            .and(body_json(serde_json::json!({ "labels": ["phase:2", "bounty"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(issue_json(87, "Staking engine")))
            .expect(1)
            .mount(&server)
            .await;

        let tracker = tracker(&server);
        let created = tracker.create_issue(&new_issue).await.unwrap();
        assert_eq!(created.number, 87);
        assert_eq!(created.url, "https://github.com/acme/docs/issues/87");
        tracker.set_labels(created.number, &new_issue.labels).await.unwrap();
    }

    #[tokio::test]
    async fn create_failure_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("Validation Failed"))
            .mount(&server)
            .await;

        let err = tracker(&server)
            .create_issue(&NewIssue {
                title: "t".into(),
                body: String::new(),
                labels: vec![],
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("422"));
    }
}
