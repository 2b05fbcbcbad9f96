use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::sheets::auth::ServiceAccountKey;
use crate::sheets::DEFAULT_API_BASE;

const DEFAULT_GITHUB_API: &str = "https://api.github.com";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub github: GitHubConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct SheetsConfig {
    pub sheet_id: Option<String>,
    pub worksheet: Option<String>,
    /// Service-account key, as JSON or base64-encoded JSON.
    pub credentials_json: Option<String>,
    pub credentials_path: Option<PathBuf>,
    pub api_base: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct GitHubConfig {
    pub token: Option<String>,
    /// `owner/name`
    pub repo: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read credentials file {path}: {source}")]
    CredentialsFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Credentials(#[from] crate::sheets::SheetsError),
    #[error("GitHub token is not set (GITHUB_TOKEN or [github].token)")]
    MissingToken,
    #[error("GitHub repository is not set (--repo, GITHUB_REPOSITORY or [github].repo)")]
    MissingRepo,
}

/// Where a sync run writes its row.
#[derive(Debug)]
pub enum WriteMode {
    Live(SheetTarget),
    DryRun(DryRunReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DryRunReason {
    Requested,
    MissingCredentials,
    MissingSheetId,
}

impl fmt::Display for DryRunReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DryRunReason::Requested => write!(f, "dry run requested"),
            DryRunReason::MissingCredentials => write!(f, "no Google credentials provided"),
            DryRunReason::MissingSheetId => write!(f, "no sheet ID provided"),
        }
    }
}

#[derive(Debug)]
pub struct SheetTarget {
    pub sheet_id: String,
    pub worksheet: Option<String>,
    pub credentials: ServiceAccountKey,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct GitHubTarget {
    pub token: String,
    pub repo: String,
    pub api_base: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Overlay values from the environment, as set by a GitHub Actions job.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| non_empty(var(key));
        if let Some(v) = get("GOOGLE_CREDENTIALS_JSON") {
            self.sheets.credentials_json = Some(v);
        }
        if let Some(v) = get("SHEET_ID") {
            self.sheets.sheet_id = Some(v);
        }
        if let Some(v) = get("SHEET_WORKSHEET") {
            self.sheets.worksheet = Some(v);
        }
        if let Some(v) = get("GITHUB_TOKEN") {
            self.github.token = Some(v);
        }
        if let Some(v) = get("GITHUB_REPOSITORY") {
            self.github.repo = Some(v);
        }
    }
}

impl SheetsConfig {
    fn credentials(&self) -> Result<Option<ServiceAccountKey>, ConfigError> {
        if let Some(raw) = non_empty(self.credentials_json.clone()) {
            return Ok(Some(ServiceAccountKey::parse(&raw)?));
        }
        if let Some(path) = &self.credentials_path {
            let raw = std::fs::read_to_string(path).map_err(|source| {
                ConfigError::CredentialsFile {
                    path: path.clone(),
                    source,
                }
            })?;
            return Ok(Some(ServiceAccountKey::parse(&raw)?));
        }
        Ok(None)
    }

    /// Decide between a live write and a dry run.
    ///
    /// Absent credentials or sheet ID downgrade to a dry run; credentials that
    /// are present but unusable are an error.
    pub fn write_mode(&self, dry_run: bool) -> Result<WriteMode, ConfigError> {
        if dry_run {
            return Ok(WriteMode::DryRun(DryRunReason::Requested));
        }
        let Some(credentials) = self.credentials()? else {
            return Ok(WriteMode::DryRun(DryRunReason::MissingCredentials));
        };
        let Some(sheet_id) = non_empty(self.sheet_id.clone()) else {
            return Ok(WriteMode::DryRun(DryRunReason::MissingSheetId));
        };
        Ok(WriteMode::Live(SheetTarget {
            sheet_id,
            worksheet: non_empty(self.worksheet.clone()),
            credentials,
            api_base: self
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        }))
    }
}

impl GitHubConfig {
    pub fn target(&self) -> Result<GitHubTarget, ConfigError> {
        let token = non_empty(self.token.clone()).ok_or(ConfigError::MissingToken)?;
        let repo = non_empty(self.repo.clone()).ok_or(ConfigError::MissingRepo)?;
        Ok(GitHubTarget {
            token,
            repo,
            api_base: self
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_GITHUB_API.to_string()),
        })
    }
}

fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bounty-sync")
        .join("config.toml")
}

/// Load the config file, then overlay the process environment.
///
/// An explicitly given path must exist; the default path is optional.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => {
            let path = config_path();
            if path.exists() {
                read_config(&path)?
            } else {
                AppConfig::default()
            }
        }
    };
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

fn read_config(path: &Path) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}
