pub mod auth;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SheetTarget;
use crate::ledger::Ledger;
use crate::model::ledger::{LedgerColumn, LedgerRow};

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("invalid service-account credentials: {0}")]
    Credentials(String),
    #[error("failed to sign token request: {0}")]
    Jwt(String),
    #[error("token exchange rejected ({status}): {message}")]
    Auth { status: u16, message: String },
    #[error("Sheets API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// A Google Sheets worksheet used as the bounty ledger.
pub struct SheetsLedger {
    client: reqwest::Client,
    base_url: String,
    sheet_id: String,
    worksheet: Option<String>,
    access_token: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Serialize)]
struct ValuesBody<'a> {
    values: [&'a [String]; 1],
}

impl SheetsLedger {
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        sheet_id: String,
        worksheet: Option<String>,
        access_token: String,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            sheet_id,
            worksheet,
            access_token,
        }
    }

    /// Authenticate with the target's service account and open its sheet.
    /// The token exchange and the values calls share one client.
    pub async fn connect(target: &SheetTarget) -> Result<Self, SheetsError> {
        let client = reqwest::Client::new();
        let access_token = target.credentials.access_token(&client).await?;
        Ok(Self::new(
            client,
            target.api_base.clone(),
            target.sheet_id.clone(),
            target.worksheet.clone(),
            access_token,
        ))
    }

    /// Qualify an A1 range with the worksheet name. Without one, the API
    /// targets the first sheet.
    fn range(&self, a1: &str) -> String {
        match &self.worksheet {
            Some(name) => format!("'{}'!{a1}", name.replace('\'', "''")),
            None => a1.to_string(),
        }
    }

    fn values_url(&self, a1: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url,
            urlencoding::encode(&self.sheet_id),
            urlencoding::encode(&self.range(a1))
        )
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, SheetsError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp.text().await.unwrap_or_default();
        Err(SheetsError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn full_width() -> String {
    let first = LedgerColumn::ALL[0].letter();
    let last = LedgerColumn::ALL[LedgerColumn::COUNT - 1].letter();
    format!("{first}:{last}")
}

#[async_trait]
impl Ledger for SheetsLedger {
    fn name(&self) -> &str {
        "Google Sheets"
    }

    async fn id_column(&self) -> Result<Vec<String>> {
        let url = self.values_url("A:A");
        debug!(%url, "reading ID column");
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("majorDimension", "COLUMNS")])
            .send()
            .await
            .map_err(SheetsError::from)?;
        let range: ValueRange = Self::check(resp)
            .await?
            .json()
            .await
            .map_err(SheetsError::from)?;
        Ok(range.values.into_iter().next().unwrap_or_default())
    }

    async fn append_row(&self, row: &LedgerRow) -> Result<()> {
        let url = format!("{}:append", self.values_url(&full_width()));
        debug!(%url, task_id = row.id(), "appending row");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&ValuesBody {
                values: [row.cells()],
            })
            .send()
            .await
            .map_err(SheetsError::from)?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn update_row(&self, row_number: usize, row: &LedgerRow) -> Result<()> {
        let url = self.values_url(&LedgerRow::range_for(row_number));
        debug!(%url, task_id = row.id(), row_number, "updating row");
        let resp = self
            .client
            .put(&url)
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", "RAW")])
            .json(&ValuesBody {
                values: [row.cells()],
            })
            .send()
            .await
            .map_err(SheetsError::from)?;
        Self::check(resp).await?;
        Ok(())
    }
}
