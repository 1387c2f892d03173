use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use changereq_core::ChangeRequestRecord;

use super::{LedgerError, LedgerRepository, SheetRecord};
use crate::auth::AccessTokenSource;

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AppendBody<'a> {
    major_dimension: &'static str,
    values: [[&'a str; 5]; 1],
}

#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    message: String,
}

/// Ledger stored in one worksheet of a Google spreadsheet.
pub struct GoogleSheetsLedger {
    http: Client,
    tokens: Arc<dyn AccessTokenSource>,
    base_url: String,
    spreadsheet_id: String,
    worksheet: String,
}

impl GoogleSheetsLedger {
    pub fn new(
        tokens: Arc<dyn AccessTokenSource>,
        spreadsheet_id: impl Into<String>,
        worksheet: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            tokens,
            base_url: SHEETS_API_BASE.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            worksheet: worksheet.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn values_url(&self, suffix: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}{suffix}",
            self.base_url,
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(&self.worksheet),
        )
    }

    async fn bearer(&self) -> Result<String, LedgerError> {
        let token = self.tokens.access_token().await?;
        Ok(format!("Bearer {}", token.expose_secret()))
    }
}

async fn ensure_success(response: Response) -> Result<Response, LedgerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GoogleErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);
    Err(LedgerError::Api { status: status.as_u16(), message })
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl LedgerRepository for GoogleSheetsLedger {
    async fn list_records(&self) -> Result<Vec<SheetRecord>, LedgerError> {
        let response = self
            .http
            .get(self.values_url(""))
            .header("Authorization", self.bearer().await?)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let range: ValueRange =
            response.json().await.map_err(|error| LedgerError::Decode(error.to_string()))?;
        let mut rows = range.values.iter().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());

        let Some(header) = rows.next() else {
            return Ok(Vec::new());
        };
        let records: Vec<SheetRecord> =
            rows.map(|row| SheetRecord::from_row(&header, &row)).collect();

        debug!(
            event_name = "sheets.ledger.listed",
            worksheet = %self.worksheet,
            record_count = records.len(),
            "ledger records listed"
        );
        Ok(records)
    }

    async fn append_row(&self, record: &ChangeRequestRecord) -> Result<(), LedgerError> {
        let body = AppendBody { major_dimension: "ROWS", values: [record.row()] };
        let response = self
            .http
            .post(self.values_url(":append"))
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .header("Authorization", self.bearer().await?)
            .json(&body)
            .send()
            .await?;
        ensure_success(response).await?;

        info!(
            event_name = "sheets.ledger.appended",
            worksheet = %self.worksheet,
            request_id = %record.id,
            "change request row appended"
        );
        Ok(())
    }
}
