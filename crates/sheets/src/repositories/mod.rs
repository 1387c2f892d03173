use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use changereq_core::{ApplicationError, ChangeRequestRecord, RequestId};

use crate::auth::AuthError;

pub mod google;
pub mod memory;

pub use google::GoogleSheetsLedger;
pub use memory::InMemoryLedger;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("sheets request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("sheets API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("ledger has no `{0}` column")]
    MissingColumn(String),
}

impl From<LedgerError> for ApplicationError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value.to_string())
    }
}

/// One data row keyed by the header row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SheetRecord {
    fields: HashMap<String, String>,
}

impl SheetRecord {
    /// Zips a row against the header; missing trailing cells become empty strings.
    pub fn from_row(header: &[String], row: &[String]) -> Self {
        let fields = header
            .iter()
            .enumerate()
            .map(|(index, column)| (column.clone(), row.get(index).cloned().unwrap_or_default()))
            .collect();
        Self { fields }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }
}

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn list_records(&self) -> Result<Vec<SheetRecord>, LedgerError>;
    async fn append_row(&self, record: &ChangeRequestRecord) -> Result<(), LedgerError>;
}

/// Reads the ledger and derives today's next sequential id from `id_column`.
pub async fn next_request_id(
    ledger: &dyn LedgerRepository,
    id_column: &str,
    today: NaiveDate,
) -> Result<RequestId, LedgerError> {
    let records = ledger.list_records().await?;
    if records.first().is_some_and(|record| !record.has_column(id_column)) {
        return Err(LedgerError::MissingColumn(id_column.to_string()));
    }

    let ids = records.iter().map(|record| record.get(id_column).unwrap_or_default());
    Ok(changereq_core::next_request_id(ids, today))
}
