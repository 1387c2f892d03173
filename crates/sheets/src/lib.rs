//! Spreadsheet ledger adapter.
//!
//! The change-request ledger is a single worksheet whose first row holds the
//! column headers. This crate exposes it through [`LedgerRepository`]:
//! - **Google Sheets** (`repositories::google`) - Sheets API v4 over reqwest
//! - **In memory** (`repositories::memory`) - header + rows held in process
//! - **Service account auth** (`auth`) - RS256 JWT assertion exchanged for a
//!   bearer token, cached until shortly before it expires

pub mod auth;
pub mod credentials;
pub mod repositories;

pub use auth::{AccessTokenSource, AuthError, ServiceAccountTokenSource, StaticTokenSource};
pub use credentials::ServiceAccountKey;
pub use repositories::{
    next_request_id, GoogleSheetsLedger, InMemoryLedger, LedgerError, LedgerRepository,
    SheetRecord,
};
