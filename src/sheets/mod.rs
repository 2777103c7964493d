//! Spreadsheet data sources.
//!
//! The lookup service only needs to read a range of rows, so the data source
//! is a small trait:
//! - [`SheetsClient`] reads from Google Sheets with a service account
//! - [`InMemoryRowSource`] serves a fixed table (or a fixed failure)

mod client;
mod credentials;

pub use client::{SheetsClient, DEFAULT_SHEETS_ENDPOINT};
pub use credentials::{
    CredentialError, ServiceAccount, DEFAULT_TOKEN_URI, SHEETS_READONLY_SCOPE,
};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

/// Errors from reading a spreadsheet.
#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("Credential error: {0}")]
    Credentials(#[from] CredentialError),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Sheets API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    #[error("Failed to parse response: {0}")]
    Parse(String),
    #[error("Data source unavailable: {0}")]
    Unavailable(String),
}

/// A table of string cells addressed by range, e.g. `Sheet1!A:Z`.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Fetch every row in `range`, header row included.
    async fn fetch_rows(&self, range: &str) -> Result<Vec<Vec<String>>, SheetsError>;
}

/// Row source backed by a fixed table.
pub struct InMemoryRowSource {
    rows: Result<Vec<Vec<String>>, String>,
    fetches: AtomicUsize,
    ranges: Mutex<Vec<String>>,
}

impl InMemoryRowSource {
    /// Serve `rows` on every fetch.
    pub fn new<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        Self {
            rows: Ok(rows),
            fetches: AtomicUsize::new(0),
            ranges: Mutex::new(Vec::new()),
        }
    }

    /// Fail every fetch with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            rows: Err(message.to_string()),
            fetches: AtomicUsize::new(0),
            ranges: Mutex::new(Vec::new()),
        }
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Ranges requested so far, in order.
    pub fn requested_ranges(&self) -> Vec<String> {
        self.ranges
            .lock()
            .map(|ranges| ranges.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RowSource for InMemoryRowSource {
    async fn fetch_rows(&self, range: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut ranges) = self.ranges.lock() {
            ranges.push(range.to_string());
        }
        self.rows.clone().map_err(SheetsError::Unavailable)
    }
}
