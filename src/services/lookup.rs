//! Ticket lookup: fetch, match, classify, order.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::models::{MatchMode, ResultItem, RowDecodeError, TicketRow};
use crate::sheets::{RowSource, SheetsError};

/// Offset of the venue's local time from UTC, used for `updated_time`.
pub const UPDATED_TIME_UTC_OFFSET_HOURS: i64 = 8;

const UPDATED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Ways a lookup can fail.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Please enter a name or phone number to search for.")]
    InvalidInput,
    #[error("Failed to load ticket data, please try again later.")]
    UpstreamFailure(#[source] SheetsError),
    #[error("No matching tickets found. Please check your input or ask at the front desk.")]
    NotFound,
}

impl LookupError {
    /// Diagnostic detail for failures that have one.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::UpstreamFailure(e) => Some(e.to_string()),
            Self::InvalidInput | Self::NotFound => None,
        }
    }

    /// JSON body reported to clients.
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            detail: self.detail(),
        }
    }
}

/// Error payload: a fixed message, plus detail for upstream failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Successful lookup response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResponse {
    pub results: Vec<ResultItem>,
    pub updated_time: String,
}

/// Answers pickup status queries against a ticket sheet.
#[derive(Clone)]
pub struct LookupService {
    source: Arc<dyn RowSource>,
    range: String,
    match_mode: MatchMode,
}

impl LookupService {
    pub fn new(source: Arc<dyn RowSource>, range: &str, match_mode: MatchMode) -> Self {
        Self {
            source,
            range: range.to_string(),
            match_mode,
        }
    }

    pub fn range(&self) -> &str {
        &self.range
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    /// Look up tickets for `keyword`, stamped with the current time.
    pub async fn search(&self, keyword: &str) -> Result<SearchResponse, LookupError> {
        self.search_at(keyword, Utc::now()).await
    }

    /// Look up tickets for `keyword`, stamped with `now`.
    ///
    /// Tickets not yet picked up come first; sheet order is kept within each group.
    pub async fn search_at(
        &self,
        keyword: &str,
        now: DateTime<Utc>,
    ) -> Result<SearchResponse, LookupError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(LookupError::InvalidInput);
        }

        let rows = self
            .source
            .fetch_rows(&self.range)
            .await
            .map_err(LookupError::UpstreamFailure)?;

        let tickets = self.load_tickets(&rows);
        let (pending, collected): (Vec<ResultItem>, Vec<ResultItem>) = tickets
            .iter()
            .filter(|t| t.matches(keyword, self.match_mode))
            .map(ResultItem::from_row)
            .partition(|item| !item.picked_up);

        debug!(
            "Lookup matched {} pending and {} collected tickets",
            pending.len(),
            collected.len()
        );

        let mut results = pending;
        results.extend(collected);
        if results.is_empty() {
            return Err(LookupError::NotFound);
        }

        Ok(SearchResponse {
            results,
            updated_time: format_updated_time(now),
        })
    }

    /// Fetch and decode every ticket in the configured range.
    pub async fn fetch_tickets(&self) -> Result<Vec<TicketRow>, SheetsError> {
        let rows = self.source.fetch_rows(&self.range).await?;
        Ok(self.load_tickets(&rows))
    }

    /// Decode data rows, skipping the header and blank rows.
    fn load_tickets(&self, rows: &[Vec<String>]) -> Vec<TicketRow> {
        rows.iter()
            .enumerate()
            .skip(1)
            .filter_map(|(idx, cells)| match TicketRow::decode(cells) {
                Ok(ticket) => Some(ticket),
                Err(RowDecodeError::Blank) => {
                    debug!("Skipping blank row {}", idx + 1);
                    None
                }
            })
            .collect()
    }
}

/// Render `now` in venue local time as `YYYY-MM-DD HH:MM`.
pub fn format_updated_time(now: DateTime<Utc>) -> String {
    (now.naive_utc() + Duration::hours(UPDATED_TIME_UTC_OFFSET_HOURS))
        .format(UPDATED_TIME_FORMAT)
        .to_string()
}
