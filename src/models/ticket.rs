//! Ticket rows as decoded from the spreadsheet.

use serde::{Deserialize, Serialize};

/// Column positions in the ticket sheet.
mod col {
    pub const NAME: usize = 0;
    pub const PHONE: usize = 1;
    pub const SENDER_NAME: usize = 2;
    pub const TICKETS: usize = 3;
    pub const NUMBER: usize = 4;
    pub const NEEDS_PAYMENT: usize = 5;
    pub const AMOUNT: usize = 6;
    pub const PICKED_UP: usize = 7;
    pub const COUNTER: usize = 8;
}

/// Reasons a sheet row does not yield a ticket.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowDecodeError {
    #[error("row has no content")]
    Blank,
}

/// A single ticket row with typed flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketRow {
    pub name: String,
    /// Only used for suffix matching; never returned to callers.
    pub phone: String,
    pub sender_name: String,
    pub tickets: String,
    pub number: String,
    pub needs_payment: bool,
    pub amount: String,
    pub picked_up: bool,
    pub counter: String,
}

impl TicketRow {
    /// Decode a sparse row of cells.
    ///
    /// Cells past the end of the row decode as empty strings and every cell is
    /// trimmed. Rows with no content at all are reported as [`RowDecodeError::Blank`].
    pub fn decode<S: AsRef<str>>(cells: &[S]) -> Result<Self, RowDecodeError> {
        if cells.iter().all(|c| c.as_ref().trim().is_empty()) {
            return Err(RowDecodeError::Blank);
        }
        let cell = move |idx: usize| cell_at(cells, idx);

        Ok(Self {
            name: cell(col::NAME).to_string(),
            phone: cell(col::PHONE).to_string(),
            sender_name: cell(col::SENDER_NAME).to_string(),
            tickets: cell(col::TICKETS).to_string(),
            number: cell(col::NUMBER).to_string(),
            needs_payment: parse_flag(cell(col::NEEDS_PAYMENT)),
            amount: cell(col::AMOUNT).to_string(),
            picked_up: parse_flag(cell(col::PICKED_UP)),
            counter: cell(col::COUNTER).to_string(),
        })
    }

    /// Check whether this row answers a lookup for `keyword`.
    pub fn matches(&self, keyword: &str, mode: MatchMode) -> bool {
        match mode {
            MatchMode::Name => self.name == keyword,
            MatchMode::NameOrPhone => self.name == keyword || self.phone.ends_with(keyword),
        }
    }
}

fn cell_at<S: AsRef<str>>(cells: &[S], idx: usize) -> &str {
    cells.get(idx).map(|c| c.as_ref().trim()).unwrap_or("")
}

/// Sheets export checkboxes as `TRUE`/`FALSE`.
fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// How a keyword is matched against ticket rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Pickup name must equal the keyword.
    Name,
    /// Pickup name equals the keyword, or the phone number ends with it.
    #[default]
    NameOrPhone,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::NameOrPhone => "name_or_phone",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "name" => Some(Self::Name),
            "name_or_phone" | "name-or-phone" => Some(Self::NameOrPhone),
            _ => None,
        }
    }
}
