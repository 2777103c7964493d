//! Lookup results and the pickup/payment classification rules.

use std::fmt;

use serde::{Serialize, Serializer};

use super::TicketRow;

/// Pickup state shown to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PickupStatus {
    #[serde(rename = "not yet picked up")]
    NotPickedUp,
    #[serde(rename = "picked up")]
    PickedUp,
    #[serde(rename = "picked up and paid")]
    PickedUpAndPaid,
}

/// Payment state shown to the customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayStatus {
    Completed,
    Required { amount: String },
    NotRequired,
}

impl fmt::Display for PayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "payment completed"),
            Self::Required { amount } => write!(f, "payment required: ${}", amount),
            Self::NotRequired => write!(f, "no payment required"),
        }
    }
}

impl Serialize for PayStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Display hint for the landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisplayColor {
    #[serde(rename = "green")]
    Green,
    #[serde(rename = "#b8860b")]
    Gold,
}

/// Status columns derived from a ticket's flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub pickup_status: PickupStatus,
    pub pay_status: PayStatus,
    pub color: DisplayColor,
}

/// Classify a ticket from its flags alone.
///
/// | picked_up | needs_payment | pickup | pay | color |
/// |---|---|---|---|---|
/// | yes | yes | picked up and paid | payment completed | gold |
/// | yes | no | picked up | no payment required | gold |
/// | no | yes | not yet picked up | payment required: $amount | green |
/// | no | no | not yet picked up | no payment required | green |
pub fn classify(picked_up: bool, needs_payment: bool, amount: &str) -> Classification {
    match (picked_up, needs_payment) {
        (true, true) => Classification {
            pickup_status: PickupStatus::PickedUpAndPaid,
            pay_status: PayStatus::Completed,
            color: DisplayColor::Gold,
        },
        (true, false) => Classification {
            pickup_status: PickupStatus::PickedUp,
            pay_status: PayStatus::NotRequired,
            color: DisplayColor::Gold,
        },
        (false, true) => Classification {
            pickup_status: PickupStatus::NotPickedUp,
            pay_status: PayStatus::Required {
                amount: amount.to_string(),
            },
            color: DisplayColor::Green,
        },
        (false, false) => Classification {
            pickup_status: PickupStatus::NotPickedUp,
            pay_status: PayStatus::NotRequired,
            color: DisplayColor::Green,
        },
    }
}

/// One matching ticket in a lookup response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultItem {
    pub counter: String,
    pub number: String,
    pub name: String,
    pub sender_name: String,
    pub tickets: String,
    pub pickup_status: PickupStatus,
    pub pay_status: PayStatus,
    pub color: DisplayColor,
    /// Partition key; not part of the response body.
    #[serde(skip)]
    pub picked_up: bool,
}

impl ResultItem {
    pub fn from_row(row: &TicketRow) -> Self {
        let Classification {
            pickup_status,
            pay_status,
            color,
        } = classify(row.picked_up, row.needs_payment, &row.amount);

        Self {
            counter: row.counter.clone(),
            number: row.number.clone(),
            name: row.name.clone(),
            sender_name: row.sender_name.clone(),
            tickets: row.tickets.clone(),
            pickup_status,
            pay_status,
            color,
            picked_up: row.picked_up,
        }
    }
}
