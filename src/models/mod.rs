//! Data models for ticketcheck.

mod result_item;
mod ticket;

pub use result_item::{
    classify, Classification, DisplayColor, PayStatus, PickupStatus, ResultItem,
};
pub use ticket::{MatchMode, RowDecodeError, TicketRow};
