//! Service layer for ticketcheck business logic.
//!
//! Services hold the lookup rules separately from the HTTP and CLI surfaces,
//! so both can share them.

mod lookup;

pub use lookup::{
    format_updated_time, ErrorBody, LookupError, LookupService, SearchResponse,
    UPDATED_TIME_UTC_OFFSET_HOURS,
};
