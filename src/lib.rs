//! ticketcheck - ticket pickup status lookup.
//!
//! Looks up ticket rows in a Google Sheets spreadsheet and reports whether
//! each ticket has been picked up and whether payment is still due.

pub mod cli;
pub mod config;
pub mod models;
pub mod server;
pub mod services;
pub mod sheets;
