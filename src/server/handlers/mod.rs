//! HTTP request handlers for the web server.

mod api;
mod search;
mod static_files;

// Re-export handlers for use by the router
pub use api::health;
pub use search::api_search;
pub use static_files::{serve_css, serve_index, serve_js};
