//! ticketcheck - ticket pickup status lookup.
//!
//! Serves pickup and payment status for tickets recorded in a Google Sheets
//! spreadsheet.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticketcheck::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "ticketcheck=debug,tower_http=debug"
    } else {
        "ticketcheck=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    cli::run().await
}
