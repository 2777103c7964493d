//! Web server for ticket pickup lookups.
//!
//! Serves the lookup API and a small landing page that calls it.

mod assets;
mod handlers;
mod routes;

pub use routes::create_router;

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use crate::services::LookupService;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub lookup: Arc<LookupService>,
}

impl AppState {
    pub fn new(lookup: LookupService) -> Self {
        Self {
            lookup: Arc::new(lookup),
        }
    }
}

/// Bind the listening socket. `host` may be an IP address or a hostname.
pub async fn bind(host: &str, port: u16) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    Ok(listener)
}

/// Start the web server.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = bind(host, port).await?;
    tracing::info!("Starting server at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
