//! Ticket lookup API.

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::super::AppState;
use crate::services::{LookupError, SearchResponse};

/// Look up tickets by name or phone.
///
/// Only the first `q` is used when the parameter repeats.
pub async fn api_search(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<SearchResponse>, LookupError> {
    let keyword = query.as_deref().and_then(first_keyword).unwrap_or_default();
    let response = state.lookup.search(&keyword).await?;
    Ok(Json(response))
}

fn first_keyword(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == "q")
        .map(|(_, value)| value.into_owned())
}

impl LookupError {
    fn status_code(&self) -> StatusCode {
        match self {
            LookupError::InvalidInput => StatusCode::BAD_REQUEST,
            LookupError::NotFound => StatusCode::NOT_FOUND,
            LookupError::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let body = self.body();
        if let Some(ref detail) = body.detail {
            tracing::warn!("Ticket lookup failed: {}", detail);
        }
        (self.status_code(), Json(body)).into_response()
    }
}
