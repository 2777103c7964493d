//! Google Sheets v4 values client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use super::credentials::{ServiceAccount, SHEETS_READONLY_SCOPE};
use super::{RowSource, SheetsError};

/// Public Sheets API base URL.
pub const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com/v4";

/// Refresh tokens this long before Google says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Longest token lifetime trusted from the token endpoint.
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// An access token with its expiration time.
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn new(access_token: String, expires_in: Duration) -> Self {
        let now = Instant::now();
        let expires_in = expires_in.min(MAX_TOKEN_LIFETIME);
        Self {
            access_token,
            expires_at: now.checked_add(expires_in).unwrap_or(now),
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() + TOKEN_EXPIRY_MARGIN >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Reads cell values from a single spreadsheet.
pub struct SheetsClient {
    client: Client,
    endpoint: String,
    spreadsheet_id: String,
    account: ServiceAccount,
    token: Mutex<Option<CachedToken>>,
}

impl SheetsClient {
    /// Create a client for `spreadsheet_id` against the API at `endpoint`.
    pub fn with_endpoint(
        endpoint: &str,
        spreadsheet_id: &str,
        account: ServiceAccount,
        timeout: Duration,
    ) -> Result<Self, SheetsError> {
        let base = url::Url::parse(endpoint)
            .map_err(|e| SheetsError::Http(format!("invalid endpoint {}: {}", endpoint, e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(SheetsError::Http(format!(
                "unsupported endpoint scheme: {}",
                base.scheme()
            )));
        }

        let client = Client::builder()
            .user_agent(concat!("ticketcheck/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| SheetsError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            account,
            token: Mutex::new(None),
        })
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}",
            self.endpoint,
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(range)
        )
    }

    /// Get a valid access token, exchanging a fresh assertion when needed.
    async fn access_token(&self) -> Result<String, SheetsError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| !t.is_expired()) {
            return Ok(token.access_token.clone());
        }

        debug!(
            "Requesting access token for {}",
            self.account.client_email()
        );
        let assertion = self
            .account
            .sign_assertion(SHEETS_READONLY_SCOPE, chrono::Utc::now())?;
        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];

        let resp = self
            .client
            .post(self.account.token_uri())
            .form(&params)
            .send()
            .await
            .map_err(|e| SheetsError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Auth(format!("HTTP {}: {}", status, body.trim())));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| SheetsError::Parse(format!("token response: {}", e)))?;

        let access_token = token.access_token.clone();
        *cached = Some(CachedToken::new(
            token.access_token,
            Duration::from_secs(token.expires_in),
        ));
        Ok(access_token)
    }

    async fn forget_token(&self) {
        *self.token.lock().await = None;
    }
}

#[async_trait]
impl RowSource for SheetsClient {
    async fn fetch_rows(&self, range: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        let token = self.access_token().await?;
        let url = self.values_url(range);

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| SheetsError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                self.forget_token().await;
            }
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| body.trim().to_string());
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let range_values: ValueRange = resp
            .json()
            .await
            .map_err(|e| SheetsError::Parse(e.to_string()))?;

        let rows: Vec<Vec<String>> = range_values
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();

        debug!("Fetched {} rows from range {}", rows.len(), range);
        Ok(rows)
    }
}

/// Render a cell the way the sheet displays it.
fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        serde_json::Value::Bool(true) => "TRUE".to_string(),
        serde_json::Value::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}
