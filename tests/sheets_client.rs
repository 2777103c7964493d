//! SheetsClient against a local server standing in for the Google APIs.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};

use tower::ServiceExt;

use ticketcheck::config::{CredentialSource, Settings};
use ticketcheck::models::MatchMode;
use ticketcheck::server::{create_router, AppState};
use ticketcheck::services::{LookupError, LookupService};
use ticketcheck::sheets::{RowSource, ServiceAccount, SheetsClient, SheetsError};

const TEST_KEY: &str = include_str!("fixtures/service_account_key.pem");
const ACCESS_TOKEN: &str = "ya29.test-token";
const SPREADSHEET_ID: &str = "sheet-123";

#[derive(Default)]
struct FakeGoogle {
    values: serde_json::Value,
    token_hits: AtomicUsize,
    values_hits: AtomicUsize,
    reject_token: bool,
    unauthorized_once: AtomicBool,
    api_error: Option<(StatusCode, String)>,
    raw_values: Option<&'static str>,
    ranges: Mutex<Vec<String>>,
}

async fn token(
    State(fake): State<Arc<FakeGoogle>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    fake.token_hits.fetch_add(1, Ordering::SeqCst);

    if fake.reject_token {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "invalid_grant" })),
        )
            .into_response();
    }
    let grant_ok = form.get("grant_type").map(String::as_str)
        == Some("urn:ietf:params:oauth:grant-type:jwt-bearer");
    let assertion_ok = form
        .get("assertion")
        .map(|a| a.split('.').count() == 3)
        .unwrap_or(false);
    if !grant_ok || !assertion_ok {
        return StatusCode::BAD_REQUEST.into_response();
    }

    Json(serde_json::json!({
        "access_token": ACCESS_TOKEN,
        "expires_in": 3600,
        "token_type": "Bearer",
    }))
    .into_response()
}

async fn values(
    State(fake): State<Arc<FakeGoogle>>,
    Path((id, range)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    fake.values_hits.fetch_add(1, Ordering::SeqCst);
    fake.ranges.lock().unwrap().push(range.clone());

    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {}", ACCESS_TOKEN).as_str());
    if !authorized || fake.unauthorized_once.swap(false, Ordering::SeqCst) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": { "code": 401, "message": "Request had invalid authentication credentials." }
            })),
        )
            .into_response();
    }
    if let Some((status, message)) = &fake.api_error {
        return (
            *status,
            Json(serde_json::json!({
                "error": { "code": status.as_u16(), "message": message }
            })),
        )
            .into_response();
    }
    if let Some(raw) = fake.raw_values {
        return ([(header::CONTENT_TYPE, "application/json")], raw).into_response();
    }
    if id != SPREADSHEET_ID {
        return StatusCode::NOT_FOUND.into_response();
    }

    let mut body = fake.values.clone();
    body["range"] = serde_json::Value::String(range);
    body["majorDimension"] = serde_json::Value::String("ROWS".to_string());
    Json(body).into_response()
}

async fn start(fake: FakeGoogle) -> (SocketAddr, Arc<FakeGoogle>) {
    let fake = Arc::new(fake);
    let app = Router::new()
        .route("/token", post(token))
        .route("/v4/spreadsheets/:id/values/:range", get(values))
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, fake)
}

fn key_json(addr: SocketAddr) -> String {
    serde_json::json!({
        "type": "service_account",
        "project_id": "ticket-desk",
        "private_key": TEST_KEY,
        "client_email": "reader@ticket-desk.iam.gserviceaccount.com",
        "token_uri": format!("http://{}/token", addr),
    })
    .to_string()
}

fn client_for(addr: SocketAddr) -> SheetsClient {
    let account = ServiceAccount::from_json(&key_json(addr)).unwrap();
    SheetsClient::with_endpoint(
        &format!("http://{}/v4", addr),
        SPREADSHEET_ID,
        account,
        Duration::from_secs(5),
    )
    .unwrap()
}

fn ticket_sheet() -> serde_json::Value {
    serde_json::json!({
        "values": [
            ["Name", "Phone", "Sender", "Tickets", "Number", "NeedPay", "Amount", "PickedUp", "Counter"],
            ["Alice", "0912345678", "Bob", 2, "A1", false, 0, false, "Counter1"],
            ["Carol", "0922000111", "Dan", "1", "B7", "TRUE", "150", "TRUE", "Counter2"],
            ["Carol", "0922000111", "Erin", 3, "B8", true, 300],
        ]
    })
}

#[tokio::test]
async fn test_fetch_rows_renders_cells_as_text() {
    let (addr, fake) = start(FakeGoogle {
        values: ticket_sheet(),
        ..Default::default()
    })
    .await;
    let client = client_for(addr);

    let rows = client.fetch_rows("Sheet1!A:Z").await.unwrap();

    assert_eq!(rows.len(), 4);
    assert_eq!(
        rows[1],
        vec!["Alice", "0912345678", "Bob", "2", "A1", "FALSE", "0", "FALSE", "Counter1"]
    );
    assert_eq!(rows[3].len(), 7);
    assert_eq!(rows[3][5], "TRUE");
    assert_eq!(fake.ranges.lock().unwrap().clone(), vec!["Sheet1!A:Z"]);
}

#[tokio::test]
async fn test_access_token_is_cached() {
    let (addr, fake) = start(FakeGoogle {
        values: ticket_sheet(),
        ..Default::default()
    })
    .await;
    let client = client_for(addr);

    client.fetch_rows("Sheet1!A:Z").await.unwrap();
    client.fetch_rows("Sheet1!A:Z").await.unwrap();

    assert_eq!(fake.token_hits.load(Ordering::SeqCst), 1);
    assert_eq!(fake.values_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unauthorized_drops_cached_token() {
    let (addr, fake) = start(FakeGoogle {
        values: ticket_sheet(),
        unauthorized_once: AtomicBool::new(true),
        ..Default::default()
    })
    .await;
    let client = client_for(addr);

    let err = client.fetch_rows("Sheet1!A:Z").await.unwrap_err();
    assert!(matches!(err, SheetsError::Api { status: 401, .. }));

    client.fetch_rows("Sheet1!A:Z").await.unwrap();
    assert_eq!(fake.token_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_api_error_message() {
    let (addr, _fake) = start(FakeGoogle {
        api_error: Some((
            StatusCode::TOO_MANY_REQUESTS,
            "Quota exceeded for quota metric 'Read requests'".to_string(),
        )),
        ..Default::default()
    })
    .await;
    let client = client_for(addr);

    match client.fetch_rows("Sheet1!A:Z").await {
        Err(SheetsError::Api { status, message }) => {
            assert_eq!(status, 429);
            assert!(message.starts_with("Quota exceeded"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_token_exchange_failure() {
    let (addr, fake) = start(FakeGoogle {
        reject_token: true,
        ..Default::default()
    })
    .await;
    let client = client_for(addr);

    let err = client.fetch_rows("Sheet1!A:Z").await.unwrap_err();
    assert!(matches!(err, SheetsError::Auth(_)), "{:?}", err);
    assert!(err.to_string().contains("invalid_grant"));
    assert_eq!(fake.values_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_values_response() {
    for raw in ["<html>Service Unavailable</html>", r#"{"values": "x"}"#] {
        let (addr, _fake) = start(FakeGoogle {
            raw_values: Some(raw),
            ..Default::default()
        })
        .await;
        let client = client_for(addr);

        let err = client.fetch_rows("Sheet1!A:Z").await.unwrap_err();
        assert!(matches!(err, SheetsError::Parse(_)), "{}: {:?}", raw, err);
    }
}

#[tokio::test]
async fn test_malformed_values_response_is_upstream_failure() {
    let (addr, _fake) = start(FakeGoogle {
        raw_values: Some(r#"{"values": "x"}"#),
        ..Default::default()
    })
    .await;
    let lookup = LookupService::new(
        Arc::new(client_for(addr)),
        "Sheet1!A:Z",
        MatchMode::NameOrPhone,
    );

    match lookup.search("Alice").await {
        Err(e @ LookupError::UpstreamFailure(_)) => {
            assert!(!e.detail().unwrap_or_default().is_empty());
        }
        other => panic!("expected upstream failure, got {:?}", other.map(|_| ())),
    }

    let response = create_router(AppState::new(lookup))
        .oneshot(
            Request::builder()
                .uri("/api/search?q=Alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json["error"],
        "Failed to load ticket data, please try again later."
    );
    assert!(json["detail"]
        .as_str()
        .unwrap()
        .starts_with("Failed to parse response"));
}

#[tokio::test]
async fn test_empty_range() {
    let (addr, _fake) = start(FakeGoogle {
        values: serde_json::json!({}),
        ..Default::default()
    })
    .await;
    let client = client_for(addr);

    assert!(client.fetch_rows("Sheet1!A:Z").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_lookup_over_sheets_client() {
    let (addr, _fake) = start(FakeGoogle {
        values: ticket_sheet(),
        ..Default::default()
    })
    .await;
    let lookup = LookupService::new(
        Arc::new(client_for(addr)),
        "Sheet1!A:Z",
        MatchMode::NameOrPhone,
    );

    let response = lookup.search("Carol").await.unwrap();
    let numbers: Vec<&str> = response.results.iter().map(|r| r.number.as_str()).collect();
    assert_eq!(numbers, vec!["B8", "B7"]);
    assert_eq!(
        response.results[0].pay_status.to_string(),
        "payment required: $300"
    );

    assert!(matches!(
        lookup.search("Mallory").await,
        Err(LookupError::NotFound)
    ));
}

#[tokio::test]
async fn test_settings_build_client_from_key_file() {
    let (addr, _fake) = start(FakeGoogle {
        values: ticket_sheet(),
        ..Default::default()
    })
    .await;

    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("service-account.json");
    std::fs::write(&key_path, key_json(addr)).unwrap();

    let settings = Settings {
        spreadsheet_id: Some(SPREADSHEET_ID.to_string()),
        credentials: Some(CredentialSource::File(key_path)),
        sheets_endpoint: format!("http://{}/v4", addr),
        match_mode: MatchMode::Name,
        ..Default::default()
    };

    let lookup = settings.create_lookup_service().unwrap();
    let response = lookup.search("Alice").await.unwrap();
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].counter, "Counter1");

    // Name-only matching ignores phone suffixes
    assert!(matches!(
        lookup.search("000111").await,
        Err(LookupError::NotFound)
    ));
}
