//! Validation and error-response tests.
//!
//! Tests verify:
//! - Parameter validation errors name the offending field
//! - Upstream errors map to 502 with the original HTML error-page shape
//! - Legacy status compatibility answers 200 for every error

use axum::http::StatusCode;
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use nels_transfer_bridge::server::{create_router, RouterConfig};

use super::test_utils::{callback_request, test_settings, MockResponse, MockUpstreamClient};

fn router_with(client: MockUpstreamClient) -> axum::Router {
    create_router(
        client,
        test_settings(),
        RouterConfig::default().with_tracing(false),
    )
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

// =============================================================================
// Parameter Validation
// =============================================================================

#[tokio::test]
async fn test_missing_action_parameter() {
    let client = MockUpstreamClient::new();
    let router = router_with(client.clone());

    let request = callback_request("", "selectedFiles=%2Fa%2Ff.txt");
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_string(response).await;
    assert!(body.contains("Error:"));
    assert!(body.contains("'action'"));

    // Validation happens before any outbound call.
    assert!(client.identity_calls().await.is_empty());
}

#[tokio::test]
async fn test_invalid_action_echoes_value() {
    let client = MockUpstreamClient::new();
    let router = router_with(client.clone());

    let request = callback_request("action=delete", "selectedFiles=%2Fa%2Ff.txt");
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_string(response).await;
    assert!(body.contains("'delete'"));
    assert!(body.contains("'import' or 'export'"));
    assert!(client.identity_calls().await.is_empty());
}

#[tokio::test]
async fn test_missing_selected_files_parameter() {
    let client = MockUpstreamClient::new();
    let router = router_with(client.clone());

    let request = callback_request("action=import", "");
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_string(response).await;
    assert!(body.contains("'selectedFiles'"));
    assert!(client.identity_calls().await.is_empty());
}

#[tokio::test]
async fn test_missing_body_without_content_type() {
    let client = MockUpstreamClient::new();
    let router = router_with(client.clone());

    // A bare POST with no body and no content-type header still gets the
    // ordinary validation error page, like the page this bridge replaces.
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/static/history_transfer_callback?action=import")
        .header("host", "galaxy.example.org")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_string(response).await;
    assert!(body.contains("Error:"));
    assert!(body.contains("'selectedFiles'"));
    assert!(client.identity_calls().await.is_empty());
}

#[tokio::test]
async fn test_missing_body_legacy_status() {
    let client = MockUpstreamClient::new();
    let mut settings = test_settings();
    settings.legacy_error_status = true;
    let router = create_router(
        client,
        settings,
        RouterConfig::default().with_tracing(false),
    );

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/static/history_transfer_callback?action=import")
        .header("host", "galaxy.example.org")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("'selectedFiles'"));
}

#[tokio::test]
async fn test_empty_selected_files_passes_validation() {
    let client = MockUpstreamClient::new();
    let router = router_with(client.clone());

    // Present but empty: validation only checks presence.
    let request = callback_request("action=import", "selectedFiles=");
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);

    let calls = client.transfer_calls().await;
    assert_eq!(calls[0].fields.historyname, "");
    assert_eq!(calls[0].fields.historyfile.as_deref(), Some(""));
}

// =============================================================================
// Upstream Errors
// =============================================================================

#[tokio::test]
async fn test_identity_error_key_halts_flow() {
    let client = MockUpstreamClient::new()
        .with_identity_response(MockResponse::Json(json!({"error": "User not logged in"})));
    let router = router_with(client.clone());

    let request = callback_request("action=import", "selectedFiles=%2Fa%2Ff.txt");
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_string(response).await;
    assert!(body.contains("User not logged in"));
    assert!(client.transfer_calls().await.is_empty());
}

#[tokio::test]
async fn test_identity_missing_field() {
    let client = MockUpstreamClient::new()
        .with_identity_response(MockResponse::Json(json!({"username": "jdoe"})));
    let router = router_with(client.clone());

    let request = callback_request("action=import", "selectedFiles=%2Fa%2Ff.txt");
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_string(response).await;
    assert!(body.contains("'userid'"));
    assert!(client.transfer_calls().await.is_empty());
}

#[tokio::test]
async fn test_export_identity_without_history_fields() {
    // Import-shaped identity on an export request: the history fields are
    // required and their absence is reported explicitly.
    let client = MockUpstreamClient::new();
    let router = router_with(client.clone());

    let request = callback_request("action=export", "selectedFiles=%2Fdir%2Fsub");
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_string(response).await;
    assert!(body.contains("'history'"));
    assert!(client.transfer_calls().await.is_empty());
}

#[tokio::test]
async fn test_identity_shape_error() {
    let client =
        MockUpstreamClient::new().with_identity_response(MockResponse::Json(json!([1, 2, 3])));
    let router = router_with(client.clone());

    let request = callback_request("action=import", "selectedFiles=%2Fa%2Ff.txt");
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(client.transfer_calls().await.is_empty());
}

#[tokio::test]
async fn test_transfer_transport_error() {
    let client = MockUpstreamClient::new()
        .with_transfer_response(MockResponse::TransportError("timed out".to_string()));
    let router = router_with(client.clone());

    let request = callback_request("action=import", "selectedFiles=%2Fa%2Ff.txt");
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_string(response).await;
    assert!(body.contains("timed out"));
}

// =============================================================================
// Legacy Status Compatibility
// =============================================================================

#[tokio::test]
async fn test_legacy_error_status_answers_200() {
    let client = MockUpstreamClient::new();
    let mut settings = test_settings();
    settings.legacy_error_status = true;
    let router = create_router(
        client,
        settings,
        RouterConfig::default().with_tracing(false),
    );

    let request = callback_request("", "selectedFiles=%2Fa%2Ff.txt");
    let response = router.oneshot(request).await.unwrap();

    // The PHP page always answered 200 with an HTML error body.
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("Error:"));
    assert!(body.contains("'action'"));
}

#[tokio::test]
async fn test_legacy_error_status_keeps_success_redirect() {
    let client = MockUpstreamClient::new();
    let mut settings = test_settings();
    settings.legacy_error_status = true;
    let router = create_router(
        client,
        settings,
        RouterConfig::default().with_tracing(false),
    );

    let request = callback_request("action=import", "selectedFiles=%2Fa%2Ff.txt");
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_error_page_is_html() {
    let router = router_with(MockUpstreamClient::new());

    let request = callback_request("", "selectedFiles=%2Fa%2Ff.txt");
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/html; charset=utf-8"
    );

    let body = body_string(response).await;
    assert!(body.starts_with("<html>"));
    assert!(body.ends_with("</html>"));
}
