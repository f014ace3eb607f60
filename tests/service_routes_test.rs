mod common;

use axum::http::{Method, Request, StatusCode};
use common::TestApp;
use sap_portal_api::portals;

#[tokio::test]
async fn health_reports_sap_target_without_calling_it() {
    let app = TestApp::new().await;
    let (status, body) = app.get_json("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["environment"], "test");
    assert_eq!(body["sap"]["client"], "100");
    assert_eq!(body["sap"]["host"], "127.0.0.1");
    assert_eq!(body["operations"], portals::catalog().count());
    assert!(app.sap.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn liveness_is_always_up() {
    let app = TestApp::new().await;
    let (status, body) = app.get_json("/health/live").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
}

#[tokio::test]
async fn operations_listing_can_be_filtered_by_portal() {
    let app = TestApp::new().await;

    let (status, all) = app.get_json("/api/operations").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().map(Vec::len), Some(portals::catalog().count()));

    let (status, vendor) = app.get_json("/api/operations?portal=vendor").await;
    assert_eq!(status, StatusCode::OK);
    let entries = vendor.as_array().expect("list");
    assert!(!entries.is_empty());
    for entry in entries {
        assert!(entry["path"].as_str().unwrap().starts_with("/vendor/api/"));
        assert_eq!(entry["portal"], "vendor");
    }
}

#[tokio::test]
async fn unknown_portal_filter_is_a_bad_request() {
    let app = TestApp::new().await;
    let (status, body) = app.get_json("/api/operations?portal=warehouse").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("warehouse"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;
    let (status, body) = app.get_json("/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "SAP Portal API");
    assert!(body["paths"].get("/employee/api/payslip").is_some());
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/health/live", None, None).await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn caller_request_id_is_echoed_on_errors() {
    use tower::ServiceExt;

    let app = TestApp::new().await;
    let router = sap_portal_api::app_router(app.state.clone());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/customer/api/profile")
        .header("content-type", "application/json")
        .header("x-request-id", "req-portal-42")
        .body(axum::body::Body::from("{}"))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["x-request-id"], "req-portal-42");

    let body = common::read_json(response).await;
    assert_eq!(body["request_id"], "req-portal-42");
}
