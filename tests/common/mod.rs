#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use sap_portal_api::{
    app_router,
    config::{AppConfig, SapConfig},
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;
use wiremock::MockServer;

pub const TEST_SESSION_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Router wired to a wiremock server standing in for SAP.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub sap: MockServer,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Builds the app after letting the caller adjust the configuration.
    pub async fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let sap = MockServer::start().await;
        let mut cfg = test_config(&sap.uri());
        customize(&mut cfg);

        let state = AppState::new(cfg).expect("test state");
        let router = app_router(state.clone());
        Self { router, state, sap }
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = self.request(Method::POST, uri, Some(body), None).await;
        let status = response.status();
        (status, read_json(response).await)
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let response = self.request(Method::GET, uri, None, None).await;
        let status = response.status();
        (status, read_json(response).await)
    }
}

pub fn test_config(base_url: &str) -> AppConfig {
    let sap = SapConfig {
        base_url: base_url.to_string(),
        client: "100".to_string(),
        username: "PORTAL_RFC".to_string(),
        password: "secret".to_string(),
        timeout_secs: 5,
    };
    AppConfig::new(sap, TEST_SESSION_SECRET.to_string(), "test".to_string())
}

pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// SOAP reply the way SAP's SOAP runtime renders an RFC response.
pub fn soap_reply(function: &str, inner: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><soap-env:Envelope xmlns:soap-env="http://schemas.xmlsoap.org/soap/envelope/"><soap-env:Header/><soap-env:Body><n0:{function}Response xmlns:n0="urn:sap-com:document:sap:rfc:functions">{inner}</n0:{function}Response></soap-env:Body></soap-env:Envelope>"#
    )
}

pub fn soap_endpoint(service: &str) -> String {
    format!("/sap/bc/srt/scs/sap/{}", service)
}
