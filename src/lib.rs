//! SAP Portal API Library
//!
//! HTTP backend for five self-service portals (customer, vendor, maintenance,
//! shop floor, employee). Each business endpoint is described by one static
//! [`portals::Operation`] and served by a single generic proxy that forwards to
//! SAP over SOAP or OData and reshapes the reply into camelCase JSON.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod openapi;
pub mod portals;
pub mod sap;
pub mod tracing;

use axum::{routing::get, Router};
use http::HeaderValue;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowHeaders, AllowMethods, Any, CorsLayer},
};

use crate::auth::SessionService;
use crate::errors::ServiceError;
use crate::sap::{HttpTransport, SapProxy, SapTransport};

/// Shared, read-only state of the running service
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::AppConfig>,
    pub proxy: Arc<SapProxy>,
    pub sessions: Arc<SessionService>,
}

impl AppState {
    /// Builds the state with the reqwest transport configured from `config.sap`.
    pub fn new(config: config::AppConfig) -> Result<Self, ServiceError> {
        let transport = HttpTransport::new(&config.sap)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Builds the state around an explicit transport.
    pub fn with_transport(
        config: config::AppConfig,
        transport: Arc<dyn SapTransport>,
    ) -> Result<Self, ServiceError> {
        let proxy = SapProxy::new(transport, &config.sap)?;
        let sessions = SessionService::new(
            &config.session_secret,
            Duration::from_secs(config.session_ttl_secs),
        );
        Ok(Self {
            config: Arc::new(config),
            proxy: Arc::new(proxy),
            sessions: Arc::new(sessions),
        })
    }
}

/// CORS policy: configured origins, or permissive in development / by explicit opt-in.
pub fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .filter_map(|origin| HeaderValue::from_str(origin).ok())
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        // Wildcards are not allowed together with credentials.
        if cfg.cors_allow_credentials {
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(AllowMethods::mirror_request())
                .allow_headers(AllowHeaders::mirror_request())
                .allow_credentials(true)
        } else {
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        CorsLayer::permissive()
    } else {
        ::tracing::warn!("No CORS origins configured; cross-origin requests will be rejected");
        CorsLayer::new()
    }
}

/// Full application router with all layers applied.
pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::<AppState>::new()
        .route("/", get(|| async { "sap-portal-api up" }))
        .merge(handlers::health::health_routes())
        .merge(handlers::catalog_routes())
        .merge(handlers::portal_routes())
        .merge(openapi::swagger_ui())
        .layer(tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
