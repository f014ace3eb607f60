//! HTTP handlers.
//!
//! Portal routes are generated from the operation catalog; each one runs the
//! same proxy flow with its descriptor bound in.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::{get, on, MethodFilter},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::info;

use crate::auth::SessionGuard;
use crate::errors::ServiceError;
use crate::portals::{self, Method, Operation, Portal};
use crate::sap::Inputs;
use crate::AppState;

pub mod health;

/// One route per catalog entry, mounted at `/{portal}/api/...`.
pub fn portal_routes() -> Router<AppState> {
    portals::catalog().fold(Router::new(), |router, operation| {
        let filter = match operation.method {
            Method::Get => MethodFilter::GET,
            Method::Post => MethodFilter::POST,
        };
        router.route(
            &operation.path(),
            on(
                filter,
                move |State(state): State<AppState>,
                      session: SessionGuard,
                      Query(query): Query<HashMap<String, String>>,
                      body: Bytes| {
                    proxy_operation(operation, state, session, query, body)
                },
            ),
        )
    })
}

/// Catalog discovery routes
pub fn catalog_routes() -> Router<AppState> {
    Router::new().route("/api/operations", get(list_operations))
}

async fn proxy_operation(
    operation: &'static Operation,
    state: AppState,
    session: SessionGuard,
    query: HashMap<String, String>,
    body: Bytes,
) -> Result<Response, ServiceError> {
    let mut inputs: Inputs = query;
    merge_body(&mut inputs, &body)?;
    session.bind(operation, &mut inputs, state.config.require_session)?;

    let mut payload = state.proxy.execute(operation, &inputs).await?;

    if operation.is_login() {
        let subject = inputs
            .get(operation.portal.identifier())
            .map(|value| value.trim().to_string())
            .unwrap_or_default();
        let issued = state.sessions.issue(operation.portal, &subject)?;
        info!(portal = %operation.portal, "portal login succeeded");

        if let Value::Object(fields) = &mut payload {
            fields.insert("token".to_string(), Value::String(issued.token));
            fields.insert(
                "tokenType".to_string(),
                Value::String(issued.token_type.to_string()),
            );
            fields.insert("expiresIn".to_string(), Value::from(issued.expires_in));
        }
    }

    Ok(Json(payload).into_response())
}

/// Merges a JSON object body into the query parameters; body values win.
///
/// Strings, numbers and booleans are accepted, `null` is ignored.
pub fn merge_body(inputs: &mut Inputs, body: &[u8]) -> Result<(), ServiceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }

    let parsed: Value = serde_json::from_slice(body)
        .map_err(|e| ServiceError::BadRequest(format!("request body is not valid JSON: {}", e)))?;
    let Value::Object(fields) = parsed else {
        return Err(ServiceError::BadRequest(
            "request body must be a JSON object".to_string(),
        ));
    };

    for (name, value) in fields {
        let value = match value {
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Null => continue,
            Value::Array(_) | Value::Object(_) => {
                return Err(ServiceError::BadRequest(format!(
                    "{} must be a string or number",
                    name
                )))
            }
        };
        inputs.insert(name, value);
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct CatalogQuery {
    portal: Option<String>,
}

#[derive(Debug, Serialize)]
struct CatalogEntry {
    path: String,
    #[serde(flatten)]
    operation: &'static Operation,
}

async fn list_operations(
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<CatalogEntry>>, ServiceError> {
    let portal = query
        .portal
        .as_deref()
        .map(str::parse::<Portal>)
        .transpose()
        .map_err(ServiceError::BadRequest)?;

    let entries = portals::catalog()
        .filter(|operation| portal.map_or(true, |portal| operation.portal == portal))
        .map(|operation| CatalogEntry {
            path: operation.path(),
            operation,
        })
        .collect();
    Ok(Json(entries))
}
