//! Typed client for the portal endpoints.
//!
//! Mirrors what a portal frontend does: one request per operation, dates
//! reformatted for display, and every failure reduced to a single message
//! that can be shown to the user as-is.

use chrono::NaiveDate;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::errors::ErrorResponse;
use crate::portals::{Method, Operation, Portal};

const DISPLAY_DATE: &str = "%d %b %Y";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The service answered with an error body.
    #[error("{status}: {message}")]
    Api {
        status: u16,
        message: String,
        details: Option<String>,
    },

    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    /// The one string a user gets to see.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { message, .. } => message.clone(),
            ClientError::UnknownOperation(name) => format!("Unknown operation: {}", name),
            ClientError::Transport(_) => {
                "Could not reach the portal service. Please try again later.".to_string()
            }
            ClientError::Decode(_) => {
                "The portal service returned an unexpected response.".to_string()
            }
        }
    }
}

/// Client bound to one portal of one deployment.
#[derive(Clone)]
pub struct PortalClient {
    http: reqwest::Client,
    base_url: String,
    portal: Portal,
    token: Option<String>,
}

impl PortalClient {
    pub fn new(base_url: &str, portal: Portal, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("portal-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            portal,
            token: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn portal(&self) -> Portal {
        self.portal
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Logs in and keeps the returned session token for later calls.
    pub async fn login(&mut self, identifier: &str, password: &str) -> Result<Value, ClientError> {
        let operation = self
            .portal
            .login_operation()
            .ok_or_else(|| ClientError::UnknownOperation("login".to_string()))?;

        let params = HashMap::from([
            (self.portal.identifier().to_string(), identifier.to_string()),
            ("password".to_string(), password.to_string()),
        ]);
        let payload = self.send(operation, &params).await?;

        self.token = payload
            .get("token")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(payload)
    }

    /// Calls the named operation of this client's portal.
    pub async fn call(
        &self,
        name: &str,
        params: &HashMap<String, String>,
    ) -> Result<Value, ClientError> {
        let operation = self
            .portal
            .operation(name)
            .ok_or_else(|| ClientError::UnknownOperation(name.to_string()))?;
        let mut payload = self.send(operation, params).await?;
        format_dates(operation, &mut payload);
        Ok(payload)
    }

    async fn send(
        &self,
        operation: &Operation,
        params: &HashMap<String, String>,
    ) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, operation.path());
        debug!(%url, "calling portal operation");

        let request = match operation.method {
            Method::Get => self.http.get(&url).query(params),
            Method::Post => self.http.post(&url).json(params),
        };
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

fn api_error(status: StatusCode, body: &[u8]) -> ClientError {
    match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(error) => ClientError::Api {
            status: status.as_u16(),
            message: error.message,
            details: error.details,
        },
        Err(_) => ClientError::Api {
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
            details: None,
        },
    }
}

/// `2024-01-15` becomes `15 Jan 2024`; anything else is returned unchanged.
pub fn display_date(value: &str) -> String {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.format(DISPLAY_DATE).to_string())
        .unwrap_or_else(|_| value.to_string())
}

/// Rewrites the operation's date fields in one record or a list of records.
pub fn format_dates(operation: &Operation, payload: &mut Value) {
    let records: Vec<&mut Value> = match payload {
        Value::Array(items) => items.iter_mut().collect(),
        record @ Value::Object(_) => vec![record],
        _ => return,
    };

    for record in records {
        for field in operation.date_fields() {
            if let Some(Value::String(text)) = record.get_mut(field) {
                *text = display_date(text);
            }
        }
    }
}
