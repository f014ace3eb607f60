//! Outbound HTTP to the SAP backend.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

use crate::config::SapConfig;

/// One outbound call, fully prepared.
#[derive(Debug, Clone, PartialEq)]
pub enum SapRequest {
    /// POST of a SOAP envelope.
    Soap {
        url: Url,
        action: String,
        envelope: String,
    },
    /// GET of an OData entity set.
    OData { url: Url },
}

impl SapRequest {
    pub fn url(&self) -> &Url {
        match self {
            SapRequest::Soap { url, .. } | SapRequest::OData { url } => url,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// SAP answered with a non-2xx status.
    #[error("SAP returned status {status}")]
    Status { status: u16, body: String },

    /// The request was sent but nothing usable came back (refused, timed out, cut off).
    #[error("no response from SAP: {0}")]
    NoResponse(String),

    /// The request could not be built.
    #[error("could not set up SAP request: {0}")]
    Setup(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SapTransport: Send + Sync {
    /// Sends the request and returns the raw body of a 2xx reply.
    async fn send(&self, request: SapRequest) -> Result<String, InvokeError>;
}

/// reqwest-backed transport using basic authentication against the SAP system.
pub struct HttpTransport {
    client: reqwest::Client,
    username: String,
    password: String,
}

impl HttpTransport {
    pub fn new(config: &SapConfig) -> Result<Self, InvokeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("sap-portal-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InvokeError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }
}

fn classify(err: reqwest::Error) -> InvokeError {
    if err.is_builder() {
        InvokeError::Setup(err.to_string())
    } else {
        InvokeError::NoResponse(err.to_string())
    }
}

#[async_trait]
impl SapTransport for HttpTransport {
    async fn send(&self, request: SapRequest) -> Result<String, InvokeError> {
        let started = Instant::now();
        let target = request.url().path().to_string();

        let builder = match request {
            SapRequest::Soap {
                url,
                action,
                envelope,
            } => self
                .client
                .post(url)
                .header(CONTENT_TYPE, "text/xml; charset=utf-8")
                .header("SOAPAction", action)
                .body(envelope),
            SapRequest::OData { url } => self
                .client
                .get(url)
                .header(ACCEPT, "application/json"),
        };

        let response = builder
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|err| {
                warn!(target_path = %target, error = %err, "SAP request failed");
                classify(err)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(classify)?;
        debug!(
            target_path = %target,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "SAP call completed"
        );

        if status.is_success() {
            Ok(body)
        } else {
            Err(InvokeError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{basic_auth, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> SapConfig {
        SapConfig {
            base_url: base_url.to_string(),
            client: "100".to_string(),
            username: "PORTAL".to_string(),
            password: "secret".to_string(),
            timeout_secs: 2,
        }
    }

    #[tokio::test]
    async fn soap_call_posts_envelope_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sap/bc/srt/scs/sap/zcust_portal"))
            .and(header("content-type", "text/xml; charset=utf-8"))
            .and(header("soapaction", "urn:sap-com:document:sap:rfc:functions:ZFM_X"))
            .and(basic_auth("PORTAL", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<ok/>"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&config(&server.uri())).unwrap();
        let url = Url::parse(&format!("{}/sap/bc/srt/scs/sap/zcust_portal", server.uri())).unwrap();
        let body = transport
            .send(SapRequest::Soap {
                url,
                action: "urn:sap-com:document:sap:rfc:functions:ZFM_X".into(),
                envelope: "<x/>".into(),
            })
            .await
            .unwrap();
        assert_eq!(body, "<ok/>");
    }

    #[tokio::test]
    async fn error_status_keeps_the_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such service"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&config(&server.uri())).unwrap();
        let url = Url::parse(&format!("{}/sap/opu/odata/sap/X/Y", server.uri())).unwrap();
        let err = transport.send(SapRequest::OData { url }).await.unwrap_err();
        assert_matches!(
            err,
            InvokeError::Status { status: 404, body } if body == "no such service"
        );
    }

    #[tokio::test]
    async fn refused_connection_is_no_response() {
        let transport = HttpTransport::new(&config("http://127.0.0.1:1")).unwrap();
        let url = Url::parse("http://127.0.0.1:1/sap/opu/odata/sap/X/Y").unwrap();
        let err = transport.send(SapRequest::OData { url }).await.unwrap_err();
        assert_matches!(err, InvokeError::NoResponse(_));
    }
}
