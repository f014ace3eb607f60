//! Portal sessions.
//!
//! A successful login yields a signed token naming the portal and the
//! identifier SAP accepted. Later calls may present it as a bearer token; the
//! guard then supplies or checks the identifier so a caller cannot read
//! another partner's documents with their own session.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::portals::{Operation, Portal};
use crate::sap::{convert, Inputs};
use crate::AppState;

const ISSUER: &str = "sap-portal-api";

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Identifier accepted by SAP at login (customer, vendor or personnel number)
    pub sub: String,
    /// Portal slug the session was issued for
    pub portal: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Token handed back by a successful login
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedSession {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// Issues and validates HS256 session tokens
#[derive(Clone)]
pub struct SessionService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, portal: Portal, subject: &str) -> Result<IssuedSession, ServiceError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.ttl)
                .map_err(|_| ServiceError::Internal("invalid session lifetime".to_string()))?;

        let claims = SessionClaims {
            sub: subject.to_string(),
            portal: portal.slug().to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: ISSUER.to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ServiceError::Internal(format!("session token creation failed: {}", e)))?;

        Ok(IssuedSession {
            token,
            token_type: "Bearer",
            expires_in: self.ttl.as_secs(),
        })
    }

    pub fn validate(&self, token: &str) -> Result<SessionClaims, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);

        decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ServiceError::Unauthorized("session has expired".to_string())
                }
                _ => ServiceError::Unauthorized("invalid session token".to_string()),
            })
    }
}

/// Session presented by the caller.
///
/// A bad token is kept as `Rejected` rather than failing extraction, so login
/// stays reachable for a frontend still holding an expired session.
#[derive(Debug, Clone, Default)]
pub enum SessionGuard {
    #[default]
    Anonymous,
    Valid(SessionClaims),
    Rejected(String),
}

impl SessionGuard {
    pub fn claims(&self) -> Option<&SessionClaims> {
        match self {
            SessionGuard::Valid(claims) => Some(claims),
            _ => None,
        }
    }

    /// Applies the session to one call of `operation`.
    ///
    /// Login never needs a session and ignores a rejected one. Otherwise the
    /// session must belong to the operation's portal; it fills in the portal
    /// identifier when the request omits it and rejects a request naming a
    /// different one.
    pub fn bind(
        &self,
        operation: &Operation,
        inputs: &mut Inputs,
        require_session: bool,
    ) -> Result<(), ServiceError> {
        if operation.is_login() {
            return Ok(());
        }

        let claims = match self {
            SessionGuard::Valid(claims) => claims,
            SessionGuard::Rejected(reason) => {
                return Err(ServiceError::Unauthorized(reason.clone()))
            }
            SessionGuard::Anonymous if require_session => {
                return Err(ServiceError::Unauthorized(
                    "a session token is required".to_string(),
                ))
            }
            SessionGuard::Anonymous => return Ok(()),
        };

        if claims.portal != operation.portal.slug() {
            return Err(ServiceError::Forbidden(format!(
                "session was issued for the {} portal",
                claims.portal
            )));
        }

        let identifier = operation.portal.identifier();
        let supplied = inputs
            .get(identifier)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty());

        match supplied {
            None => {
                debug!(identifier, "identifier taken from session");
                inputs.insert(identifier.to_string(), claims.sub.clone());
                Ok(())
            }
            Some(value) if same_identifier(operation, value, &claims.sub) => Ok(()),
            Some(_) => Err(ServiceError::Forbidden(format!(
                "{} does not match the session",
                identifier
            ))),
        }
    }
}

/// Compares identifiers after SAP conversion, so `1000` and `0000001000` match.
fn same_identifier(operation: &Operation, left: &str, right: &str) -> bool {
    let identifier = operation.portal.identifier();
    match operation.input(identifier) {
        Some(field) => {
            let convert = |value: &str| convert::to_sap(field.kind, field.name, value).ok();
            convert(left) == convert(right)
        }
        None => left.trim() == right.trim(),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionGuard {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(SessionGuard::Anonymous);
        };

        let Ok(value) = header.to_str() else {
            return Ok(SessionGuard::Rejected(
                "malformed Authorization header".to_string(),
            ));
        };
        let Some(token) = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
        else {
            return Ok(SessionGuard::Rejected("expected a Bearer token".to_string()));
        };

        Ok(match state.sessions.validate(token) {
            Ok(claims) => SessionGuard::Valid(claims),
            Err(ServiceError::Unauthorized(reason)) => {
                debug!(%reason, "session token rejected");
                SessionGuard::Rejected(reason)
            }
            Err(err) => SessionGuard::Rejected(err.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SECRET: &str = "test-session-secret-with-at-least-32-chars";

    fn service() -> SessionService {
        SessionService::new(SECRET, Duration::from_secs(3600))
    }

    fn guard_for(portal: Portal, subject: &str) -> SessionGuard {
        let sessions = service();
        let issued = sessions.issue(portal, subject).unwrap();
        SessionGuard::Valid(sessions.validate(&issued.token).unwrap())
    }

    fn profile(portal: Portal) -> &'static Operation {
        portal.operation("profile").unwrap()
    }

    #[test]
    fn issued_token_round_trips() {
        let sessions = service();
        let issued = sessions.issue(Portal::Vendor, "4711").unwrap();
        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 3600);

        let claims = sessions.validate(&issued.token).unwrap();
        assert_eq!(claims.sub, "4711");
        assert_eq!(claims.portal, "vendor");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = SessionService::new("another-secret-that-is-long-enough-too", Duration::from_secs(60));
        let issued = other.issue(Portal::Customer, "1000").unwrap();
        assert_matches!(service().validate(&issued.token), Err(ServiceError::Unauthorized(_)));
        assert_matches!(service().validate("garbage"), Err(ServiceError::Unauthorized(_)));
    }

    #[test]
    fn session_fills_missing_identifier() {
        let mut inputs = Inputs::new();
        guard_for(Portal::Customer, "1000")
            .bind(profile(Portal::Customer), &mut inputs, false)
            .unwrap();
        assert_eq!(inputs.get("customerId").map(String::as_str), Some("1000"));
    }

    #[test]
    fn padded_identifier_matches_session() {
        let mut inputs = Inputs::from([("customerId".to_string(), "0000001000".to_string())]);
        guard_for(Portal::Customer, "1000")
            .bind(profile(Portal::Customer), &mut inputs, false)
            .unwrap();
    }

    #[test]
    fn foreign_identifier_is_forbidden() {
        let mut inputs = Inputs::from([("customerId".to_string(), "2000".to_string())]);
        let err = guard_for(Portal::Customer, "1000")
            .bind(profile(Portal::Customer), &mut inputs, false)
            .unwrap_err();
        assert_matches!(err, ServiceError::Forbidden(_));
    }

    #[test]
    fn session_of_other_portal_is_forbidden() {
        let mut inputs = Inputs::new();
        let err = guard_for(Portal::Customer, "1000")
            .bind(profile(Portal::Vendor), &mut inputs, false)
            .unwrap_err();
        assert_matches!(err, ServiceError::Forbidden(_));
    }

    #[test]
    fn anonymous_calls_depend_on_configuration() {
        let mut inputs = Inputs::new();
        let anonymous = SessionGuard::default();
        assert!(anonymous
            .bind(profile(Portal::Employee), &mut inputs, false)
            .is_ok());
        assert_matches!(
            anonymous.bind(profile(Portal::Employee), &mut inputs, true),
            Err(ServiceError::Unauthorized(_))
        );

        let login = Portal::Employee.login_operation().unwrap();
        assert!(anonymous.bind(login, &mut inputs, true).is_ok());
    }

    #[test]
    fn rejected_token_blocks_calls_but_not_login() {
        let stale = SessionGuard::Rejected("session has expired".to_string());
        let mut inputs = Inputs::new();
        assert_matches!(
            stale.bind(profile(Portal::Customer), &mut inputs, false),
            Err(ServiceError::Unauthorized(reason)) if reason == "session has expired"
        );

        let login = Portal::Customer.login_operation().unwrap();
        assert!(stale.bind(login, &mut inputs, true).is_ok());
    }

    #[test]
    fn maintenance_session_matches_unpadded_personnel_number() {
        let plants = Portal::Maintenance.operation("plants").unwrap();
        let mut inputs = Inputs::from([("empId".to_string(), "42".to_string())]);
        guard_for(Portal::Maintenance, "00000042")
            .bind(plants, &mut inputs, true)
            .unwrap();

        let mut inputs = Inputs::from([("empId".to_string(), "43".to_string())]);
        assert_matches!(
            guard_for(Portal::Maintenance, "00000042").bind(plants, &mut inputs, true),
            Err(ServiceError::Forbidden(_))
        );
    }
}
