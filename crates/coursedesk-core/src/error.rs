//! Error types for the coursedesk client.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, API rejection, and input validation errors.
//! Every variant is `Clone` so a single refresh failure can be handed to all
//! requests waiting on it.

use std::fmt;
use thiserror::Error;

/// The unified error type for coursedesk operations.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (bad credentials, missing refresh token).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The server rejected the request with a non-success status.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Input validation errors (malformed token, bad URL, bad body).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns the HTTP status if the server produced this error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(api) => Some(api.status),
            _ => None,
        }
    }

    /// Check if this is an HTTP 401 from the server.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Api(api) if api.is_unauthorized())
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// Response body could not be decoded.
    #[error("malformed response body: {message}")]
    Decode { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The login endpoint rejected the credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No refresh token is available to renew the session.
    #[error("no refresh token available")]
    RefreshTokenMissing,

    /// The access token returned by the server carries no usable identity.
    #[error("access token carries no identity: {reason}")]
    UnreadableIdentity { reason: String },
}

/// A non-success response from the REST backend.
///
/// The body is kept as-is so field-level validation errors reach the caller
/// untouched.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// `detail` message from the server, if present.
    pub detail: Option<String>,
    /// Machine-readable `code`, if present (e.g. `token_not_valid`).
    pub code: Option<String>,
    /// The full response body when it was JSON.
    pub body: Option<serde_json::Value>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref code) = self.code {
            write!(f, " [{}]", code)?;
        }
        if let Some(ref detail) = self.detail {
            write!(f, ": {}", detail)?;
        } else if let Some(ref body) = self.body {
            write!(f, ": {}", body)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Create an API error from a status and an optional JSON body.
    pub fn new(status: u16, body: Option<serde_json::Value>) -> Self {
        let field = |name: &str| {
            body.as_ref()
                .and_then(|b| b.get(name))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        let detail = field("detail");
        let code = field("code");
        Self {
            status,
            detail,
            code,
            body,
        }
    }

    /// Check if this is an authorization failure.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Returns the messages the server attached to a given field, if any.
    pub fn field_errors(&self, field: &str) -> Vec<String> {
        match self.body.as_ref().and_then(|b| b.get(field)) {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(serde_json::Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }
}

/// Input validation errors.
#[derive(Debug, Clone, Error)]
pub enum InvalidInputError {
    /// Malformed JWT.
    #[error("invalid token: {reason}")]
    Token { reason: String },

    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_error_extracts_detail_and_code() {
        let err = ApiError::new(
            401,
            Some(json!({"detail": "Token is invalid or expired", "code": "token_not_valid"})),
        );
        assert!(err.is_unauthorized());
        assert_eq!(err.code.as_deref(), Some("token_not_valid"));
        assert_eq!(
            err.to_string(),
            "HTTP 401 [token_not_valid]: Token is invalid or expired"
        );
    }

    #[test]
    fn api_error_keeps_field_errors() {
        let err = ApiError::new(
            400,
            Some(json!({"username": ["A user with that username already exists."]})),
        );
        assert_eq!(
            err.field_errors("username"),
            vec!["A user with that username already exists.".to_string()]
        );
        assert!(err.field_errors("email").is_empty());
        assert!(err.to_string().starts_with("HTTP 400: "));
    }

    #[test]
    fn status_only_for_api_errors() {
        let err: Error = ApiError::new(503, None).into();
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_unauthorized());

        let err: Error = AuthError::RefreshTokenMissing.into();
        assert_eq!(err.status(), None);
    }
}
