//! Client error taxonomy.
//!
//! Every failure a caller can observe is a [`ClientError`]. Server error bodies
//! are parsed into a human-readable message so the front end can present
//! validation, authentication and transport failures the same way.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the complaint API client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the credential (HTTP 401).
    #[error("authentication failed: {message}")]
    Unauthorized { message: String },

    /// The requested resource does not exist (HTTP 404).
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Any other non-success response.
    #[error("server returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    /// Connection failure, timeout, or other transport-level problem.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The server answered but the body was not what we expected.
    #[error("unexpected response from server: {0}")]
    Decode(String),

    /// Login succeeded at the HTTP level but carried no access token.
    #[error("login response did not include an access token")]
    MissingToken,

    /// Input rejected before any request was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Reading or writing the persisted token failed.
    #[error("token storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ClientError {
    /// Build an error from a non-success status and its raw body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                trimmed.to_string()
            }
        });

        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized { message },
            StatusCode::NOT_FOUND => ClientError::NotFound { message },
            _ => ClientError::Api { status, message },
        }
    }

    /// True when the server signalled an invalid or expired credential.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    /// HTTP status of the failing response, if there was one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ClientError::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status(),
            _ => None,
        }
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Unauthorized { message }
            | ClientError::NotFound { message }
            | ClientError::Api { message, .. } => message.clone(),
            ClientError::Transport(err) if err.is_timeout() => {
                "The server took too long to respond".to_string()
            }
            ClientError::Transport(_) => "Unable to reach the server".to_string(),
            ClientError::Decode(_) => "The server sent an unexpected response".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err)
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

// -------------------------------------------------------------------------
// Server error bodies
// -------------------------------------------------------------------------

/// Error envelope returned by the API server.
///
/// The server answers with `{"detail": "..."}` for business failures and
/// `{"detail": [{"loc": [...], "msg": "..."}]}` for request validation.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    detail: Option<ErrorDetail>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Validation(Vec<ValidationIssue>),
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct ValidationIssue {
    #[serde(default)]
    loc: Vec<serde_json::Value>,
    msg: String,
}

impl ValidationIssue {
    fn describe(&self) -> String {
        let field = self.loc.iter().rev().find_map(|part| match part {
            serde_json::Value::String(name) if name != "body" && name != "query" => {
                Some(name.clone())
            }
            _ => None,
        });

        match field {
            Some(field) => format!("{}: {}", field, self.msg),
            None => self.msg.clone(),
        }
    }
}

fn extract_message(body: &str) -> Option<String> {
    let response: ErrorResponse = serde_json::from_str(body).ok()?;

    match response.detail {
        Some(ErrorDetail::Message(message)) => Some(message),
        Some(ErrorDetail::Validation(issues)) if !issues.is_empty() => Some(
            issues
                .iter()
                .map(ValidationIssue::describe)
                .collect::<Vec<_>>()
                .join("; "),
        ),
        Some(ErrorDetail::Other(value)) if !value.is_null() => Some(value.to_string()),
        _ => response.message,
    }
}
