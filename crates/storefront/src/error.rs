//! Typed errors for storefront backend calls.
//!
//! Every failed request, whether the backend answered with an error status or
//! never answered at all, becomes an [`ApiError`] carrying an [`ErrorKind`].
//! Callers branch on the kind instead of inspecting response shapes.

use core::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Classification of a failed backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request was malformed; the user has to fix the input (400/422).
    Validation,
    /// Missing, expired or insufficient credentials (401/403).
    Unauthorized,
    /// The addressed resource does not exist (404).
    NotFound,
    /// Everything else, including transport failures with no response.
    Server,
}

impl ErrorKind {
    /// Classify an HTTP status code.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::Validation,
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            _ => Self::Server,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validation => "validation error",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not found",
            Self::Server => "server error",
        })
    }
}

/// A field-level validation problem reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Offending field, when the backend names one.
    pub field: Option<String>,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Error returned by every backend call.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    /// HTTP status, absent when no response was received.
    pub status: Option<u16>,
    /// Display text: the backend's message, the status line, or the transport failure.
    pub message: String,
    /// Message taken from the error body, when the backend sent one.
    pub server_message: Option<String>,
    /// Field-level validation details, if any.
    pub details: Vec<FieldError>,
}

impl ApiError {
    /// Error for a request that never produced a usable response.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Server,
            status: None,
            message: message.into(),
            server_message: None,
            details: Vec::new(),
        }
    }

    /// Build an error from a non-success status and its raw body.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
        let (server_message, details) = parsed.map_or_else(
            || (None, Vec::new()),
            |body| {
                let details = body.errors.as_ref().map(field_errors).unwrap_or_default();
                let message = body
                    .message
                    .or(body.error)
                    .filter(|message| !message.trim().is_empty());
                (message, details)
            },
        );

        Self {
            kind: ErrorKind::from_status(status),
            status: Some(status),
            message: server_message
                .clone()
                .unwrap_or_else(|| format!("HTTP {status}")),
            server_message,
            details,
        }
    }

    /// Whether retrying the same request could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.kind, ErrorKind::Server)
    }

    /// Human-readable message for a failed product write.
    #[must_use]
    pub fn user_message(&self, action: WriteAction) -> String {
        match self.kind {
            ErrorKind::Validation => {
                if !self.details.is_empty() {
                    let details = self
                        .details
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("; ");
                    format!("Invalid product data: {details}")
                } else if let Some(message) = self.server_message() {
                    format!("Invalid product data: {message}")
                } else {
                    "Invalid product data. Please review the form.".to_string()
                }
            }
            ErrorKind::Unauthorized => {
                "Your admin session has expired. Please sign in again.".to_string()
            }
            ErrorKind::NotFound => "The product no longer exists.".to_string(),
            ErrorKind::Server => format!(
                "Could not {} the product. Please try again later.",
                action.verb()
            ),
        }
    }

    /// The backend's own message, if it sent one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        self.server_message.as_deref()
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        Self {
            kind: status.map_or(ErrorKind::Server, ErrorKind::from_status),
            status,
            message: err.to_string(),
            server_message: None,
            details: Vec::new(),
        }
    }
}

/// The authenticated product operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Create,
    Update,
    Delete,
}

impl WriteAction {
    const fn verb(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for WriteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Error body shape used by the backend.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

/// Extract field errors from either a list of `{field|param|path, msg|message}`
/// objects or a `{field: message}` map.
fn field_errors(value: &serde_json::Value) -> Vec<FieldError> {
    use serde_json::Value;

    fn text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map
                .get("msg")
                .or_else(|| map.get("message"))
                .and_then(Value::as_str)
                .map(str::to_owned),
            _ => None,
        }
    }

    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let message = text(item)?;
                let field = item
                    .get("field")
                    .or_else(|| item.get("param"))
                    .or_else(|| item.get("path"))
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                Some(FieldError { field, message })
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(field, v)| {
                Some(FieldError {
                    field: Some(field.clone()),
                    message: text(v)?,
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}
