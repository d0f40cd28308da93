//! Data API error taxonomy and its user-facing presentation.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the Data API.
///
/// Variants map one-to-one onto how pages surface failures: validation
/// errors attach to a field, conflicts block with a notice, not-found marks
/// the client's state as stale, and everything else becomes a retryable
/// failure on the triggering control.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected a field value (HTTP 422).
    #[error("validation error: {message}")]
    Validation {
        /// Offending field, when the server names one.
        field: Option<String>,
        message: String,
    },

    /// The operation conflicts with current server state (HTTP 409), e.g.
    /// creating a second offer for a product that already has one.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The target no longer exists (HTTP 404): the client was acting on
    /// stale state and should refresh the affected listing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to parse a response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Shape of the Data API's JSON error body. Validation failures carry a
/// per-field message map; everything else just a message.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: BTreeMap<String, Vec<String>>,
}

impl ApiError {
    /// Map a non-success response onto the taxonomy.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = if parsed.message.is_empty() {
            body.chars().take(200).collect()
        } else {
            parsed.message.clone()
        };
        match status {
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            422 => {
                let named = parsed
                    .errors
                    .iter()
                    .next()
                    .map(|(field, messages)| (field.clone(), messages.first().cloned()));
                match named {
                    Some((field, Some(field_message))) => Self::Validation {
                        field: Some(field),
                        message: field_message,
                    },
                    Some((field, None)) => Self::Validation {
                        field: Some(field),
                        message,
                    },
                    None => Self::Validation {
                        field: None,
                        message,
                    },
                }
            }
            _ => Self::Api { status, message },
        }
    }

    /// Whether retrying the same request may help. Only transport and
    /// server-side failures qualify; the rest need changed input or
    /// refreshed state first.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api { .. })
    }
}

/// How a failure notice should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Inline, next to the offending field.
    Field,
    /// Blocking banner; the action cannot proceed as submitted.
    Blocking,
    /// Dismissible banner; the affected listing should refresh.
    Stale,
    /// Dismissible banner; the action may simply be retried.
    Retry,
}

/// User-facing notice derived from a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl From<&ApiError> for Notice {
    fn from(error: &ApiError) -> Self {
        match error {
            ApiError::Validation { message, .. } => Self {
                kind: NoticeKind::Field,
                message: message.clone(),
            },
            ApiError::Conflict(message) => Self {
                kind: NoticeKind::Blocking,
                message: message.clone(),
            },
            ApiError::NotFound(_) => Self {
                kind: NoticeKind::Stale,
                message: "El elemento ya no existe. Se actualizará la lista.".to_string(),
            },
            ApiError::Http(_) => Self {
                kind: NoticeKind::Retry,
                message: "No pudimos conectar con el servidor. Vuelve a intentarlo.".to_string(),
            },
            ApiError::Api { .. } | ApiError::Parse(_) => Self {
                kind: NoticeKind::Retry,
                message: "Algo salió mal. Vuelve a intentarlo.".to_string(),
            },
        }
    }
}
