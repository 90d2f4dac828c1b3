use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a failed request as seen by a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    Auth,
    Forbidden,
    Format,
    Validation,
    NotFound,
    Server,
    Busy,
    Unsupported,
}

/// Error body returned by the backend on failed requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Extracts the server's message as sent, ignoring blank or non-string values.
    pub fn message_from(raw: &serde_json::Value) -> Option<String> {
        serde_json::from_value::<ApiErrorBody>(raw.clone())
            .ok()
            .and_then(|body| body.message)
            .filter(|message| !message.trim().is_empty())
    }
}

/// A response body did not have any of the recognized shapes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected response format: {reason}")]
pub struct FormatError {
    pub reason: String,
}

impl FormatError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
