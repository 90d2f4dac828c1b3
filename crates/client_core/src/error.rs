use shared::error::{FailureKind, FormatError};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("network failure: {message}")]
    Network { message: String, timed_out: bool },
    #[error("not authenticated")]
    Auth { message: Option<String> },
    #[error("forbidden")]
    Forbidden { message: Option<String> },
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("request rejected ({status}): {message}")]
    Validation { status: u16, message: String },
    #[error("endpoint not found: {path}")]
    NotFound { path: String },
    #[error("server error ({status})")]
    Server { status: u16, message: Option<String> },
    #[error("another operation is already in progress")]
    Busy,
    #[error("{operation} is not supported for {resource}")]
    Unsupported {
        resource: &'static str,
        operation: &'static str,
    },
    #[error("missing required field `{0}`")]
    MissingField(String),
}

impl ClientError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network { .. } => FailureKind::Network,
            Self::Auth { .. } => FailureKind::Auth,
            Self::Forbidden { .. } => FailureKind::Forbidden,
            Self::Format(_) => FailureKind::Format,
            Self::Validation { .. } | Self::MissingField(_) => FailureKind::Validation,
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::Server { .. } => FailureKind::Server,
            Self::Busy => FailureKind::Busy,
            Self::Unsupported { .. } => FailureKind::Unsupported,
        }
    }

    /// The backend's own message, when it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Auth { message } | Self::Forbidden { message } | Self::Server { message, .. } => {
                message.as_deref()
            }
            Self::Validation { message, .. } => Some(message),
            _ => None,
        }
    }

    pub(crate) fn from_transport(err: &reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
            timed_out: err.is_timeout(),
        }
    }

    /// Maps a non-success status and its decoded body onto the failure taxonomy.
    pub(crate) fn from_status(status: u16, path: &str, message: Option<String>) -> Self {
        match (status, message) {
            (401, message) => Self::Auth { message },
            (403, message) => Self::Forbidden { message },
            (404, None) => Self::NotFound {
                path: path.to_string(),
            },
            (400..=499, Some(message)) => Self::Validation { status, message },
            (status, message) => Self::Server { status, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_failure_taxonomy() {
        assert_eq!(
            ClientError::from_status(401, "/x", None).kind(),
            FailureKind::Auth
        );
        assert_eq!(
            ClientError::from_status(403, "/x", Some("no".into())).kind(),
            FailureKind::Forbidden
        );
        assert_eq!(
            ClientError::from_status(404, "/x", None).kind(),
            FailureKind::NotFound
        );
        assert_eq!(
            ClientError::from_status(404, "/x", Some("Admin topilmadi".into())).kind(),
            FailureKind::Validation
        );
        assert_eq!(
            ClientError::from_status(422, "/x", Some("Email band".into())).kind(),
            FailureKind::Validation
        );
        assert_eq!(
            ClientError::from_status(400, "/x", None).kind(),
            FailureKind::Server
        );
        assert_eq!(
            ClientError::from_status(500, "/x", Some("boom".into())).kind(),
            FailureKind::Server
        );
    }

    #[test]
    fn server_message_is_exposed_verbatim() {
        let err = ClientError::from_status(409, "/api/staff/create-admin", Some("Email band".into()));
        assert_eq!(err.server_message(), Some("Email band"));
        assert_eq!(ClientError::Busy.server_message(), None);
    }
}
