use reqwest::StatusCode;
use thiserror::Error;

use super::StoreError;
use crate::api::{ApiError, NETWORK_ERROR_MESSAGE};

/// Message used when a login rejection carries no server explanation.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";

/// Message used when a restored token is refused without explanation.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session is no longer valid";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingCredentials,

    /// The server refused the credentials; `message` is shown verbatim.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network(#[source] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to persist session: {0}")]
    Storage(#[from] StoreError),
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Rejected { status, message } => AuthError::Rejected {
                status,
                message: message.unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string()),
            },
            ApiError::Network(e) => AuthError::Network(e),
            ApiError::InvalidResponse(detail) => AuthError::InvalidResponse(detail),
            ApiError::InvalidRequest(detail) => AuthError::InvalidRequest(detail),
        }
    }
}

impl AuthError {
    /// Classify a failed identity check on a restored token.
    pub(crate) fn from_validation(err: ApiError) -> Self {
        match err {
            ApiError::Rejected { status, message } => AuthError::Rejected {
                status,
                message: message.unwrap_or_else(|| SESSION_EXPIRED_MESSAGE.to_string()),
            },
            other => other.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, AuthError::Network(_))
    }

    /// One-line message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidResponse(_) => "Unexpected response from server".to_string(),
            other => other.to_string(),
        }
    }
}
