use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::error::Category;
use thiserror::Error;

/// Message shown for any failure that happened before a response arrived.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{}", rejected_message(.status, .message))]
    Rejected {
        status: StatusCode,
        /// The `error` field of the response body, when the server sent one.
        message: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

fn rejected_message(status: &StatusCode, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("Request failed with status {}", status),
    }
}

impl ApiError {
    /// Decode failure for a 2xx body from `endpoint`.
    ///
    /// Only the failure kind and position are kept. Bodies from the auth
    /// endpoints carry tokens, and serde's own messages quote input values.
    pub(crate) fn undecodable(endpoint: &str, err: &serde_json::Error) -> Self {
        let kind = match err.classify() {
            Category::Io => "unreadable body",
            Category::Syntax => "malformed JSON",
            Category::Data => "unexpected JSON shape",
            Category::Eof => "truncated JSON",
        };
        ApiError::InvalidResponse(format!(
            "{} returned {} at line {} column {}",
            endpoint,
            kind,
            err.line(),
            err.column()
        ))
    }

    /// Build a rejection from a non-2xx status and its raw body.
    ///
    /// The backend reports failures as `{"error": "..."}`; any other body
    /// shape leaves `message` empty.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.is_empty());
        ApiError::Rejected { status, message }
    }

    /// HTTP status for server rejections, `None` for everything else.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// True when no response was received at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    /// One-line message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            ApiError::Rejected { status, message } => rejected_message(status, message),
            ApiError::InvalidResponse(_) => "Unexpected response from server".to_string(),
            ApiError::InvalidRequest(detail) => format!("Invalid request: {}", detail),
        }
    }
}
