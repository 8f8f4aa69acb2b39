use std::fmt;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - session has been signed out")]
    Unauthorized,

    #[error("Server returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Server {
        status: reqwest::StatusCode,
        message: Option<String>,
        body: String,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Shape of an error payload; only `message` is used.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return ApiError::Unauthorized;
        }
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty());
        ApiError::Server {
            status,
            message,
            body: Self::truncate_body(body),
        }
    }
}

/// The only error taxonomy the presentation layer sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedError {
    /// The session was evicted; the user has to log in again.
    Unauthorized,
    /// The server answered with an error; carries its message.
    Server(String),
    /// The request went out but no response came back.
    Network,
    /// Anything else, including failures before the request was sent.
    Unexpected,
}

impl NormalizedError {
    pub fn message(&self) -> &str {
        match self {
            NormalizedError::Unauthorized => "Your session has expired. Please log in again.",
            NormalizedError::Server(message) => message,
            NormalizedError::Network => "Network error. Please check your connection.",
            NormalizedError::Unexpected => "An unexpected error occurred",
        }
    }
}

impl fmt::Display for NormalizedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Fallback when the server sent an error status without a message
const GENERIC_SERVER_MESSAGE: &str = "An error occurred";

/// Classify any error returned by [`ApiClient`](super::ApiClient) operations.
pub fn normalize_error(error: &anyhow::Error) -> NormalizedError {
    for cause in error.chain() {
        if let Some(api_error) = cause.downcast_ref::<ApiError>() {
            return match api_error {
                ApiError::Unauthorized => NormalizedError::Unauthorized,
                ApiError::Server { message, .. } => NormalizedError::Server(
                    message.clone().unwrap_or_else(|| GENERIC_SERVER_MESSAGE.to_string()),
                ),
                ApiError::NetworkError(e) => classify_reqwest(e),
                ApiError::InvalidResponse(_) => NormalizedError::Unexpected,
            };
        }
        if let Some(e) = cause.downcast_ref::<reqwest::Error>() {
            return classify_reqwest(e);
        }
    }
    NormalizedError::Unexpected
}

fn classify_reqwest(error: &reqwest::Error) -> NormalizedError {
    if error.is_builder() || error.is_decode() {
        NormalizedError::Unexpected
    } else if error.is_timeout() || error.is_connect() || error.is_request() {
        NormalizedError::Network
    } else {
        NormalizedError::Unexpected
    }
}
