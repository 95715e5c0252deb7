// src/client/error.rs

use reqwest::StatusCode;
use thiserror::Error;

use crate::error::ErrorCode;

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("{message} ({status})")]
    Api {
        status: u16,
        code: Option<ErrorCode>,
        message: String,
    },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("session expired")]
    SessionExpired,

    #[error("not signed in")]
    NotSignedIn,
}

impl ClientError {
    /// Transient failures worth another attempt: connection problems,
    /// timeouts, 5xx and 429.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(_) | ClientError::Timeout => true,
            ClientError::Api { status, .. } => {
                *status >= 500 || *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
            }
            _ => false,
        }
    }

    /// Failures that invalidate the local session.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            ClientError::SessionExpired | ClientError::NotSignedIn => true,
            ClientError::Api { code: Some(code), .. } => code.is_session_failure(),
            ClientError::Api { status, code: None, .. } => {
                *status == StatusCode::UNAUTHORIZED.as_u16()
            }
            _ => false,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Api { code, .. } => *code,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}
