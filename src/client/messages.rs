// src/client/messages.rs

use super::error::ClientError;
use crate::error::ErrorCode;

const TIMEOUT: &str = "Request timed out. Please check your internet connection and try again.";
const NETWORK_FAILED: &str =
    "Network request failed. Please check your internet connection and try again.";
const UNKNOWN: &str = "An unexpected error occurred. Please try again.";

/// User-facing copy for an error code.
pub fn message_for_code(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::MissingToken => "Please log in to continue.",
        ErrorCode::InvalidToken => "Your session is invalid. Please log in again.",
        ErrorCode::ExpiredToken => "Your session has expired. Please log in again.",
        ErrorCode::InvalidCredentials => "Invalid email or password. Please try again.",
        ErrorCode::DuplicateAccount => "An account with this email already exists.",
        ErrorCode::Forbidden => "You do not have permission to do that.",
        ErrorCode::ValidationFailed => "Please check your input and try again.",
        ErrorCode::InvalidFormat => "Invalid data format. Please check your input.",
        ErrorCode::InvalidValue => "Invalid value provided. Please check your input.",
        ErrorCode::NotFound => "The requested item was not found.",
        ErrorCode::AlreadyExists => "This item already exists.",
        ErrorCode::DbUnavailable => {
            "Connection error. Please check your internet connection and try again."
        }
        ErrorCode::DbError => "A database error occurred. Please try again later.",
        ErrorCode::DbInitializing => "The system is being set up. Please try again in a moment.",
        ErrorCode::Internal => "Something went wrong. Please try again later.",
        ErrorCode::Timeout => "Request timed out. Please try again.",
        ErrorCode::Unavailable => "Service is temporarily unavailable. Please try again later.",
    }
}

/// Text to show the user for a failed call.
///
/// Known codes use the table above; otherwise the server's own message is
/// shown, then a generic fallback.
pub fn friendly_message(err: &ClientError) -> String {
    match err {
        ClientError::Timeout => TIMEOUT.to_string(),
        ClientError::Network(_) => NETWORK_FAILED.to_string(),
        ClientError::SessionExpired => message_for_code(ErrorCode::ExpiredToken).to_string(),
        ClientError::NotSignedIn => message_for_code(ErrorCode::MissingToken).to_string(),
        ClientError::Api {
            code: Some(code), ..
        } => message_for_code(*code).to_string(),
        ClientError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
        ClientError::Api { .. } | ClientError::Decode(_) => UNKNOWN.to_string(),
    }
}
