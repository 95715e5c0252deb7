// src/error.rs

use std::{fmt, str::FromStr};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Machine-readable error codes sent as `error_code` in every error body.
///
/// The prefix names the family: `AUTH_*` session and credentials, `VAL_*`
/// malformed input, `RES_*` missing or duplicate resources, `DB_*` storage,
/// `SRV_*` everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "AUTH_001")]
    MissingToken,
    #[serde(rename = "AUTH_002")]
    InvalidToken,
    #[serde(rename = "AUTH_003")]
    ExpiredToken,
    #[serde(rename = "AUTH_004")]
    InvalidCredentials,
    #[serde(rename = "AUTH_005")]
    DuplicateAccount,
    #[serde(rename = "AUTH_006")]
    Forbidden,
    #[serde(rename = "VAL_001")]
    ValidationFailed,
    #[serde(rename = "VAL_002")]
    InvalidFormat,
    #[serde(rename = "VAL_003")]
    InvalidValue,
    #[serde(rename = "RES_001")]
    NotFound,
    #[serde(rename = "RES_002")]
    AlreadyExists,
    #[serde(rename = "DB_001")]
    DbUnavailable,
    #[serde(rename = "DB_002")]
    DbError,
    #[serde(rename = "DB_003")]
    DbInitializing,
    #[serde(rename = "SRV_001")]
    Internal,
    #[serde(rename = "SRV_002")]
    Timeout,
    #[serde(rename = "SRV_003")]
    Unavailable,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 17] = [
        ErrorCode::MissingToken,
        ErrorCode::InvalidToken,
        ErrorCode::ExpiredToken,
        ErrorCode::InvalidCredentials,
        ErrorCode::DuplicateAccount,
        ErrorCode::Forbidden,
        ErrorCode::ValidationFailed,
        ErrorCode::InvalidFormat,
        ErrorCode::InvalidValue,
        ErrorCode::NotFound,
        ErrorCode::AlreadyExists,
        ErrorCode::DbUnavailable,
        ErrorCode::DbError,
        ErrorCode::DbInitializing,
        ErrorCode::Internal,
        ErrorCode::Timeout,
        ErrorCode::Unavailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingToken => "AUTH_001",
            ErrorCode::InvalidToken => "AUTH_002",
            ErrorCode::ExpiredToken => "AUTH_003",
            ErrorCode::InvalidCredentials => "AUTH_004",
            ErrorCode::DuplicateAccount => "AUTH_005",
            ErrorCode::Forbidden => "AUTH_006",
            ErrorCode::ValidationFailed => "VAL_001",
            ErrorCode::InvalidFormat => "VAL_002",
            ErrorCode::InvalidValue => "VAL_003",
            ErrorCode::NotFound => "RES_001",
            ErrorCode::AlreadyExists => "RES_002",
            ErrorCode::DbUnavailable => "DB_001",
            ErrorCode::DbError => "DB_002",
            ErrorCode::DbInitializing => "DB_003",
            ErrorCode::Internal => "SRV_001",
            ErrorCode::Timeout => "SRV_002",
            ErrorCode::Unavailable => "SRV_003",
        }
    }

    /// Whether the code means the caller's session is unusable.
    /// `AUTH_005` and `AUTH_006` are not session failures.
    pub fn is_session_failure(&self) -> bool {
        matches!(
            self,
            ErrorCode::MissingToken
                | ErrorCode::InvalidToken
                | ErrorCode::ExpiredToken
                | ErrorCode::InvalidCredentials
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or(())
    }
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request, VAL_001
    BadRequest(String),

    // 400 Bad Request, VAL_002 (body could not be parsed)
    InvalidFormat(String),

    // 400 Bad Request, VAL_003 (well-formed but a field has an unusable value)
    InvalidValue(String),

    // 401 Unauthorized (400 for AUTH_005)
    AuthError(ErrorCode, String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., duplicate exam name)
    Conflict(String),

    // 500/503, one of the DB_* codes
    DatabaseError(ErrorCode, String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InternalServerError(_) => ErrorCode::Internal,
            AppError::BadRequest(_) => ErrorCode::ValidationFailed,
            AppError::InvalidFormat(_) => ErrorCode::InvalidFormat,
            AppError::InvalidValue(_) => ErrorCode::InvalidValue,
            AppError::AuthError(code, _) => *code,
            AppError::Forbidden(_) => ErrorCode::Forbidden,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Conflict(_) => ErrorCode::AlreadyExists,
            AppError::DatabaseError(code, _) => *code,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) | AppError::InvalidFormat(_) | AppError::InvalidValue(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::AuthError(ErrorCode::DuplicateAccount, _) => StatusCode::BAD_REQUEST,
            AppError::AuthError(..) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(ErrorCode::DbError, _) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::DatabaseError(..) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON body `{error, error_code}` with the matching status.
/// Storage and internal details are logged, never sent to the client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let error_message = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                "Internal Server Error".to_string()
            }
            AppError::DatabaseError(code, msg) => {
                tracing::error!("Database error ({}): {}", code, msg);
                match code {
                    ErrorCode::DbUnavailable => "Database unavailable".to_string(),
                    ErrorCode::DbInitializing => "Database is initializing".to_string(),
                    _ => "Database error".to_string(),
                }
            }
            AppError::BadRequest(msg)
            | AppError::InvalidFormat(msg)
            | AppError::InvalidValue(msg)
            | AppError::AuthError(_, msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg,
        };
        let body = Json(json!({
            "error": error_message,
            "error_code": code,
        }));

        (status, body).into_response()
    }
}

/// Classifies `sqlx::Error` into the `DB_*` / `RES_*` families.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::DatabaseError(ErrorCode::DbUnavailable, err.to_string())
            }
            sqlx::Error::Database(ref db_err) => {
                if db_err.is_unique_violation() {
                    AppError::Conflict("Resource already exists".to_string())
                } else if db_err.is_foreign_key_violation() {
                    AppError::NotFound("Referenced resource not found".to_string())
                } else if db_err.message().contains("no such table") {
                    AppError::DatabaseError(ErrorCode::DbInitializing, err.to_string())
                } else {
                    AppError::DatabaseError(ErrorCode::DbError, err.to_string())
                }
            }
            other => AppError::DatabaseError(ErrorCode::DbError, other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}
