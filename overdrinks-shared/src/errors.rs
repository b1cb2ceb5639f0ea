use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::api::{ApiErrorResponse, FieldError};

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Profile errors
/// - E2xxx: Venue errors
/// - E3xxx: Check-in errors
/// - E4xxx: Match errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    BadRequest,

    // Profile (E1xxx)
    ProfileNotFound,
    ProfileAlreadyExists,
    UsernameTaken,
    InvalidUsername,
    UserNotFound,

    // Venue (E2xxx)
    VenueNotFound,

    // Check-in (E3xxx)
    CheckInNotFound,
    InvalidCheckInMode,

    // Match (E4xxx)
    MatchNotFound,
    DuplicateMatchRequest,
    CannotMatchSelf,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::BadRequest => "E0006",

            // Profile
            Self::ProfileNotFound => "E1001",
            Self::ProfileAlreadyExists => "E1002",
            Self::UsernameTaken => "E1003",
            Self::InvalidUsername => "E1004",
            Self::UserNotFound => "E1005",

            // Venue
            Self::VenueNotFound => "E2001",

            // Check-in
            Self::CheckInNotFound => "E3001",
            Self::InvalidCheckInMode => "E3002",

            // Match
            Self::MatchNotFound => "E4001",
            Self::DuplicateMatchRequest => "E4002",
            Self::CannotMatchSelf => "E4003",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError
            | Self::BadRequest
            | Self::InvalidUsername
            | Self::InvalidCheckInMode
            | Self::CannotMatchSelf => StatusCode::BAD_REQUEST,
            Self::NotFound
            | Self::ProfileNotFound
            | Self::UserNotFound
            | Self::VenueNotFound
            | Self::CheckInNotFound
            | Self::MatchNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::ProfileAlreadyExists | Self::UsernameTaken | Self::DuplicateMatchRequest => {
                StatusCode::CONFLICT
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        errors: Option<Vec<FieldError>>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            errors: None,
        }
    }

    pub fn validation_list(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self::Known {
            code: ErrorCode::ValidationError,
            message: message.into(),
            errors: Some(errors),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known {
                code,
                message,
                errors,
            } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(list) = errors {
                    resp = resp.with_errors(list.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_codes_map_to_404() {
        for code in [
            ErrorCode::NotFound,
            ErrorCode::ProfileNotFound,
            ErrorCode::UserNotFound,
            ErrorCode::VenueNotFound,
            ErrorCode::CheckInNotFound,
            ErrorCode::MatchNotFound,
        ] {
            assert_eq!(code.status_code(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn conflict_codes_map_to_409() {
        for code in [
            ErrorCode::DuplicateMatchRequest,
            ErrorCode::UsernameTaken,
            ErrorCode::ProfileAlreadyExists,
        ] {
            assert_eq!(code.status_code(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn validation_codes_map_to_400() {
        for code in [
            ErrorCode::ValidationError,
            ErrorCode::BadRequest,
            ErrorCode::InvalidUsername,
            ErrorCode::InvalidCheckInMode,
            // Self-requests are rejected as malformed input, not forbidden.
            ErrorCode::CannotMatchSelf,
        ] {
            assert_eq!(code.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn error_code_strings_are_unique() {
        let all = [
            ErrorCode::InternalError,
            ErrorCode::ValidationError,
            ErrorCode::NotFound,
            ErrorCode::Unauthorized,
            ErrorCode::Forbidden,
            ErrorCode::BadRequest,
            ErrorCode::ProfileNotFound,
            ErrorCode::ProfileAlreadyExists,
            ErrorCode::UsernameTaken,
            ErrorCode::InvalidUsername,
            ErrorCode::UserNotFound,
            ErrorCode::VenueNotFound,
            ErrorCode::CheckInNotFound,
            ErrorCode::InvalidCheckInMode,
            ErrorCode::MatchNotFound,
            ErrorCode::DuplicateMatchRequest,
            ErrorCode::CannotMatchSelf,
        ];
        let mut codes: Vec<&str> = all.iter().map(|c| c.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }
}
