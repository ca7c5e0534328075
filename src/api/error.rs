use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AuthError, UserError};

#[derive(Debug)]
pub enum ApiError {
    NotFound {
        code: &'static str,
        message: String,
    },

    BadRequest {
        code: &'static str,
        message: String,
        errors: Vec<String>,
    },

    Unauthorized {
        code: &'static str,
        message: String,
    },

    Forbidden {
        code: &'static str,
        message: String,
    },

    Conflict {
        code: &'static str,
        message: String,
    },

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound { message, .. } => write!(f, "Not found: {}", message),
            ApiError::BadRequest { message, .. } => write!(f, "Bad request: {}", message),
            ApiError::Unauthorized { message, .. } => write!(f, "Unauthorized: {}", message),
            ApiError::Forbidden { message, .. } => write!(f, "Forbidden: {}", message),
            ApiError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, errors) = match self {
            ApiError::NotFound { code, message } => {
                (StatusCode::NOT_FOUND, code, message, Vec::new())
            }
            ApiError::BadRequest {
                code,
                message,
                errors,
            } => (StatusCode::BAD_REQUEST, code, message, errors),
            ApiError::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, code, message, Vec::new())
            }
            ApiError::Forbidden { code, message } => {
                (StatusCode::FORBIDDEN, code, message, Vec::new())
            }
            ApiError::Conflict { code, message } => {
                (StatusCode::CONFLICT, code, message, Vec::new())
            }
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    Vec::new(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "An internal error occurred".to_string(),
                    Vec::new(),
                )
            }
        };

        let body = ApiResponse::<()>::failure(message, code, errors);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        let code = err.code();
        let message = err.to_string();

        match err {
            UserError::UserNotFound(_) => ApiError::NotFound { code, message },
            UserError::Conflict => ApiError::Conflict { code, message },
            UserError::InvalidRole
            | UserError::CreationFailed
            | UserError::IncorrectCurrentPassword
            | UserError::PasswordSameAsOld
            | UserError::WeakPassword
            | UserError::PasswordRecentlyUsed
            | UserError::TokenInvalidOrExpired
            | UserError::SessionCreationFailed => ApiError::BadRequest {
                code,
                message,
                errors: vec![code.to_string()],
            },
            UserError::Database(msg) => ApiError::DatabaseError(msg),
            UserError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let code = err.code();
        let message = err.to_string();

        match err {
            AuthError::InvalidCredentials | AuthError::UserNotActive => {
                ApiError::Unauthorized { code, message }
            }
            AuthError::SessionCreationFailed => ApiError::BadRequest {
                code,
                message,
                errors: vec![code.to_string()],
            },
            AuthError::User(inner) => ApiError::from(inner),
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Token(msg) | AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn validation(errors: Vec<String>) -> Self {
        ApiError::BadRequest {
            code: "VALIDATION_ERROR",
            message: "Validation failed".to_string(),
            errors,
        }
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        let message = message.into();
        ApiError::BadRequest {
            code,
            message,
            errors: vec![code.to_string()],
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}
