use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type AppResult<T> = Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    // Provisioning / configuration errors. Fatal at startup: a misconfigured
    // role table is a deployment defect, not a runtime condition.
    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),
    #[error("unknown capability: {0}")]
    UnknownCapability(String),
    #[error("unknown role: {0}")]
    UnknownRole(String),

    // Request-level CSRF failures. Recoverable: the request is rejected,
    // the service keeps running.
    #[error("csrf token missing")]
    CsrfMissing,
    #[error("csrf session expired")]
    CsrfSessionExpired,
    #[error("csrf token mismatch")]
    CsrfMismatch,

    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("token error: {0}")]
    Token(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unknown_resource_type(name: impl Into<String>) -> Self {
        Self::UnknownResourceType(name.into())
    }

    pub fn unknown_capability(name: impl Into<String>) -> Self {
        Self::UnknownCapability(name.into())
    }

    pub fn unknown_role(name: impl Into<String>) -> Self {
        Self::UnknownRole(name.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn token(err: impl Into<String>) -> Self {
        Self::Token(err.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable machine-readable kind used in the JSON error body.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::UnknownResourceType(_) => "unknown_resource_type",
            AppError::UnknownCapability(_) => "unknown_capability",
            AppError::UnknownRole(_) => "unknown_role",
            AppError::CsrfMissing => "csrf_missing",
            AppError::CsrfSessionExpired => "csrf_session_expired",
            AppError::CsrfMismatch => "csrf_mismatch",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Configuration(_) => "configuration",
            AppError::Token(_) => "token",
            AppError::Internal(_) => "internal",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            // Provisioning errors abort startup; if one ever surfaces on a
            // request path it is a server defect.
            AppError::UnknownResourceType(_)
            | AppError::UnknownCapability(_)
            | AppError::UnknownRole(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::CsrfMissing | AppError::CsrfSessionExpired | AppError::CsrfMismatch => {
                StatusCode::FORBIDDEN
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Token(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // The message is the display form of the variant: error kind plus the
        // offending name at most. Never stack traces, never secret material.
        let payload = ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
        };

        (status, Json(payload)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}
