//! API error types.
//!
//! Every error is answered with `{ "error": "<kind>", "detail": "..." }`.
//! The kind names are part of the wire contract and never change.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use sweetjobs_store::StoreError;

use crate::files::FileStoreError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Still referenced: {0}")]
    ReferentialIntegrity(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Marker left in the response extensions of every application error.
///
/// The legacy-status middleware uses it to tell error bodies apart from
/// other non-2xx responses.
#[derive(Debug, Clone, Copy)]
pub struct ErrorKind(pub &'static str);

impl ErrorKind {
    /// Server-side failures, whose detail stays out of production responses.
    pub fn is_internal(&self) -> bool {
        matches!(self.0, "DatabaseError" | "InternalError")
    }

    /// The error body without its detail.
    pub fn redacted(&self) -> Response {
        Json(ErrorResponse {
            error: self.0,
            detail: None,
        })
        .into_response()
    }
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Error kind name as sent to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NotFound",
            ApiError::Conflict(_) => "ConflictError",
            ApiError::ReferentialIntegrity(_) => "ReferentialIntegrityError",
            ApiError::Unauthorized(_) | ApiError::Forbidden(_) => "AuthRejected",
            ApiError::Validation(_) => "ValidationError",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::Database(_) => "DatabaseError",
            ApiError::Internal(_) => "InternalError",
        }
    }

    /// Authentication failures keep their status in every mode.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_) | ApiError::Forbidden(_))
    }

    fn is_internal(&self) -> bool {
        matches!(self, ApiError::Database(_) | ApiError::Internal(_))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::ReferentialIntegrity(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::ReferentialIntegrity(msg) => ApiError::ReferentialIntegrity(msg),
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl From<FileStoreError> for ApiError {
    fn from(err: FileStoreError) -> Self {
        match err {
            FileStoreError::InvalidPath(msg) => ApiError::BadRequest(msg),
            FileStoreError::Io(e) => ApiError::Internal(format!("file store: {}", e)),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();

        if self.is_internal() {
            error!(kind, error = %self, "Request failed");
        } else {
            warn!(kind, error = %self, "Request rejected");
        }

        let detail = Some(self.to_string());

        let mut response = (status, Json(ErrorResponse { error: kind, detail })).into_response();
        if !self.is_auth_rejection() {
            response.extensions_mut().insert(ErrorKind(kind));
        }
        response
    }
}
