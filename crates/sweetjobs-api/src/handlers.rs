//! Request handlers.

pub mod events;
pub mod health;
pub mod jobs;
pub mod languages;
pub mod localized;

pub use health::*;

use axum::extract::{FromRequest, FromRequestParts};
use axum::Json;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};

/// JSON body whose rejection is answered with the API error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Path parameters whose rejection is answered with the API error body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

/// Query string whose rejection is answered with the API error body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

/// Body of every successful write.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: &'static str,
}

pub fn success() -> Json<OkResponse> {
    Json(OkResponse { ok: "siker" })
}

/// Turn a NotFound into `None`.
pub(crate) fn optional<T>(result: ApiResult<T>) -> ApiResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ApiError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
