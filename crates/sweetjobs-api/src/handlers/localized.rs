//! Handlers shared by every localized resource.
//!
//! Each handler is generic over the resource; the router instantiates
//! them once per resource under `/api/<resource>`.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use sweetjobs_models::{LocalizedEntity, LocalizedOf, PayloadOf};
use sweetjobs_store::Store;

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::handlers::{success, AppJson, AppPath, AppQuery, OkResponse};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LanguageQuery {
    /// Language key; only that translation is returned.
    pub lang: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub cascade: bool,
}

/// Anonymous joined list.
pub async fn list_public<E: LocalizedEntity, S: Store>(
    State(state): State<AppState<S>>,
) -> ApiResult<Json<Vec<LocalizedOf<E>>>> {
    Ok(Json(state.localized.list::<E>().await?))
}

/// Anonymous joined read, optionally in one language.
pub async fn get_public<E: LocalizedEntity, S: Store>(
    State(state): State<AppState<S>>,
    AppPath(id): AppPath<i32>,
    AppQuery(query): AppQuery<LanguageQuery>,
) -> ApiResult<Json<LocalizedOf<E>>> {
    let localized = match query.lang.as_deref() {
        Some(key) => state.localized.get_in_language::<E>(id, key).await?,
        None => state.localized.get::<E>(id).await?,
    };
    Ok(Json(localized))
}

pub async fn list<E: LocalizedEntity, S: Store>(
    State(state): State<AppState<S>>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<LocalizedOf<E>>>> {
    Ok(Json(state.localized.list::<E>().await?))
}

pub async fn get<E: LocalizedEntity, S: Store>(
    State(state): State<AppState<S>>,
    _admin: AdminUser,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Json<LocalizedOf<E>>> {
    Ok(Json(state.localized.get::<E>(id).await?))
}

pub async fn create<E: LocalizedEntity, S: Store>(
    State(state): State<AppState<S>>,
    admin: AdminUser,
    AppJson(payload): AppJson<PayloadOf<E>>,
) -> ApiResult<Json<OkResponse>> {
    payload.validate()?;
    let created = state.localized.create::<E>(payload).await?;
    debug!(entity = E::NAME, id = created.id(), admin = %admin.email, "Admin create");
    Ok(success())
}

pub async fn update<E: LocalizedEntity, S: Store>(
    State(state): State<AppState<S>>,
    admin: AdminUser,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<PayloadOf<E>>,
) -> ApiResult<Json<OkResponse>> {
    payload.validate()?;
    state.localized.update::<E>(id, payload).await?;
    debug!(entity = E::NAME, id, admin = %admin.email, "Admin update");
    Ok(success())
}

/// Restricted unless `?cascade=true`.
pub async fn delete<E: LocalizedEntity, S: Store>(
    State(state): State<AppState<S>>,
    admin: AdminUser,
    AppPath(id): AppPath<i32>,
    AppQuery(query): AppQuery<DeleteQuery>,
) -> ApiResult<Json<OkResponse>> {
    state.localized.delete::<E>(id, query.cascade).await?;
    debug!(entity = E::NAME, id, admin = %admin.email, "Admin delete");
    Ok(success())
}
