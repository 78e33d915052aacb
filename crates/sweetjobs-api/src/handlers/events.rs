//! Event handlers: admin management and the owner's token routes.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use validator::Validate;

use sweetjobs_models::{AdminEventRequest, CreateEventRequest, EventDetails, SendLinkRequest};
use sweetjobs_store::Store;

use crate::auth::{AdminUser, Identity};
use crate::error::ApiResult;
use crate::handlers::{success, AppJson, AppPath, OkResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdResponse {
    pub user_id: i32,
}

pub async fn list_events<S: Store>(
    State(state): State<AppState<S>>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<EventDetails>>> {
    Ok(Json(state.events.list().await?))
}

pub async fn get_event<S: Store>(
    State(state): State<AppState<S>>,
    _admin: AdminUser,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Json<EventDetails>> {
    Ok(Json(state.events.get(id).await?))
}

pub async fn create_event<S: Store>(
    State(state): State<AppState<S>>,
    _admin: AdminUser,
    AppJson(request): AppJson<AdminEventRequest>,
) -> ApiResult<Json<OkResponse>> {
    request.validate()?;
    state.events.create(&request).await?;
    Ok(success())
}

pub async fn update_event<S: Store>(
    State(state): State<AppState<S>>,
    _admin: AdminUser,
    AppPath(id): AppPath<i32>,
    AppJson(request): AppJson<AdminEventRequest>,
) -> ApiResult<Json<OkResponse>> {
    request.validate()?;
    state.events.update(id, &request).await?;
    Ok(success())
}

pub async fn delete_event<S: Store>(
    State(state): State<AppState<S>>,
    _admin: AdminUser,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Json<OkResponse>> {
    state.events.delete(id).await?;
    Ok(success())
}

/// Events the caller created.
pub async fn events_by_token<S: Store>(
    State(state): State<AppState<S>>,
    identity: Identity,
) -> ApiResult<Json<Vec<EventDetails>>> {
    let owner = state.users.by_email(&identity.email).await?;
    Ok(Json(state.events.list_owned(&owner).await?))
}

pub async fn user_id_by_token<S: Store>(
    State(state): State<AppState<S>>,
    identity: Identity,
) -> ApiResult<Json<UserIdResponse>> {
    let user = state.users.by_email(&identity.email).await?;
    Ok(Json(UserIdResponse { user_id: user.id }))
}

/// Event page lookup by link, for any signed-in user.
pub async fn event_by_link<S: Store>(
    State(state): State<AppState<S>>,
    _identity: Identity,
    AppPath(link): AppPath<String>,
) -> ApiResult<Json<EventDetails>> {
    Ok(Json(state.events.get_by_link(&link).await?))
}

pub async fn create_owned_event<S: Store>(
    State(state): State<AppState<S>>,
    identity: Identity,
    AppJson(request): AppJson<CreateEventRequest>,
) -> ApiResult<Json<OkResponse>> {
    request.validate()?;
    let owner = state.users.by_email(&identity.email).await?;
    state.events.create_owned(&owner, &request).await?;
    Ok(success())
}

pub async fn send_link_to_users<S: Store>(
    State(state): State<AppState<S>>,
    identity: Identity,
    AppJson(request): AppJson<SendLinkRequest>,
) -> ApiResult<Json<OkResponse>> {
    request.validate()?;
    let owner = state.users.by_email(&identity.email).await?;
    state.events.send_link(&owner, &request).await?;
    Ok(success())
}

pub async fn delete_owned_event<S: Store>(
    State(state): State<AppState<S>>,
    identity: Identity,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Json<OkResponse>> {
    let owner = state.users.by_email(&identity.email).await?;
    state.events.delete_owned(&owner, id).await?;
    Ok(success())
}
