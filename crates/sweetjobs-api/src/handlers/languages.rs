//! Seeded language list.

use axum::extract::State;
use axum::Json;

use sweetjobs_models::Language;
use sweetjobs_store::{LanguageStore, Store};

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::state::AppState;

async fn all_languages<S: Store>(state: &AppState<S>) -> ApiResult<Vec<Language>> {
    let mut tx = state.store.begin().await?;
    Ok(tx.list_languages().await?)
}

pub async fn list_languages_public<S: Store>(
    State(state): State<AppState<S>>,
) -> ApiResult<Json<Vec<Language>>> {
    Ok(Json(all_languages(&state).await?))
}

pub async fn list_languages<S: Store>(
    State(state): State<AppState<S>>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<Language>>> {
    Ok(Json(all_languages(&state).await?))
}
