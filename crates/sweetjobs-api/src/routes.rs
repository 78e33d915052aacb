//! API routes.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;

use sweetjobs_models::{
    AppliedUserStatus, Category, ErrorMessage, GeneralMessage, Job, LocalizedEntity, PagePlace,
    PublicContent, Role,
};
use sweetjobs_store::Store;

use crate::handlers::{events, health, jobs, languages, localized, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, legacy_error_status, rate_limit_middleware, redact_internal_errors, request_id,
    request_logging, security_headers, RateLimiterCache,
};
use crate::state::AppState;

/// Public reads and admin CRUD of one localized resource.
fn localized_routes<E: LocalizedEntity, S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/public", get(localized::list_public::<E, S>))
        .merge(localized_item_routes::<E, S>())
}

/// Everything but the public list.
fn localized_item_routes<E: LocalizedEntity, S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/public/:id", get(localized::get_public::<E, S>))
        .route(
            "/",
            get(localized::list::<E, S>).post(localized::create::<E, S>),
        )
        .route(
            "/:id",
            get(localized::get::<E, S>)
                .put(localized::update::<E, S>)
                .delete(localized::delete::<E, S>),
        )
}

/// Job owner routes, next to the shared job routes.
fn job_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/public", get(jobs::list_public_jobs::<S>))
        .route("/public/getJobById/:id", get(jobs::get_job_by_id::<S>))
        .route("/public/getJobsByToken", get(jobs::jobs_by_token::<S>))
        .route(
            "/public/getJobByIdAndToken/:id",
            get(jobs::job_by_id_and_token::<S>),
        )
        .route(
            "/public/getJobDropdwonDataByToken",
            get(jobs::job_dropdown_by_token::<S>),
        )
        .route("/public/createJob", post(jobs::create_job::<S>))
        .route("/public/modifyJob/:id", put(jobs::modify_job::<S>))
        .merge(localized_item_routes::<Job, S>())
}

fn event_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/",
            get(events::list_events::<S>).post(events::create_event::<S>),
        )
        .route(
            "/:id",
            get(events::get_event::<S>)
                .put(events::update_event::<S>)
                .delete(events::delete_event::<S>),
        )
        .route("/public/getEventsByToken", get(events::events_by_token::<S>))
        .route("/public/getUserIdByToken", get(events::user_id_by_token::<S>))
        .route(
            "/public/getEventByToken/:link",
            get(events::event_by_link::<S>),
        )
        .route("/public/createEvent", post(events::create_owned_event::<S>))
        .route(
            "/public/sendLinkToUsers",
            post(events::send_link_to_users::<S>),
        )
        .route(
            "/public/delete/:id",
            delete(events::delete_owned_event::<S>),
        )
}

fn language_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(languages::list_languages::<S>))
        .route("/public", get(languages::list_languages_public::<S>))
}

/// Create the API router.
pub fn create_router<S: Store>(
    state: AppState<S>,
    metrics_handle: Option<PrometheusHandle>,
) -> Router {
    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .nest(&format!("/{}", Job::RESOURCE), job_routes::<S>())
        .nest(
            &format!("/{}", Category::RESOURCE),
            localized_routes::<Category, S>(),
        )
        .nest(&format!("/{}", Role::RESOURCE), localized_routes::<Role, S>())
        .nest(
            &format!("/{}", AppliedUserStatus::RESOURCE),
            localized_routes::<AppliedUserStatus, S>(),
        )
        .nest(
            &format!("/{}", ErrorMessage::RESOURCE),
            localized_routes::<ErrorMessage, S>(),
        )
        .nest(
            &format!("/{}", GeneralMessage::RESOURCE),
            localized_routes::<GeneralMessage, S>(),
        )
        .nest(
            &format!("/{}", PagePlace::RESOURCE),
            localized_routes::<PagePlace, S>(),
        )
        .nest(
            &format!("/{}", PublicContent::RESOURCE),
            localized_routes::<PublicContent, S>(),
        )
        .nest("/events", event_routes::<S>())
        .nest("/languages", language_routes::<S>())
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready::<S>));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Uploaded files, under the URLs the file store hands out.
    let uploads = ServeDir::new(state.config.upload_root.join("users"));

    Router::new()
        .nest("/api", api_routes)
        .nest_service("/users", uploads)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(middleware::from_fn_with_state(
            state.config.legacy_error_status,
            legacy_error_status,
        ))
        .layer(middleware::from_fn_with_state(
            state.config.is_production(),
            redact_internal_errors,
        ))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.request_timeout,
        ))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
