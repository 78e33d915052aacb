//! Job routes beyond the shared localized ones: the public job page and the
//! routes a job owner uses with their own token.

use std::collections::HashMap;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use sweetjobs_models::{
    Category, Job, JobAttributes, LocalizedOf, PayloadOf, PublicProfile, User,
};
use sweetjobs_store::Store;

use crate::auth::Identity;
use crate::error::{ApiError, ApiResult};
use crate::files::Upload;
use crate::handlers::{optional, success, AppPath, OkResponse};
use crate::state::AppState;

/// Multipart part holding the JSON payload.
const PAYLOAD_PART: &str = "payload";

/// Multipart part holding the logo file.
const LOGO_PART: &str = "logoUrl";

/// A job as shown on its public page.
#[derive(Debug, Serialize)]
pub struct PublicJob {
    #[serde(flatten)]
    pub job: LocalizedOf<Job>,
    pub owner: Option<PublicProfile>,
    pub category: Option<LocalizedOf<Category>>,
}

/// A job in a list, with its localized category.
#[derive(Debug, Serialize)]
pub struct CategorizedJob {
    #[serde(flatten)]
    pub job: LocalizedOf<Job>,
    pub category: Option<LocalizedOf<Category>>,
}

/// Entry of the owner's job dropdown.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOption {
    pub id: i32,
    pub company_name: Option<String>,
}

fn upload_directory(owner: &User, job_id: i32) -> String {
    format!("users/{}/jobs/{}", owner.id, job_id)
}

/// Read the payload part and the optional logo part.
async fn read_job_form(mut multipart: Multipart) -> ApiResult<(PayloadOf<Job>, Option<Upload>)> {
    let mut payload = None;
    let mut logo = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            PAYLOAD_PART => {
                let text = field.text().await?;
                let parsed: PayloadOf<Job> = serde_json::from_str(&text)
                    .map_err(|e| ApiError::bad_request(format!("Invalid payload: {}", e)))?;
                payload = Some(parsed);
            }
            LOGO_PART => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                if let Some(file_name) = file_name.filter(|_| !bytes.is_empty()) {
                    logo = Some(Upload { file_name, bytes });
                }
            }
            _ => {
                field.bytes().await?;
            }
        }
    }

    let payload =
        payload.ok_or_else(|| ApiError::bad_request(format!("Missing '{}' part", PAYLOAD_PART)))?;
    payload.validate()?;
    Ok((payload, logo))
}

/// Owners can set neither the owner nor the stored logo URL directly.
///
/// `user_id` of `None` leaves the current owner in place on update.
fn owner_attributes(mut payload: PayloadOf<Job>, user_id: Option<i32>) -> PayloadOf<Job> {
    payload.attributes.user_id = user_id;
    payload.attributes.logo_url = None;
    payload
}

/// Public job page: the job with its owner's public profile and category.
pub async fn get_job_by_id<S: Store>(
    State(state): State<AppState<S>>,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Json<PublicJob>> {
    let job = state.localized.get::<Job>(id).await?;

    let owner = match job.record.attributes.user_id {
        Some(user_id) => optional(state.users.by_id(user_id).await)?.map(|u| u.public_profile()),
        None => None,
    };
    let category = match job.record.attributes.category_id {
        Some(category_id) => optional(state.localized.get::<Category>(category_id).await)?,
        None => None,
    };

    Ok(Json(PublicJob {
        job,
        owner,
        category,
    }))
}

/// Attach each job's category, loading the categories once.
async fn with_categories<S: Store>(
    state: &AppState<S>,
    jobs: Vec<LocalizedOf<Job>>,
) -> ApiResult<Vec<CategorizedJob>> {
    if jobs.is_empty() {
        return Ok(Vec::new());
    }
    let categories: HashMap<i32, LocalizedOf<Category>> = state
        .localized
        .list::<Category>()
        .await?
        .into_iter()
        .map(|category| (category.id(), category))
        .collect();

    Ok(jobs
        .into_iter()
        .map(|job| {
            let category = job
                .record
                .attributes
                .category_id
                .and_then(|id| categories.get(&id).cloned());
            CategorizedJob { job, category }
        })
        .collect())
}

/// Anonymous job list with categories.
pub async fn list_public_jobs<S: Store>(
    State(state): State<AppState<S>>,
) -> ApiResult<Json<Vec<CategorizedJob>>> {
    let jobs = state.localized.list::<Job>().await?;
    Ok(Json(with_categories(&state, jobs).await?))
}

/// The caller's own jobs, with categories.
pub async fn jobs_by_token<S: Store>(
    State(state): State<AppState<S>>,
    identity: Identity,
) -> ApiResult<Json<Vec<CategorizedJob>>> {
    let owner = state.users.by_email(&identity.email).await?;
    let jobs = state.localized.list_owned::<Job>(owner.id).await?;
    Ok(Json(with_categories(&state, jobs).await?))
}

/// One of the caller's own jobs.
pub async fn job_by_id_and_token<S: Store>(
    State(state): State<AppState<S>>,
    identity: Identity,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Json<LocalizedOf<Job>>> {
    let owner = state.users.by_email(&identity.email).await?;
    Ok(Json(state.localized.get_owned::<Job>(id, owner.id).await?))
}

/// Id and company name of the caller's jobs.
pub async fn job_dropdown_by_token<S: Store>(
    State(state): State<AppState<S>>,
    identity: Identity,
) -> ApiResult<Json<Vec<JobOption>>> {
    let owner = state.users.by_email(&identity.email).await?;
    let jobs = state.localized.list_owned::<Job>(owner.id).await?;
    let options = jobs
        .into_iter()
        .map(|job| JobOption {
            id: job.record.id,
            company_name: job.record.attributes.company_name,
        })
        .collect();
    Ok(Json(options))
}

/// Create a job owned by the caller, then store its logo.
///
/// The logo is stored after the job commits, since its directory contains
/// the job id. A failed upload leaves the job without a logo.
pub async fn create_job<S: Store>(
    State(state): State<AppState<S>>,
    identity: Identity,
    multipart: Multipart,
) -> ApiResult<Json<OkResponse>> {
    let owner = state.users.by_email(&identity.email).await?;
    let (payload, logo) = read_job_form(multipart).await?;

    let job = state
        .localized
        .create::<Job>(owner_attributes(payload, Some(owner.id)))
        .await?;

    if let Some(upload) = logo {
        match state.files.store(&upload_directory(&owner, job.id()), upload).await {
            Ok(url) => {
                let attributes = JobAttributes {
                    logo_url: Some(url),
                    ..Default::default()
                };
                state
                    .localized
                    .update_attributes::<Job>(job.id(), &attributes)
                    .await?;
            }
            Err(e) => warn!(job_id = job.id(), error = %e, "Failed to store job logo"),
        }
    }

    info!(job_id = job.id(), owner_id = owner.id, "Owner created job");
    Ok(success())
}

/// Update one of the caller's jobs, replacing the logo if one is sent.
///
/// The logo is written only once the update has committed, so a rejected
/// update leaves no file behind.
pub async fn modify_job<S: Store>(
    State(state): State<AppState<S>>,
    identity: Identity,
    AppPath(id): AppPath<i32>,
    multipart: Multipart,
) -> ApiResult<Json<OkResponse>> {
    let owner = state.users.by_email(&identity.email).await?;
    let (payload, logo) = read_job_form(multipart).await?;

    state
        .localized
        .update_owned::<Job>(id, owner.id, owner_attributes(payload, None))
        .await?;

    if let Some(upload) = logo {
        let url = state.files.store(&upload_directory(&owner, id), upload).await?;
        let attributes = JobAttributes {
            logo_url: Some(url),
            ..Default::default()
        };
        state
            .localized
            .update_attributes::<Job>(id, &attributes)
            .await?;
    }
    Ok(success())
}
