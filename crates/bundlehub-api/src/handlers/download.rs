//! Download job handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use bundlehub_core::error::AppError;
use bundlehub_core::result::AppResult;
use bundlehub_core::types::id::JobId;
use bundlehub_entity::job::JobStatus;
use bundlehub_service::Resolution;

use crate::dto::request::{InitiateDownloadRequest, ResolveQuery};
use crate::dto::response::{InitiateDownloadResponse, JobSnapshotResponse};
use crate::state::AppState;

/// POST /v1/download/initiate
pub async fn initiate(
    State(state): State<AppState>,
    Json(body): Json<InitiateDownloadRequest>,
) -> AppResult<(StatusCode, Json<InitiateDownloadResponse>)> {
    let request = body.into_download_request()?;
    let receipt = state.download_service.initiate(request).await?;
    Ok((StatusCode::ACCEPTED, Json(receipt.into())))
}

/// GET /v1/download/status/:job_id
pub async fn status(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<JobSnapshotResponse>> {
    let job_id = parse_job_id(&raw_id)?;
    let job = state
        .download_service
        .status(&job_id)
        .ok_or_else(|| AppError::not_found(format!("Unknown job {raw_id}")))?;
    // An expired-but-not-yet-swept record is indistinguishable from a
    // swept one as far as clients are concerned.
    if job.status == JobStatus::Expired {
        return Err(AppError::not_found(format!("Job {raw_id} has expired")));
    }
    Ok(Json(job.into()))
}

/// GET /v1/download/:job_id
///
/// 302 to the presigned URL on completion; `?format=json` returns the
/// snapshot instead of redirecting.
pub async fn resolve(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<ResolveQuery>,
) -> Response {
    let job_id = match parse_job_id(&raw_id) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match state.download_service.resolve(&job_id) {
        Resolution::Redirect(url) => {
            if query.format.as_deref() == Some("json") {
                match state.download_service.status(&job_id) {
                    Some(job) => {
                        (StatusCode::OK, Json(JobSnapshotResponse::from(job))).into_response()
                    }
                    None => AppError::not_found(format!("Unknown job {raw_id}")).into_response(),
                }
            } else {
                (StatusCode::FOUND, [(header::LOCATION, url)]).into_response()
            }
        }
        Resolution::NotReady(job) => {
            (StatusCode::CONFLICT, Json(JobSnapshotResponse::from(job))).into_response()
        }
        Resolution::Gone(job) => {
            (StatusCode::GONE, Json(JobSnapshotResponse::from(job))).into_response()
        }
        Resolution::NotFound => {
            AppError::not_found(format!("Unknown job {raw_id}")).into_response()
        }
    }
}

/// POST /v1/download/:job_id/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<JobSnapshotResponse>> {
    let job_id = parse_job_id(&raw_id)?;
    let job = state
        .download_service
        .cancel(&job_id)
        .ok_or_else(|| AppError::not_found(format!("Unknown job {raw_id}")))?;
    Ok(Json(job.into()))
}

fn parse_job_id(raw: &str) -> AppResult<JobId> {
    raw.parse()
        .map_err(|_| AppError::not_found(format!("Unknown job {raw}")))
}
