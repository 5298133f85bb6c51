use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use jobs::JobStatus;
use types::ScheduleResult;

use crate::error::ApiError;
use crate::state::AppState;

fn not_found(id: &str) -> ApiError {
    ApiError(StatusCode::NOT_FOUND, format!("job {id} not found"))
}

#[utoipa::path(
        get,
        path = "/v1/jobs/{id}",
        params(("id" = String, Path, description = "Job ID")),
        responses(
            (status = 200, description = "Job status", body = JobStatus),
            (status = 404, description = "Unknown job")
        )
    )]
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobStatus>, ApiError> {
    state.jobs.get(&id).map(Json).ok_or_else(|| not_found(&id))
}

#[utoipa::path(
        get,
        path = "/v1/jobs/{id}/result",
        params(("id" = String, Path, description = "Job ID")),
        responses(
            (status = 200, description = "Schedule, once the job is solved", body = ScheduleResult),
            (status = 404, description = "Unknown job"),
            (status = 409, description = "Job still running"),
            (status = 422, description = "Job ended without a schedule")
        )
    )]
pub async fn result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ScheduleResult>, ApiError> {
    match state.jobs.get(&id) {
        None => Err(not_found(&id)),
        Some(JobStatus::Solved { result }) => Ok(Json(result)),
        Some(JobStatus::Queued | JobStatus::Running) => Err(ApiError(
            StatusCode::CONFLICT,
            format!("job {id} is not finished"),
        )),
        Some(JobStatus::Infeasible { message } | JobStatus::Failed { message }) => {
            Err(ApiError(StatusCode::UNPROCESSABLE_ENTITY, message))
        }
    }
}
