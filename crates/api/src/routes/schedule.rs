use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;
use types::ScheduleEnvelope;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobCreated {
    pub job_id: String,
    pub status: String,
}

#[utoipa::path(
    post,
    path = "/v1/schedule",
    request_body = ScheduleEnvelope,
    responses(
        (status = 202, description = "Scheduling job accepted", body = JobCreated)
    )
)]
pub async fn schedule(
    State(state): State<AppState>,
    Json(env): Json<ScheduleEnvelope>,
) -> (StatusCode, Json<JobCreated>) {
    let id = state.jobs.enqueue(env);
    tracing::info!(job = %id.0, "schedule job queued");
    (
        StatusCode::ACCEPTED,
        Json(JobCreated {
            job_id: id.0,
            status: "queued".into(),
        }),
    )
}
