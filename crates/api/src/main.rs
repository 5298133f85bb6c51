mod error;
mod state;
mod telemetry;
pub mod routes {
    pub mod explain;
    pub mod health;
    pub mod jobs;
    pub mod schedule;
    pub mod validate;
}

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
        paths(
            routes::health::health,
            routes::schedule::schedule,
            routes::jobs::status,
            routes::jobs::result,
            routes::validate::validate_handler,
            routes::explain::explain,
        ),
        components(schemas(
            types::Instance, types::Lecturer, types::Course, types::Room, types::TimeSlot,
            types::Archetype, types::RoomKind, types::DayOfWeek,
            types::ScheduleParams, types::ScheduleEnvelope, types::ScheduleResult,
            types::ScheduleSummary, types::StageTimings, types::AssignmentStatus,
            types::Assignment, types::DeclaredPreference, types::Origin, types::Violation,
            types::TimeslotId, types::LecturerId, types::RoomId, types::CourseId,
            jobs::JobId, jobs::JobStatus,
            routes::validate::ValidationReport,
            routes::schedule::JobCreated,
            routes::explain::ExplainIn,
            routes::explain::ExplainOut
        )),
        tags(
            (name = "timetable", description = "Preference-driven course timetabling API")
        )
    )]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let app_state = state::AppState::new_default();

    let app = Router::new()
        .route("/v1/health", get(routes::health::health))
        .route("/v1/schedule", post(routes::schedule::schedule))
        .route("/v1/validate", post(routes::validate::validate_handler))
        .route("/v1/explain", post(routes::explain::explain))
        .route("/v1/jobs/:id", get(routes::jobs::status))
        .route("/v1/jobs/:id/result", get(routes::jobs::result))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(telemetry::stack(BODY_LIMIT))
        .with_state(app_state);

    let port = std::env::var("TIMETABLE__SERVER__PORT").unwrap_or_else(|_| "8080".into());
    let addr: std::net::SocketAddr = format!("0.0.0.0:{port}")
        .parse()
        .with_context(|| format!("invalid listen port {port:?}"))?;
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
