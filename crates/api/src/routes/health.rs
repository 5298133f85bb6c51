use axum::Json;

#[utoipa::path(
         get,
         path = "/v1/health",
         responses((status = 200, description = "Service is up"))
     )]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "timetable" }))
}
