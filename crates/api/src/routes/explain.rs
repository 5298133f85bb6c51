use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use sched_core::scoring::audit;
use types::{Assignment, DeclaredPreference, Instance, Violation};

#[derive(Deserialize, ToSchema)]
pub struct ExplainIn {
    pub instance: Instance,
    #[serde(default)]
    pub declared: Vec<DeclaredPreference>,
    pub assignments: Vec<Assignment>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExplainOut {
    pub ok: bool,
    pub violations: Vec<Violation>,
    pub kept_declared: usize,
    pub total_waste: u64,
    pub days_by_lecturer: BTreeMap<String, usize>,
}

#[utoipa::path(
    post,
    path = "/v1/explain",
    request_body = ExplainIn,
    responses(
    (status = 200, description = "Constraint audit of the provided schedule", body = ExplainOut)
    )
)]
pub async fn explain(Json(input): Json<ExplainIn>) -> Json<ExplainOut> {
    let a = audit(&input.instance, &input.declared, &input.assignments);
    Json(ExplainOut {
        ok: a.is_clean(),
        violations: a.violations,
        kept_declared: a.kept_declared,
        total_waste: a.total_waste,
        days_by_lecturer: a.days_by_lecturer,
    })
}
