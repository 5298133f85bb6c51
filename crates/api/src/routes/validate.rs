use axum::Json;
use sched_core::candidates::unplaceable_courses;
use sched_core::{validate, validate_params, Problem, ValidationError};
use serde::Serialize;
use types::ScheduleEnvelope;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ValidationReport {
    pub ok: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

fn split(err: ValidationError, into: &mut Vec<String>) {
    let ValidationError::Msg(msg) = err;
    into.extend(
        msg.split(';')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    );
}

/// Structural checks, then the capacity and load checks that need a valid
/// instance. Collects every problem instead of stopping at the first.
fn report(env: &ScheduleEnvelope) -> ValidationReport {
    let mut errors = Vec::new();
    if let Err(e) = validate_params(&env.params) {
        split(e, &mut errors);
    }
    match validate(&env.instance) {
        Err(e) => split(e, &mut errors),
        Ok(()) => match Problem::new(&env.instance, env.params.seed) {
            Err(e) => split(e, &mut errors),
            Ok(problem) => {
                for c in unplaceable_courses(&problem) {
                    let course = problem.course(c);
                    errors.push(format!(
                        "course {} has {} students but the largest room holds {}",
                        course.id,
                        course.size,
                        problem.largest_room()
                    ));
                }
                for l in 0..problem.lecturer_count() {
                    let n = problem.courses_of(l).len();
                    if n > problem.slot_count() {
                        errors.push(format!(
                            "lecturer {} teaches {} courses but there are {} timeslots",
                            problem.lecturer(l).id,
                            n,
                            problem.slot_count()
                        ));
                    }
                }
            }
        },
    }
    ValidationReport {
        ok: errors.is_empty(),
        errors,
    }
}

#[utoipa::path(
    post,
    path = "/v1/validate",
    request_body = ScheduleEnvelope,
    responses(
    (status = 200, description = "Validation result", body = ValidationReport)
    )
)]
pub async fn validate_handler(Json(env): Json<ScheduleEnvelope>) -> Json<ValidationReport> {
    Json(report(&env))
}
