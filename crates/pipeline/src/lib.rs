use async_trait::async_trait;
use sched_core::candidates::build_candidates;
use sched_core::scoring::audit;
use sched_core::{validate_params, Problem, ScheduleError, Solver};
use solver_milp::{assign_with_deadline, elicit, ElicitationInput};
use solver_repair::repair;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use types::{
    Assignment, DeclaredPreference, Origin, ScheduleEnvelope, ScheduleResult, ScheduleSummary,
    StageTimings,
};

/// Elicitation, candidate building, global assignment and repair, in that
/// order.
pub struct TwoStageSolver;

impl TwoStageSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TwoStageSolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Solver for TwoStageSolver {
    async fn solve(&self, env: ScheduleEnvelope) -> anyhow::Result<ScheduleResult> {
        Ok(run(env).await?)
    }
}

fn millis(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

/// Runs the whole pipeline. Either every course ends up assigned or the
/// run stops with an error naming the offending lecturer or course.
pub async fn run(env: ScheduleEnvelope) -> Result<ScheduleResult, ScheduleError> {
    let params = &env.params;
    validate_params(params)?;
    let problem = Problem::new(&env.instance, params.seed)?;
    info!(
        courses = problem.course_count(),
        lecturers = problem.lecturer_count(),
        rooms = problem.room_count(),
        slots = problem.slot_count(),
        "schedule requested"
    );

    for l in 0..problem.lecturer_count() {
        let courses = problem.courses_of(l).len();
        if courses > problem.slot_count() {
            return Err(ScheduleError::InfeasibleElicitation {
                lecturer: problem.lecturer(l).id.clone(),
                courses,
                slots: problem.slot_count(),
            });
        }
    }

    // Elicitation: one isolated solve per lecturer.
    let started = Instant::now();
    let handles: Vec<_> = (0..problem.lecturer_count())
        .map(|l| {
            let input = ElicitationInput::for_lecturer(&problem, l, params.spread_fraction);
            tokio::task::spawn_blocking(move || elicit(&input))
        })
        .collect();

    let mut declared_slot = vec![0usize; problem.course_count()];
    let mut declared: Vec<DeclaredPreference> = Vec::with_capacity(problem.course_count());
    for (l, handle) in handles.into_iter().enumerate() {
        let e = handle.await.map_err(|join| ScheduleError::ElicitationSolver {
            lecturer: problem.lecturer(l).id.clone(),
            message: join.to_string(),
        })??;
        for (&ci, &t) in problem.courses_of(l).iter().zip(&e.slot_of) {
            declared_slot[ci] = t;
        }
        declared.extend(e.declared);
    }
    declared.sort_by(|a, b| a.course_id.cmp(&b.course_id));
    let elicitation_ms = millis(started);

    let started = Instant::now();
    let pool = Arc::new(build_candidates(&problem, &declared_slot, params)?);
    let candidates_ms = millis(started);
    info!(candidates = pool.len(), "candidate pool ready");

    let started = Instant::now();
    let outcome = assign_with_deadline(
        Arc::clone(&pool),
        params.unscheduled_penalty,
        Duration::from_millis(params.time_limit_ms),
    )
    .await?;
    let mut occ = outcome.occupancy(&pool)?;
    let unscheduled = outcome.unscheduled(&pool);
    let kept_after_assignment = outcome
        .chosen
        .iter()
        .filter(|&&i| pool.candidates[i].declared)
        .count();
    let assignment_ms = millis(started);
    if !unscheduled.is_empty() {
        warn!(unscheduled = unscheduled.len(), "assignment left courses for repair");
    }

    let started = Instant::now();
    let repaired: HashSet<usize> = repair(&problem, &declared_slot, &unscheduled, &mut occ)?
        .into_iter()
        .map(|p| p.course)
        .collect();
    let repair_ms = millis(started);

    let mut assignments = Vec::with_capacity(problem.course_count());
    for &ci in problem.course_order() {
        let course = problem.course(ci);
        let p = occ.placement(ci).ok_or_else(|| ScheduleError::RepairExhausted {
            course: course.id.clone(),
        })?;
        let slot = problem.slot(p.slot);
        let origin = if repaired.contains(&ci) {
            Origin::Repaired
        } else if p.slot == declared_slot[ci] {
            Origin::Declared
        } else {
            Origin::Alternative
        };
        assignments.push(Assignment {
            course_id: course.id.clone(),
            lecturer_id: course.lecturer_id.clone(),
            timeslot: slot.id.clone(),
            day: slot.day,
            time_range: slot.time_range(),
            room_id: problem.room(p.room).id.clone(),
            origin,
        });
    }

    let report = audit(&env.instance, &declared, &assignments);
    if !report.is_clean() {
        let details: Vec<String> = report.violations.iter().map(|v| v.details.clone()).collect();
        return Err(ScheduleError::Audit(details.join("; ")));
    }

    let summary = ScheduleSummary {
        total_courses: problem.course_count(),
        candidates: pool.len(),
        kept_after_assignment,
        kept_declared: report.kept_declared,
        moved: assignments
            .iter()
            .filter(|a| a.origin == Origin::Alternative)
            .count(),
        repaired: repaired.len(),
        assignment_status: outcome.status,
        assignment_objective: outcome.objective,
        assignment_unscheduled: unscheduled.len(),
        timings: StageTimings {
            elicitation_ms,
            candidates_ms,
            assignment_ms,
            repair_ms,
        },
    };
    info!(
        kept = summary.kept_declared,
        moved = summary.moved,
        repaired = summary.repaired,
        waste = report.total_waste,
        "schedule complete"
    );

    Ok(ScheduleResult {
        status: "solved".into(),
        assignments,
        declared,
        summary,
    })
}
