use good_lp::{
    default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolutionStatus, SolverModel, Variable, WithInitialSolution, WithTimeLimit,
};
use sched_core::candidates::CandidatePool;
use sched_core::occupancy::{OccupancyState, Placement};
use sched_core::ScheduleError;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use types::AssignmentStatus;

#[derive(Clone, Debug, PartialEq)]
pub struct AssignmentOutcome {
    /// Indices into the candidate pool, ascending.
    pub chosen: Vec<usize>,
    pub status: AssignmentStatus,
    /// Sum of the chosen candidates' costs.
    pub objective: f64,
}

impl AssignmentOutcome {
    fn from_chosen(pool: &CandidatePool, mut chosen: Vec<usize>, status: AssignmentStatus) -> Self {
        chosen.sort_unstable();
        let objective = chosen.iter().map(|&i| pool.candidates[i].cost).sum();
        Self {
            chosen,
            status,
            objective,
        }
    }

    /// Courses without a chosen candidate, ascending by course index.
    pub fn unscheduled(&self, pool: &CandidatePool) -> Vec<usize> {
        let mut placed = vec![false; pool.course_count];
        for &i in &self.chosen {
            placed[pool.candidates[i].course] = true;
        }
        (0..pool.course_count).filter(|&c| !placed[c]).collect()
    }

    /// Seeds the occupancy state with the chosen candidates.
    pub fn occupancy(&self, pool: &CandidatePool) -> Result<OccupancyState, ScheduleError> {
        let mut occ = OccupancyState::new();
        for &i in &self.chosen {
            let c = &pool.candidates[i];
            occ.commit(Placement {
                course: c.course,
                lecturer: c.lecturer,
                slot: c.slot,
                room: c.room,
            })
            .map_err(|clash| {
                ScheduleError::AssignmentModel(format!(
                    "chosen candidate #{i} violates occupancy: {clash}"
                ))
            })?;
        }
        Ok(occ)
    }
}

fn sum_of(xs: &[Variable], idx: &[usize]) -> Expression {
    idx.iter().fold(Expression::from(0.0), |acc, &i| acc + xs[i])
}

/// Price of leaving a course out. Never below one more than the sum of every
/// course's dearest candidate, so placing one more course always beats any
/// rearrangement of the others.
pub fn leave_out_penalty(pool: &CandidatePool, requested: f64) -> f64 {
    let mut dearest = vec![0.0f64; pool.course_count];
    for c in &pool.candidates {
        dearest[c.course] = dearest[c.course].max(c.cost);
    }
    requested.max(1.0 + dearest.iter().sum::<f64>())
}

/// Picks at most one candidate per course, minimising total candidate cost
/// with a leave-out penalty for every course left out, subject to
/// (slot, room) and (lecturer, slot) exclusivity.
///
/// The greedy solution seeds the solver. With a `time_limit` the solver stops
/// on its own and returns its best incumbent as `BestKnownIncomplete`.
pub fn solve_assignment(
    pool: &CandidatePool,
    unscheduled_penalty: f64,
    time_limit: Option<Duration>,
) -> Result<AssignmentOutcome, ScheduleError> {
    if pool.is_empty() {
        return Ok(AssignmentOutcome::from_chosen(pool, Vec::new(), AssignmentStatus::Optimal));
    }
    let penalty = leave_out_penalty(pool, unscheduled_penalty);
    if penalty > unscheduled_penalty {
        debug!(
            requested = unscheduled_penalty,
            penalty,
            "leave-out penalty raised above candidate costs"
        );
    }

    let mut by_course: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut by_cell: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
    let mut by_lecturer: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
    for (i, c) in pool.candidates.iter().enumerate() {
        by_course.entry(c.course).or_default().push(i);
        by_cell.entry((c.slot, c.room)).or_default().push(i);
        by_lecturer.entry((c.lecturer, c.slot)).or_default().push(i);
    }

    let mut vars = ProblemVariables::new();
    let xs: Vec<Variable> = pool
        .candidates
        .iter()
        .map(|_| vars.add(variable().binary()))
        .collect();

    // cost(x) + U * (courses - sum x), written without the constant
    let objective = pool
        .candidates
        .iter()
        .zip(&xs)
        .fold(Expression::from(0.0), |acc, (c, &x)| acc + (c.cost - penalty) * x);

    let greedy = greedy_assignment(pool);
    let mut hint = vec![0.0; xs.len()];
    for &i in &greedy.chosen {
        hint[i] = 1.0;
    }

    let mut model = vars
        .minimise(objective)
        .using(default_solver)
        .with_initial_solution(xs.iter().copied().zip(hint));
    if let Some(limit) = time_limit {
        model = model.with_time_limit(limit.as_secs_f64());
    }
    for idx in by_course.values() {
        model = model.with(sum_of(&xs, idx).leq(1.0));
    }
    for idx in by_cell.values().chain(by_lecturer.values()) {
        if idx.len() > 1 {
            model = model.with(sum_of(&xs, idx).leq(1.0));
        }
    }

    let sol = match model.solve() {
        Ok(sol) => sol,
        Err(ResolutionError::Infeasible) => {
            return Err(ScheduleError::AssignmentModel(
                "model proven infeasible although leaving courses out is always allowed".into(),
            ))
        }
        // stopped by the time limit before holding any incumbent
        Err(ResolutionError::Other(msg)) if time_limit.is_some() => {
            warn!(reason = msg, "assignment stopped without incumbent, keeping greedy solution");
            return Ok(greedy);
        }
        Err(other) => return Err(ScheduleError::AssignmentModel(other.to_string())),
    };

    let status = match sol.status() {
        SolutionStatus::Optimal => AssignmentStatus::Optimal,
        SolutionStatus::TimeLimit | SolutionStatus::GapLimit => {
            AssignmentStatus::BestKnownIncomplete
        }
    };
    let chosen = xs
        .iter()
        .enumerate()
        .filter(|(_, &x)| sol.value(x) > 0.5)
        .map(|(i, _)| i)
        .collect();
    Ok(AssignmentOutcome::from_chosen(pool, chosen, status))
}

/// Cheapest-first greedy over the same pool. Seeds the exact solve and
/// stands in for it when no time is left.
pub fn greedy_assignment(pool: &CandidatePool) -> AssignmentOutcome {
    let mut order: Vec<usize> = (0..pool.len()).collect();
    order.sort_by(|&a, &b| {
        let (ca, cb) = (&pool.candidates[a], &pool.candidates[b]);
        ca.cost
            .total_cmp(&cb.cost)
            .then((ca.course, ca.slot, ca.room).cmp(&(cb.course, cb.slot, cb.room)))
    });

    let mut occ = OccupancyState::new();
    let mut chosen = Vec::new();
    for i in order {
        let c = &pool.candidates[i];
        let placement = Placement {
            course: c.course,
            lecturer: c.lecturer,
            slot: c.slot,
            room: c.room,
        };
        if occ.commit(placement).is_ok() {
            chosen.push(i);
        }
    }
    AssignmentOutcome::from_chosen(pool, chosen, AssignmentStatus::BestKnownIncomplete)
}

/// Runs [`solve_assignment`] on a blocking worker with `limit` as the
/// solver's own time limit.
pub async fn assign_with_deadline(
    pool: Arc<CandidatePool>,
    unscheduled_penalty: f64,
    limit: Duration,
) -> Result<AssignmentOutcome, ScheduleError> {
    if limit.is_zero() {
        warn!("no assignment time budget, using greedy incumbent");
        return Ok(greedy_assignment(&pool));
    }
    let worker_pool = Arc::clone(&pool);
    let out = tokio::task::spawn_blocking(move || {
        solve_assignment(&worker_pool, unscheduled_penalty, Some(limit))
    })
    .await
    .map_err(|join| ScheduleError::AssignmentModel(format!("assignment worker failed: {join}")))??;

    match out.status {
        AssignmentStatus::Optimal => {
            info!(chosen = out.chosen.len(), objective = out.objective, "assignment solved")
        }
        AssignmentStatus::BestKnownIncomplete => warn!(
            limit_ms = limit.as_millis() as u64,
            chosen = out.chosen.len(),
            objective = out.objective,
            "assignment time limit hit, keeping best incumbent"
        ),
    }
    Ok(out)
}
