use good_lp::{default_solver, variable, Expression, ProblemVariables, Solution, SolverModel, Variable};
use sched_core::{Problem, ScheduleError};
use std::collections::BTreeMap;
use tracing::debug;
use types::{CourseId, DeclaredPreference, LecturerId, TimeslotId};

/// Everything one lecturer's solve is allowed to see. Owned, so each solve
/// works on its own copy and nothing is shared between lecturers.
#[derive(Clone, Debug)]
pub struct ElicitationInput {
    pub lecturer: LecturerId,
    pub courses: Vec<CourseId>,
    pub slots: Vec<TimeslotId>,
    pub slot_days: Vec<u32>,
    pub utilities: Vec<f64>,
    pub spread_weight: f64,
}

impl ElicitationInput {
    pub fn for_lecturer(problem: &Problem, l: usize, spread_fraction: f64) -> Self {
        let utilities = problem.preferences(l).to_vec();
        Self {
            lecturer: problem.lecturer(l).id.clone(),
            courses: problem
                .courses_of(l)
                .iter()
                .map(|&c| problem.course(c).id.clone())
                .collect(),
            slots: problem.inst.timeslots.iter().map(|t| t.id.clone()).collect(),
            slot_days: (0..problem.slot_count()).map(|t| problem.slot_day(t)).collect(),
            spread_weight: spread_weight(&utilities, spread_fraction),
            utilities,
        }
    }
}

/// Day-spread weight: `fraction` of the lecturer's own utility range.
pub fn spread_weight(utilities: &[f64], fraction: f64) -> f64 {
    let max = utilities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = utilities.iter().copied().fold(f64::INFINITY, f64::min);
    if utilities.is_empty() {
        0.0
    } else {
        fraction * (max - min)
    }
}

#[derive(Clone, Debug)]
pub struct Elicitation {
    pub declared: Vec<DeclaredPreference>,
    /// Declared slot index per input course.
    pub slot_of: Vec<usize>,
    pub objective: f64,
    pub days_used: usize,
}

/// Assigns the lecturer's courses to distinct slots, maximising utility
/// minus `spread_weight` per teaching day used.
///
/// The model only involves this lecturer's data, so the truthful report is a
/// dominant strategy and the VCG payment is zero.
pub fn elicit(input: &ElicitationInput) -> Result<Elicitation, ScheduleError> {
    let n_slots = input.slots.len();
    if input.courses.len() > n_slots {
        return Err(ScheduleError::InfeasibleElicitation {
            lecturer: input.lecturer.clone(),
            courses: input.courses.len(),
            slots: n_slots,
        });
    }
    if input.courses.is_empty() {
        return Ok(Elicitation {
            declared: Vec::new(),
            slot_of: Vec::new(),
            objective: 0.0,
            days_used: 0,
        });
    }

    let mut vars = ProblemVariables::new();
    let x: Vec<Vec<Variable>> = input
        .courses
        .iter()
        .map(|_| (0..n_slots).map(|_| vars.add(variable().binary())).collect())
        .collect();
    let mut y: BTreeMap<u32, Variable> = BTreeMap::new();
    for &d in &input.slot_days {
        y.entry(d).or_insert_with(|| vars.add(variable().binary()));
    }

    let mut objective = Expression::from(0.0);
    for row in &x {
        for (t, &v) in row.iter().enumerate() {
            objective = objective + input.utilities[t] * v;
        }
    }
    for &v in y.values() {
        objective = objective - input.spread_weight * v;
    }

    let mut model = vars.maximise(objective).using(default_solver);
    for row in &x {
        let sum = row.iter().fold(Expression::from(0.0), |acc, &v| acc + v);
        model = model.with(sum.eq(1.0));
    }
    // At most one own course per slot, and only on a day switched on.
    for t in 0..n_slots {
        let mut sum = x.iter().fold(Expression::from(0.0), |acc, row| acc + row[t]);
        sum = sum - y[&input.slot_days[t]];
        model = model.with(sum.leq(0.0));
    }

    let sol = model.solve().map_err(|e| ScheduleError::ElicitationSolver {
        lecturer: input.lecturer.clone(),
        message: e.to_string(),
    })?;

    let mut slot_of = Vec::with_capacity(input.courses.len());
    for (ci, row) in x.iter().enumerate() {
        let t = row.iter().position(|&v| sol.value(v) > 0.5).ok_or_else(|| {
            ScheduleError::ElicitationSolver {
                lecturer: input.lecturer.clone(),
                message: format!("no slot chosen for course {}", input.courses[ci]),
            }
        })?;
        slot_of.push(t);
    }

    let mut days: Vec<u32> = slot_of.iter().map(|&t| input.slot_days[t]).collect();
    days.sort_unstable();
    days.dedup();
    let utility: f64 = slot_of.iter().map(|&t| input.utilities[t]).sum();
    let objective = utility - input.spread_weight * days.len() as f64;
    debug!(lecturer = %input.lecturer, objective, days = days.len(), "preferences elicited");

    let declared = input
        .courses
        .iter()
        .zip(&slot_of)
        .map(|(c, &t)| DeclaredPreference {
            course_id: c.clone(),
            lecturer_id: input.lecturer.clone(),
            timeslot: input.slots[t].clone(),
        })
        .collect();

    Ok(Elicitation {
        declared,
        slot_of,
        objective,
        days_used: days.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(courses: &[&str], days: &[u32], utilities: &[f64], fraction: f64) -> ElicitationInput {
        let slots = (0..days.len())
            .map(|i| TimeslotId(format!("s{i}")))
            .collect();
        ElicitationInput {
            lecturer: LecturerId::from("l1"),
            courses: courses.iter().map(|&c| CourseId::from(c)).collect(),
            slots,
            slot_days: days.to_vec(),
            utilities: utilities.to_vec(),
            spread_weight: spread_weight(utilities, fraction),
        }
    }

    fn chosen(e: &Elicitation) -> Vec<usize> {
        let mut v = e.slot_of.clone();
        v.sort_unstable();
        v
    }

    #[test]
    fn spread_weight_scales_with_range() {
        assert_eq!(spread_weight(&[1.0, 5.0, 3.0], 0.5), 2.0);
        assert_eq!(spread_weight(&[2.0, 2.0], 0.5), 0.0);
        assert_eq!(spread_weight(&[], 0.5), 0.0);
    }

    #[test]
    fn picks_top_distinct_slots() {
        let e = elicit(&input(&["a", "b"], &[0, 0, 0, 0], &[1.0, 7.0, 3.0, 9.0], 0.5)).unwrap();
        assert_eq!(chosen(&e), vec![1, 3]);
        assert_ne!(e.slot_of[0], e.slot_of[1]);
        assert_eq!(e.declared.len(), 2);
        assert_eq!(e.declared[0].course_id.0, "a");
        assert_eq!(e.days_used, 1);
    }

    #[test]
    fn spread_penalty_clusters_teaching_days() {
        // mon.0, mon.1, tue.0, tue.1
        let days = [0, 0, 1, 1];
        let utilities = [10.0, 6.0, 9.0, 0.0];

        let spread = elicit(&input(&["a", "b"], &days, &utilities, 0.0)).unwrap();
        assert_eq!(chosen(&spread), vec![0, 2]);
        assert_eq!(spread.days_used, 2);

        // lambda = 5: one day scores 16 - 5, two days 19 - 10
        let clustered = elicit(&input(&["a", "b"], &days, &utilities, 0.5)).unwrap();
        assert_eq!(chosen(&clustered), vec![0, 1]);
        assert_eq!(clustered.days_used, 1);
        assert!((clustered.objective - 11.0).abs() < 1e-6);
    }

    #[test]
    fn more_courses_than_slots_is_infeasible() {
        let err = elicit(&input(&["a", "b", "c"], &[0, 0], &[1.0, 2.0], 0.5)).unwrap_err();
        match err {
            ScheduleError::InfeasibleElicitation {
                lecturer,
                courses,
                slots,
            } => {
                assert_eq!(lecturer.0, "l1");
                assert_eq!((courses, slots), (3, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn lecturer_without_courses_declares_nothing() {
        let e = elicit(&input(&[], &[0, 1], &[1.0, 2.0], 0.5)).unwrap();
        assert!(e.declared.is_empty());
    }

    #[test]
    fn uses_every_slot_when_courses_match_slots() {
        let e = elicit(&input(&["a", "b", "c"], &[0, 1, 2], &[3.0, 1.0, 2.0], 0.5)).unwrap();
        assert_eq!(chosen(&e), vec![0, 1, 2]);
        assert_eq!(e.days_used, 3);
    }
}
