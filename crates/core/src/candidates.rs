use tracing::{debug, warn};
use types::ScheduleParams;

use crate::{Problem, ScheduleError};

/// One feasible (course, slot, room) choice and the exact cost the
/// assignment stage minimises for it.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub course: usize,
    pub lecturer: usize,
    pub slot: usize,
    pub room: usize,
    pub waste: u32,
    pub declared: bool,
    pub cost: f64,
}

/// Immutable candidate set for every course, grouped by course index.
#[derive(Clone, Debug, Default)]
pub struct CandidatePool {
    pub candidates: Vec<Candidate>,
    pub course_count: usize,
}

impl CandidatePool {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Courses larger than every room, in ascending id order.
pub fn unplaceable_courses(problem: &Problem) -> Vec<usize> {
    let largest = problem.largest_room();
    problem
        .course_order()
        .iter()
        .copied()
        .filter(|&c| problem.course(c).size > largest)
        .collect()
}

/// Fails with the first course (by id) that no room can ever hold.
pub fn check_room_feasibility(problem: &Problem) -> Result<(), ScheduleError> {
    let bad = unplaceable_courses(problem);
    for &c in bad.iter().skip(1) {
        warn!(course = %problem.course(c).id, "course also fits no room");
    }
    match bad.first() {
        None => Ok(()),
        Some(&c) => {
            let course = problem.course(c);
            Err(ScheduleError::DataInfeasibility {
                course: course.id.clone(),
                size: course.size,
                largest_room: problem.largest_room(),
            })
        }
    }
}

/// Slots other than `declared`, nearest first (ties by enumeration order),
/// truncated to `cap` when given.
pub fn alternative_slots(problem: &Problem, declared: usize, cap: Option<usize>) -> Vec<usize> {
    let mut alts: Vec<usize> = (0..problem.slot_count()).filter(|&t| t != declared).collect();
    alts.sort_by_key(|&t| (problem.slot_distance(declared, t), t));
    if let Some(cap) = cap {
        alts.truncate(cap);
    }
    alts
}

/// Expands each course's declared slot plus its alternatives by every room
/// that can hold the course. `declared[c]` is the declared slot of course `c`.
pub fn build_candidates(
    problem: &Problem,
    declared: &[usize],
    params: &ScheduleParams,
) -> Result<CandidatePool, ScheduleError> {
    if declared.len() != problem.course_count() {
        return Err(ScheduleError::AssignmentModel(format!(
            "{} declared slots for {} courses",
            declared.len(),
            problem.course_count()
        )));
    }
    check_room_feasibility(problem)?;

    let mut candidates = Vec::new();
    for ci in 0..problem.course_count() {
        let course = problem.course(ci);
        let lecturer = problem.lecturer_of(ci);
        let rooms: Vec<(usize, u32)> = problem
            .inst
            .rooms
            .iter()
            .enumerate()
            .filter(|(_, r)| r.capacity >= course.size)
            .map(|(ri, r)| (ri, r.capacity - course.size))
            .collect();

        let home = declared[ci];
        let slots = std::iter::once(home)
            .chain(alternative_slots(problem, home, params.max_alternative_slots));
        for t in slots {
            let is_declared = t == home;
            for &(ri, waste) in &rooms {
                let mut cost = f64::from(waste);
                if !is_declared {
                    cost += params.deviation_penalty;
                }
                candidates.push(Candidate {
                    course: ci,
                    lecturer,
                    slot: t,
                    room: ri,
                    waste,
                    declared: is_declared,
                    cost,
                });
            }
        }
    }
    debug!(
        candidates = candidates.len(),
        courses = problem.course_count(),
        "candidate pool built"
    );

    Ok(CandidatePool {
        candidates,
        course_count: problem.course_count(),
    })
}
