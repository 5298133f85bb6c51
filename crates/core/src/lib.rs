pub mod candidates;
pub mod occupancy;
pub mod preference;
pub mod problem;
pub mod scoring;

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

pub use problem::Problem;
pub use types::{
    Assignment, Course, CourseId, DeclaredPreference, Instance, Lecturer, LecturerId, Room,
    RoomId, ScheduleEnvelope, ScheduleParams, ScheduleResult, TimeSlot, TimeslotId,
};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid instance: {0}")]
    Msg(String),
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("lecturer {lecturer} has {courses} courses but only {slots} time slots")]
    InfeasibleElicitation {
        lecturer: LecturerId,
        courses: usize,
        slots: usize,
    },
    #[error("course {course} of size {size} fits no room (largest capacity {largest_room})")]
    DataInfeasibility {
        course: CourseId,
        size: u32,
        largest_room: u32,
    },
    #[error("elicitation solve failed for lecturer {lecturer}: {message}")]
    ElicitationSolver { lecturer: LecturerId, message: String },
    #[error("assignment model failed: {0}")]
    AssignmentModel(String),
    #[error("cannot place course {course} at {slot} in {room}: {reason}")]
    OccupancyConflict {
        course: CourseId,
        slot: TimeslotId,
        room: RoomId,
        reason: String,
    },
    #[error("repair found no free slot and room for course {course}")]
    RepairExhausted { course: CourseId },
    #[error("schedule audit failed: {0}")]
    Audit(String),
}

impl ScheduleError {
    /// Errors caused by the input rather than by the pipeline itself.
    pub fn is_infeasibility(&self) -> bool {
        matches!(
            self,
            ScheduleError::Invalid(_)
                | ScheduleError::InfeasibleElicitation { .. }
                | ScheduleError::DataInfeasibility { .. }
        )
    }
}

/// Largest magnitude accepted for a utility or a noise amplitude.
pub const MAX_UTILITY: f64 = 1e9;

pub fn validate(inst: &Instance) -> Result<(), ValidationError> {
    let mut errors: Vec<String> = Vec::new();

    if inst.timeslots.is_empty() {
        errors.push("timeslots is empty".into());
    }
    let mut grid = HashSet::new();
    for t in &inst.timeslots {
        match t.id.parts() {
            None => errors.push(format!("timeslot has invalid format: {}", t.id)),
            Some((day, period)) if day != t.day || period != t.period => errors.push(format!(
                "timeslot {} disagrees with its day/period fields",
                t.id
            )),
            Some(_) => {}
        }
        if !grid.insert((t.day, t.period)) {
            errors.push(format!(
                "duplicate timeslot position {}.{}",
                t.day.as_str(),
                t.period
            ));
        }
    }

    fn chk_unique<I: ToString>(name: &str, ids: impl Iterator<Item = I>, errors: &mut Vec<String>) {
        let mut seen = HashSet::new();
        for id in ids {
            let s = id.to_string();
            if !seen.insert(s.clone()) {
                errors.push(format!("duplicate {name} id: {s}"));
            }
        }
    }
    chk_unique("lecturer", inst.lecturers.iter().map(|x| &x.id.0), &mut errors);
    chk_unique("room", inst.rooms.iter().map(|x| &x.id.0), &mut errors);
    chk_unique("course", inst.courses.iter().map(|x| &x.id.0), &mut errors);
    chk_unique("timeslot", inst.timeslots.iter().map(|x| &x.id.0), &mut errors);

    for r in &inst.rooms {
        if r.capacity == 0 {
            errors.push(format!("room {} has capacity 0", r.id));
        }
    }

    let slots = inst.timeslots.len();
    for l in &inst.lecturers {
        if !l.preferences.is_empty() && l.preferences.len() != slots {
            errors.push(format!(
                "lecturer {} has {} preferences for {} timeslots",
                l.id,
                l.preferences.len(),
                slots
            ));
        }
        if l.preferences.iter().any(|u| !u.is_finite()) {
            errors.push(format!("lecturer {} has a non-finite preference", l.id));
        } else if l.preferences.iter().any(|u| u.abs() > MAX_UTILITY) {
            errors.push(format!(
                "lecturer {} has a preference beyond +/-{MAX_UTILITY}",
                l.id
            ));
        }
        if !(0.0..=MAX_UTILITY).contains(&l.noise) {
            errors.push(format!("lecturer {} has invalid noise {}", l.id, l.noise));
        }
    }

    let lecturers: HashSet<_> = inst.lecturers.iter().map(|l| &l.id.0).collect();
    for c in &inst.courses {
        if !lecturers.contains(&c.lecturer_id.0) {
            errors.push(format!(
                "course {} references missing lecturer {}",
                c.id, c.lecturer_id
            ));
        }
        if c.size == 0 {
            errors.push(format!("course {} has size 0", c.id));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Msg(errors.join("; ")))
    }
}

pub fn validate_params(params: &ScheduleParams) -> Result<(), ValidationError> {
    let mut errors: Vec<String> = Vec::new();
    let non_negative = |v: f64| v.is_finite() && v >= 0.0;

    if !non_negative(params.spread_fraction) {
        errors.push(format!("spreadFraction must be >= 0, got {}", params.spread_fraction));
    }
    if !non_negative(params.deviation_penalty) {
        errors.push(format!("deviationPenalty must be >= 0, got {}", params.deviation_penalty));
    }
    if !params.unscheduled_penalty.is_finite()
        || params.unscheduled_penalty <= params.deviation_penalty
    {
        errors.push(format!(
            "unscheduledPenalty ({}) must exceed deviationPenalty ({})",
            params.unscheduled_penalty, params.deviation_penalty
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Msg(errors.join("; ")))
    }
}

#[async_trait]
pub trait Solver: Send + Sync + 'static {
    async fn solve(&self, env: ScheduleEnvelope) -> anyhow::Result<ScheduleResult>;
}
