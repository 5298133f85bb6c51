//! Integer programs of the scheduling pipeline, built with `good_lp`.
//!
//! * [`elicit`]: per-lecturer preference elicitation (one small ILP per lecturer).
//! * [`assign`]: the global candidate selection over every course.

pub mod assign;
pub mod elicit;

pub use assign::{
    assign_with_deadline, greedy_assignment, leave_out_penalty, solve_assignment, AssignmentOutcome,
};
pub use elicit::{elicit, spread_weight, Elicitation, ElicitationInput};
