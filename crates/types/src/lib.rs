use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone,
            Debug,
            Serialize,
            Deserialize,
            ToSchema,
            JsonSchema,
            Eq,
            PartialEq,
            Ord,
            PartialOrd,
            Hash,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}
id_newtype!(LecturerId);
id_newtype!(RoomId);
id_newtype!(CourseId);
id_newtype!(TimeslotId);

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayOfWeek {
    pub fn ordinal(self) -> u32 {
        self as u32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Mon => "mon",
            DayOfWeek::Tue => "tue",
            DayOfWeek::Wed => "wed",
            DayOfWeek::Thu => "thu",
            DayOfWeek::Fri => "fri",
            DayOfWeek::Sat => "sat",
            DayOfWeek::Sun => "sun",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "mon" => DayOfWeek::Mon,
            "tue" => DayOfWeek::Tue,
            "wed" => DayOfWeek::Wed,
            "thu" => DayOfWeek::Thu,
            "fri" => DayOfWeek::Fri,
            "sat" => DayOfWeek::Sat,
            "sun" => DayOfWeek::Sun,
            _ => return None,
        })
    }
}

impl TimeslotId {
    /// Splits `day.period`, e.g. `tue.2`.
    pub fn parts(&self) -> Option<(DayOfWeek, u32)> {
        let (day, idx) = self.0.split_once('.')?;
        Some((DayOfWeek::parse(day)?, idx.parse::<u32>().ok()?))
    }
}

/// Behavioural profile that shapes a lecturer's utility over time slots.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    MorningPerson,
    EveningPerson,
    Clusterer,
    Spreader,
    #[default]
    Neutral,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    LectureHall,
    #[default]
    Classroom,
    Seminar,
    Lab,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lecturer {
    pub id: LecturerId,
    #[serde(default)]
    pub archetype: Archetype,
    /// One utility per time slot, in slot enumeration order. Empty means
    /// "derive from the archetype".
    #[serde(default)]
    pub preferences: Vec<f64>,
    #[serde(default)]
    pub noise: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub size: u32,
    pub lecturer_id: LecturerId,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub capacity: u32,
    #[serde(default)]
    pub kind: RoomKind,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: TimeslotId,
    pub day: DayOfWeek,
    pub period: u32,
    pub start: String,
    pub end: String,
}

impl TimeSlot {
    pub fn time_range(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Instance {
    pub courses: Vec<Course>,
    pub lecturers: Vec<Lecturer>,
    pub rooms: Vec<Room>,
    pub timeslots: Vec<TimeSlot>,
}

fn default_spread_fraction() -> f64 {
    0.5
}
fn default_deviation_penalty() -> f64 {
    1000.0
}
fn default_unscheduled_penalty() -> f64 {
    1_000_000.0
}
fn default_time_limit_ms() -> u64 {
    30_000
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleParams {
    #[serde(default = "default_spread_fraction")]
    pub spread_fraction: f64,
    #[serde(default = "default_deviation_penalty")]
    pub deviation_penalty: f64,
    #[serde(default = "default_unscheduled_penalty")]
    pub unscheduled_penalty: f64,
    /// `None` keeps every non-declared slot as an alternative.
    #[serde(default)]
    pub max_alternative_slots: Option<usize>,
    #[serde(default = "default_time_limit_ms")]
    pub time_limit_ms: u64,
    #[serde(default)]
    pub seed: u64,
}

impl Default for ScheduleParams {
    fn default() -> Self {
        Self {
            spread_fraction: default_spread_fraction(),
            deviation_penalty: default_deviation_penalty(),
            unscheduled_penalty: default_unscheduled_penalty(),
            max_alternative_slots: None,
            time_limit_ms: default_time_limit_ms(),
            seed: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct ScheduleEnvelope {
    pub instance: Instance,
    #[serde(default)]
    pub params: ScheduleParams,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeclaredPreference {
    pub course_id: CourseId,
    pub lecturer_id: LecturerId,
    pub timeslot: TimeslotId,
}

/// Which stage produced an assignment.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Declared,
    Alternative,
    Repaired,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub course_id: CourseId,
    pub lecturer_id: LecturerId,
    pub timeslot: TimeslotId,
    pub day: DayOfWeek,
    pub time_range: String,
    pub room_id: RoomId,
    pub origin: Origin,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Optimal,
    BestKnownIncomplete,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StageTimings {
    pub elicitation_ms: u64,
    pub candidates_ms: u64,
    pub assignment_ms: u64,
    pub repair_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub total_courses: usize,
    pub candidates: usize,
    pub kept_after_assignment: usize,
    pub kept_declared: usize,
    pub moved: usize,
    pub repaired: usize,
    pub assignment_status: AssignmentStatus,
    pub assignment_objective: f64,
    pub assignment_unscheduled: usize,
    pub timings: StageTimings,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct ScheduleResult {
    pub status: String,
    pub assignments: Vec<Assignment>,
    pub declared: Vec<DeclaredPreference>,
    pub summary: ScheduleSummary,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct Violation {
    pub r#type: String,
    pub details: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeslot_id_parts() {
        assert_eq!(
            TimeslotId::from("tue.2").parts(),
            Some((DayOfWeek::Tue, 2))
        );
        assert!(TimeslotId::from("tue").parts().is_none());
        assert!(TimeslotId::from("xyz.1").parts().is_none());
        assert!(TimeslotId::from("mon.a").parts().is_none());
    }

    #[test]
    fn params_default_when_omitted() {
        let env: ScheduleEnvelope = serde_json::from_str(
            r#"{"instance":{"courses":[],"lecturers":[],"rooms":[],"timeslots":[]}}"#,
        )
        .unwrap();
        assert_eq!(env.params.spread_fraction, 0.5);
        assert_eq!(env.params.max_alternative_slots, None);
        assert_eq!(env.params.time_limit_ms, 30_000);
    }

    #[test]
    fn lecturer_fields_are_camel_case() {
        let c: Course =
            serde_json::from_str(r#"{"id":"c1","size":30,"lecturerId":"l1"}"#).unwrap();
        assert_eq!(c.lecturer_id, LecturerId::from("l1"));
        let l: Lecturer = serde_json::from_str(r#"{"id":"l1","archetype":"morning_person"}"#).unwrap();
        assert_eq!(l.archetype, Archetype::MorningPerson);
        assert!(l.preferences.is_empty());
    }
}
