use std::collections::{BTreeMap, BTreeSet, HashMap};
use types::{Assignment, Course, DeclaredPreference, Instance, Room, Violation};

#[derive(Clone, Debug, Default)]
pub struct Audit {
    pub violations: Vec<Violation>,
    pub kept_declared: usize,
    pub total_waste: u64,
    pub days_by_lecturer: BTreeMap<String, usize>,
}

impl Audit {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

fn violation(kind: &str, details: String) -> Violation {
    Violation {
        r#type: kind.into(),
        details,
    }
}

/// Checks a finished assignment table against the hard constraints and
/// measures how much of the declared preferences it kept.
pub fn audit(inst: &Instance, declared: &[DeclaredPreference], assignments: &[Assignment]) -> Audit {
    let course_by_id: HashMap<&str, &Course> =
        inst.courses.iter().map(|c| (c.id.0.as_str(), c)).collect();
    let room_by_id: HashMap<&str, &Room> = inst.rooms.iter().map(|r| (r.id.0.as_str(), r)).collect();
    let slot_day: HashMap<&str, _> = inst
        .timeslots
        .iter()
        .map(|t| (t.id.0.as_str(), t.day))
        .collect();
    let declared_slot: HashMap<&str, &str> = declared
        .iter()
        .map(|d| (d.course_id.0.as_str(), d.timeslot.0.as_str()))
        .collect();

    let mut out = Audit::default();
    let mut seen_course: BTreeSet<&str> = BTreeSet::new();
    let mut occ_room: BTreeMap<(&str, &str), &str> = BTreeMap::new();
    let mut occ_lecturer: BTreeMap<(&str, &str), &str> = BTreeMap::new();
    let mut days: BTreeMap<&str, BTreeSet<_>> = BTreeMap::new();

    for a in assignments {
        let cid = a.course_id.0.as_str();
        let ts = a.timeslot.0.as_str();
        let rid = a.room_id.0.as_str();

        let Some(course) = course_by_id.get(cid) else {
            out.violations
                .push(violation("unknown_course", format!("course {cid} is not in the instance")));
            continue;
        };
        if !seen_course.insert(cid) {
            out.violations
                .push(violation("duplicate_course", format!("course {cid} is assigned twice")));
            continue;
        }
        let Some(&day) = slot_day.get(ts) else {
            out.violations.push(violation(
                "unknown_timeslot",
                format!("course {cid} uses unknown timeslot {ts}"),
            ));
            continue;
        };
        let Some(room) = room_by_id.get(rid) else {
            out.violations
                .push(violation("unknown_room", format!("course {cid} uses unknown room {rid}")));
            continue;
        };
        if a.lecturer_id != course.lecturer_id {
            out.violations.push(violation(
                "lecturer_mismatch",
                format!(
                    "course {cid} belongs to {} but is listed under {}",
                    course.lecturer_id, a.lecturer_id
                ),
            ));
        }
        if room.capacity < course.size {
            out.violations.push(violation(
                "capacity",
                format!(
                    "course {cid} ({}) exceeds room {rid} ({})",
                    course.size, room.capacity
                ),
            ));
        } else {
            out.total_waste += u64::from(room.capacity - course.size);
        }

        if let Some(other) = occ_room.insert((ts, rid), cid) {
            out.violations.push(violation(
                "room_conflict",
                format!("courses {other} and {cid} share room {rid} at {ts}"),
            ));
        }
        let lid = course.lecturer_id.0.as_str();
        if let Some(other) = occ_lecturer.insert((lid, ts), cid) {
            out.violations.push(violation(
                "lecturer_conflict",
                format!("lecturer {lid} teaches {other} and {cid} at {ts}"),
            ));
        }
        days.entry(lid).or_default().insert(day);

        if declared_slot.get(cid) == Some(&ts) {
            out.kept_declared += 1;
        }
    }

    for c in &inst.courses {
        if !seen_course.contains(c.id.0.as_str()) {
            out.violations
                .push(violation("unassigned", format!("course {} has no assignment", c.id)));
        }
    }

    out.days_by_lecturer = days
        .into_iter()
        .map(|(l, d)| (l.to_string(), d.len()))
        .collect();
    out
}
