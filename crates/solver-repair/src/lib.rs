use sched_core::occupancy::{OccupancyState, Placement};
use sched_core::{Problem, ScheduleError};
use tracing::{debug, info};

/// Free (slot, room) for `course` closest to its declared slot `home`.
///
/// Searches the whole slot x room grid. Ties go to the tighter room, then to
/// the earlier slot and room in enumeration order.
fn nearest_free(
    problem: &Problem,
    occ: &OccupancyState,
    course: usize,
    home: usize,
) -> Option<(usize, usize)> {
    let size = problem.course(course).size;
    let lecturer = problem.lecturer_of(course);

    let mut best: Option<((u32, u32, usize, usize), (usize, usize))> = None;
    for t in 0..problem.slot_count() {
        let dist = problem.slot_distance(home, t);
        for (r, room) in problem.inst.rooms.iter().enumerate() {
            if room.capacity < size || !occ.is_free(lecturer, t, r) {
                continue;
            }
            let key = (dist, room.capacity - size, t, r);
            if best.map_or(true, |(k, _)| key < k) {
                best = Some((key, (t, r)));
            }
        }
    }
    best.map(|(_, at)| at)
}

/// Places every course in `unscheduled` greedily, in ascending course id
/// order, committing each choice before looking at the next course.
///
/// `declared[c]` is the declared slot of course `c`. Existing placements in
/// `occ` are never moved. Returns the new placements in commit order.
pub fn repair(
    problem: &Problem,
    declared: &[usize],
    unscheduled: &[usize],
    occ: &mut OccupancyState,
) -> Result<Vec<Placement>, ScheduleError> {
    let mut order = unscheduled.to_vec();
    order.sort_by(|&a, &b| problem.course(a).id.cmp(&problem.course(b).id));
    order.dedup();

    let mut placed = Vec::with_capacity(order.len());
    for ci in order {
        if occ.is_placed(ci) {
            continue;
        }
        let course = problem.course(ci);
        let home = declared[ci];
        let (t, r) = nearest_free(problem, occ, ci, home).ok_or_else(|| {
            ScheduleError::RepairExhausted {
                course: course.id.clone(),
            }
        })?;

        let p = Placement {
            course: ci,
            lecturer: problem.lecturer_of(ci),
            slot: t,
            room: r,
        };
        occ.commit(p).map_err(|clash| ScheduleError::OccupancyConflict {
            course: course.id.clone(),
            slot: problem.slot(t).id.clone(),
            room: problem.room(r).id.clone(),
            reason: clash.to_string(),
        })?;
        debug!(
            course = %course.id,
            declared = %problem.slot(home).id,
            slot = %problem.slot(t).id,
            room = %problem.room(r).id,
            distance = problem.slot_distance(home, t),
            "course repaired"
        );
        placed.push(p);
    }
    info!(repaired = placed.len(), "repair pass done");
    Ok(placed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{
        Archetype, Course, CourseId, DayOfWeek, Instance, Lecturer, LecturerId, Room, RoomId,
        RoomKind, TimeSlot, TimeslotId,
    };

    fn instance(courses: &[(&str, u32, &str)], rooms: &[u32], slots: &[(DayOfWeek, u32)]) -> Instance {
        let mut lecturers: Vec<&str> = courses.iter().map(|c| c.2).collect();
        lecturers.sort_unstable();
        lecturers.dedup();
        Instance {
            courses: courses
                .iter()
                .map(|&(id, size, l)| Course {
                    id: CourseId::from(id),
                    size,
                    lecturer_id: LecturerId::from(l),
                })
                .collect(),
            lecturers: lecturers
                .into_iter()
                .map(|l| Lecturer {
                    id: LecturerId::from(l),
                    archetype: Archetype::Neutral,
                    preferences: vec![1.0; slots.len()],
                    noise: 0.0,
                })
                .collect(),
            rooms: rooms
                .iter()
                .enumerate()
                .map(|(i, &capacity)| Room {
                    id: RoomId(format!("r{i}")),
                    capacity,
                    kind: RoomKind::Classroom,
                })
                .collect(),
            timeslots: slots
                .iter()
                .map(|&(day, period)| TimeSlot {
                    id: TimeslotId(format!("{}.{}", day.as_str(), period)),
                    day,
                    period,
                    start: "09:00".into(),
                    end: "10:30".into(),
                })
                .collect(),
        }
    }

    const GRID: [(DayOfWeek, u32); 4] = [
        (DayOfWeek::Mon, 0),
        (DayOfWeek::Mon, 1),
        (DayOfWeek::Mon, 2),
        (DayOfWeek::Tue, 0),
    ];

    #[test]
    fn moves_to_nearest_slot_with_a_fitting_room() {
        let inst = instance(&[("a", 60, "l1"), ("b", 60, "l2")], &[80, 20], &GRID);
        let p = Problem::new(&inst, 0).unwrap();
        let mut occ = OccupancyState::new();
        occ.commit(Placement {
            course: 0,
            lecturer: 0,
            slot: 1,
            room: 0,
        })
        .unwrap();

        let placed = repair(&p, &[1, 1], &[1], &mut occ).unwrap();
        assert_eq!(placed.len(), 1);
        // mon.0 and mon.2 are both one step away; mon.0 comes first
        assert_eq!((placed[0].slot, placed[0].room), (0, 0));
        assert_eq!(occ.len(), 2);
    }

    #[test]
    fn prefers_same_day_over_next_day() {
        let inst = instance(
            &[("a", 10, "l1"), ("b", 10, "l2"), ("c", 10, "l3")],
            &[10],
            &GRID,
        );
        let p = Problem::new(&inst, 0).unwrap();
        let mut occ = OccupancyState::new();
        for (course, slot) in [(0, 0), (1, 1)] {
            occ.commit(Placement {
                course,
                lecturer: course,
                slot,
                room: 0,
            })
            .unwrap();
        }
        let placed = repair(&p, &[0, 1, 0], &[2], &mut occ).unwrap();
        // mon.0 and mon.1 are taken; mon.2 (two steps) beats tue.0
        assert_eq!(placed[0].slot, 2);
    }

    #[test]
    fn later_courses_see_earlier_commits() {
        let inst = instance(&[("b", 10, "l1"), ("a", 10, "l2")], &[10], &GRID);
        let p = Problem::new(&inst, 0).unwrap();
        let mut occ = OccupancyState::new();
        let placed = repair(&p, &[2, 2], &[0, 1], &mut occ).unwrap();
        // "a" (index 1) goes first and takes the declared slot
        assert_eq!(placed[0].course, 1);
        assert_eq!(placed[0].slot, 2);
        assert_eq!(placed[1].course, 0);
        assert_eq!(placed[1].slot, 1);
    }

    #[test]
    fn avoids_lecturer_double_booking() {
        let inst = instance(&[("a", 10, "l1"), ("b", 10, "l1")], &[10, 10], &GRID);
        let p = Problem::new(&inst, 0).unwrap();
        let mut occ = OccupancyState::new();
        let placed = repair(&p, &[0, 0], &[0, 1], &mut occ).unwrap();
        assert_ne!(placed[0].slot, placed[1].slot);
    }

    #[test]
    fn picks_tightest_room_at_equal_distance() {
        let inst = instance(&[("a", 30, "l1")], &[100, 40, 30, 20], &GRID);
        let p = Problem::new(&inst, 0).unwrap();
        let mut occ = OccupancyState::new();
        let placed = repair(&p, &[3], &[0], &mut occ).unwrap();
        assert_eq!((placed[0].slot, placed[0].room), (3, 2));
    }

    #[test]
    fn full_grid_is_an_invariant_violation() {
        let inst = instance(&[("a", 10, "l1"), ("b", 10, "l2")], &[10], &GRID[..1]);
        let p = Problem::new(&inst, 0).unwrap();
        let mut occ = OccupancyState::new();
        let err = repair(&p, &[0, 0], &[0, 1], &mut occ).unwrap_err();
        match err {
            ScheduleError::RepairExhausted { course } => assert_eq!(course.0, "b"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
