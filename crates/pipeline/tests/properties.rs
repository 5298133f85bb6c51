use pipeline::run;
use proptest::prelude::*;
use std::collections::HashSet;
use types::{
    Archetype, Course, CourseId, DayOfWeek, Instance, Lecturer, LecturerId, Room, RoomId,
    RoomKind, ScheduleEnvelope, ScheduleParams, TimeSlot, TimeslotId,
};

/// Random instances where every course fits every room and no lecturer
/// teaches more than half the slots, so a full schedule always exists.
fn arb_instance() -> impl Strategy<Value = Instance> {
    (2usize..=6, 1usize..=3, 1usize..=3)
        .prop_flat_map(|(slots, rooms, lecturers)| {
            (
                Just(slots),
                prop::collection::vec(30u32..=100, rooms),
                prop::collection::vec(prop::collection::vec(0.0f64..10.0, slots), lecturers),
                prop::collection::vec((0..lecturers, 1u32..=30), 0..=(rooms * slots / 2)),
            )
        })
        .prop_map(|(slots, capacities, preferences, raw_courses)| {
            let per_lecturer_cap = slots / 2;
            let mut load = vec![0usize; preferences.len()];
            let mut courses = Vec::new();
            for (i, (l, size)) in raw_courses.into_iter().enumerate() {
                if load[l] == per_lecturer_cap {
                    continue;
                }
                load[l] += 1;
                courses.push(Course {
                    id: CourseId(format!("c{i:02}")),
                    size,
                    lecturer_id: LecturerId(format!("l{l}")),
                });
            }
            Instance {
                courses,
                lecturers: preferences
                    .into_iter()
                    .enumerate()
                    .map(|(l, preferences)| Lecturer {
                        id: LecturerId(format!("l{l}")),
                        archetype: Archetype::Neutral,
                        preferences,
                        noise: 0.0,
                    })
                    .collect(),
                rooms: capacities
                    .into_iter()
                    .enumerate()
                    .map(|(r, capacity)| Room {
                        id: RoomId(format!("r{r}")),
                        capacity,
                        kind: RoomKind::Classroom,
                    })
                    .collect(),
                timeslots: (0..slots)
                    .map(|t| {
                        let (day, period) = if t < slots / 2 {
                            (DayOfWeek::Mon, t as u32)
                        } else {
                            (DayOfWeek::Tue, (t - slots / 2) as u32)
                        };
                        TimeSlot {
                            id: TimeslotId(format!("{}.{}", day.as_str(), period)),
                            day,
                            period,
                            start: "09:00".into(),
                            end: "10:30".into(),
                        }
                    })
                    .collect(),
            }
        })
}

fn solve(instance: Instance, max_alternative_slots: Option<usize>) -> types::ScheduleResult {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let env = ScheduleEnvelope {
        instance,
        params: ScheduleParams {
            max_alternative_slots,
            ..ScheduleParams::default()
        },
    };
    rt.block_on(run(env)).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn every_course_placed_once_without_conflicts(
        inst in arb_instance(),
        cap in prop::option::of(0usize..3),
    ) {
        let res = solve(inst.clone(), cap);

        prop_assert_eq!(res.assignments.len(), inst.courses.len());
        let ids: HashSet<_> = res.assignments.iter().map(|a| &a.course_id).collect();
        prop_assert_eq!(ids.len(), inst.courses.len());

        let mut cells = HashSet::new();
        let mut lecturer_slots = HashSet::new();
        for a in &res.assignments {
            prop_assert!(cells.insert((&a.timeslot, &a.room_id)));
            prop_assert!(lecturer_slots.insert((&a.lecturer_id, &a.timeslot)));
            let course = inst.courses.iter().find(|c| c.id == a.course_id).unwrap();
            let room = inst.rooms.iter().find(|r| r.id == a.room_id).unwrap();
            prop_assert!(room.capacity >= course.size);
        }

        prop_assert!(res.summary.kept_declared >= res.summary.kept_after_assignment);
        prop_assert_eq!(res.summary.repaired, res.summary.assignment_unscheduled);
        prop_assert_eq!(res.declared.len(), inst.courses.len());
    }

    #[test]
    fn reruns_are_identical(inst in arb_instance()) {
        let a = solve(inst.clone(), None);
        let b = solve(inst, None);
        prop_assert_eq!(a.summary.assignment_objective, b.summary.assignment_objective);
        prop_assert_eq!(a.assignments, b.assignments);
    }
}
