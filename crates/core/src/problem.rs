use std::collections::HashMap;

use types::{Course, Instance, Lecturer, Room, TimeSlot};

use crate::preference::{lecturer_seed, preference_vector};
use crate::{validate, ValidationError};

/// Dense, index-addressed view over a validated instance.
///
/// Courses, rooms, slots and lecturers are referred to by their position in
/// the instance vectors. Course order for anything that must be reproducible
/// comes from [`Problem::course_order`] (ascending course id), never from a
/// hash map.
pub struct Problem<'a> {
    pub inst: &'a Instance,
    preferences: Vec<Vec<f64>>,
    course_lecturer: Vec<usize>,
    courses_by_lecturer: Vec<Vec<usize>>,
    course_order: Vec<usize>,
    slot_day: Vec<u32>,
    slot_period: Vec<u32>,
    day_stride: u32,
}

impl<'a> Problem<'a> {
    /// Validates `inst` and builds the index. Lecturers without an explicit
    /// preference vector get one derived from their archetype and `seed`.
    pub fn new(inst: &'a Instance, seed: u64) -> Result<Self, ValidationError> {
        validate(inst)?;

        let idx_lecturer: HashMap<&str, usize> = inst
            .lecturers
            .iter()
            .enumerate()
            .map(|(i, l)| (l.id.0.as_str(), i))
            .collect();

        let mut course_lecturer = Vec::with_capacity(inst.courses.len());
        for c in &inst.courses {
            let li = idx_lecturer.get(c.lecturer_id.0.as_str()).copied().ok_or_else(|| {
                ValidationError::Msg(format!(
                    "course {} references missing lecturer {}",
                    c.id, c.lecturer_id
                ))
            })?;
            course_lecturer.push(li);
        }

        let mut course_order: Vec<usize> = (0..inst.courses.len()).collect();
        course_order.sort_by(|&a, &b| inst.courses[a].id.cmp(&inst.courses[b].id));

        let mut courses_by_lecturer = vec![Vec::new(); inst.lecturers.len()];
        for &ci in &course_order {
            courses_by_lecturer[course_lecturer[ci]].push(ci);
        }

        let preferences = inst
            .lecturers
            .iter()
            .map(|l| {
                if l.preferences.is_empty() {
                    preference_vector(
                        l.archetype,
                        &inst.timeslots,
                        l.noise,
                        lecturer_seed(seed, &l.id),
                    )
                } else {
                    l.preferences.clone()
                }
            })
            .collect();

        let slot_day = inst.timeslots.iter().map(|t| t.day.ordinal()).collect();
        let slot_period: Vec<u32> = inst.timeslots.iter().map(|t| t.period).collect();
        let day_stride = slot_period.iter().copied().max().unwrap_or(0) + 1;

        Ok(Self {
            inst,
            preferences,
            course_lecturer,
            courses_by_lecturer,
            course_order,
            slot_day,
            slot_period,
            day_stride,
        })
    }

    pub fn slot_count(&self) -> usize {
        self.inst.timeslots.len()
    }

    pub fn room_count(&self) -> usize {
        self.inst.rooms.len()
    }

    pub fn course_count(&self) -> usize {
        self.inst.courses.len()
    }

    pub fn lecturer_count(&self) -> usize {
        self.inst.lecturers.len()
    }

    pub fn course(&self, c: usize) -> &'a Course {
        &self.inst.courses[c]
    }

    pub fn room(&self, r: usize) -> &'a Room {
        &self.inst.rooms[r]
    }

    pub fn slot(&self, t: usize) -> &'a TimeSlot {
        &self.inst.timeslots[t]
    }

    pub fn lecturer(&self, l: usize) -> &'a Lecturer {
        &self.inst.lecturers[l]
    }

    pub fn lecturer_of(&self, c: usize) -> usize {
        self.course_lecturer[c]
    }

    /// Utility per slot for lecturer `l`, resolved from the archetype when
    /// the instance carried none.
    pub fn preferences(&self, l: usize) -> &[f64] {
        &self.preferences[l]
    }

    /// Lecturer `l`'s courses in ascending id order.
    pub fn courses_of(&self, l: usize) -> &[usize] {
        &self.courses_by_lecturer[l]
    }

    /// All courses in ascending id order.
    pub fn course_order(&self) -> &[usize] {
        &self.course_order
    }

    pub fn slot_day(&self, t: usize) -> u32 {
        self.slot_day[t]
    }

    /// Ordinal distance between two slots. Symmetric; any change of day
    /// weighs more than any move within a day.
    pub fn slot_distance(&self, a: usize, b: usize) -> u32 {
        let days = self.slot_day[a].abs_diff(self.slot_day[b]);
        let periods = self.slot_period[a].abs_diff(self.slot_period[b]);
        days * self.day_stride + periods
    }

    pub fn largest_room(&self) -> u32 {
        self.inst.rooms.iter().map(|r| r.capacity).max().unwrap_or(0)
    }
}
