use std::collections::BTreeMap;
use thiserror::Error;

/// A committed (course, slot, room) choice, in problem indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub course: usize,
    pub lecturer: usize,
    pub slot: usize,
    pub room: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Clash {
    #[error("room already hosts course #{0}")]
    Room(usize),
    #[error("lecturer already teaches course #{0} in this slot")]
    Lecturer(usize),
    #[error("course is already placed")]
    Course,
}

/// Who sits where. Grows monotonically: the assignment stage seeds it and
/// the repair stage extends it; nothing is ever removed.
#[derive(Clone, Debug, Default)]
pub struct OccupancyState {
    rooms: BTreeMap<(usize, usize), usize>,
    lecturers: BTreeMap<(usize, usize), usize>,
    courses: BTreeMap<usize, Placement>,
}

impl OccupancyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room_occupant(&self, slot: usize, room: usize) -> Option<usize> {
        self.rooms.get(&(slot, room)).copied()
    }

    pub fn lecturer_busy(&self, lecturer: usize, slot: usize) -> bool {
        self.lecturers.contains_key(&(lecturer, slot))
    }

    pub fn is_placed(&self, course: usize) -> bool {
        self.courses.contains_key(&course)
    }

    pub fn is_free(&self, lecturer: usize, slot: usize, room: usize) -> bool {
        !self.rooms.contains_key(&(slot, room)) && !self.lecturer_busy(lecturer, slot)
    }

    pub fn commit(&mut self, p: Placement) -> Result<(), Clash> {
        if self.courses.contains_key(&p.course) {
            return Err(Clash::Course);
        }
        if let Some(&other) = self.rooms.get(&(p.slot, p.room)) {
            return Err(Clash::Room(other));
        }
        if let Some(&other) = self.lecturers.get(&(p.lecturer, p.slot)) {
            return Err(Clash::Lecturer(other));
        }
        self.rooms.insert((p.slot, p.room), p.course);
        self.lecturers.insert((p.lecturer, p.slot), p.course);
        self.courses.insert(p.course, p);
        Ok(())
    }

    pub fn placement(&self, course: usize) -> Option<&Placement> {
        self.courses.get(&course)
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}
