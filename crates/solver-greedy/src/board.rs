use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use types::{ClassId, Day, LabWindow, Slot, TeacherId, TimetableEntry};

/// Global `(day, slot) -> teachers` occupancy. The only source of teacher availability
/// during a run; lab and lecture phases mutate it in turn.
#[derive(Clone, Debug, Default)]
pub struct TeacherBusyMap {
    slots: BTreeMap<(Day, Slot), BTreeSet<TeacherId>>,
}

impl TeacherBusyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self, teacher: TeacherId, day: Day, slot: Slot) -> bool {
        self.slots
            .get(&(day, slot))
            .is_some_and(|ts| ts.contains(&teacher))
    }

    pub fn is_busy_in_window(&self, teacher: TeacherId, day: Day, window: LabWindow) -> bool {
        window
            .slots()
            .into_iter()
            .any(|s| self.is_busy(teacher, day, s))
    }

    pub fn mark(&mut self, teacher: TeacherId, day: Day, slot: Slot) {
        self.slots.entry((day, slot)).or_default().insert(teacher);
    }

    /// Number of `(day, slot)` keys already holding this teacher.
    pub fn busy_count(&self, teacher: TeacherId) -> usize {
        self.slots.values().filter(|ts| ts.contains(&teacher)).count()
    }
}

/// Mutable state shared by both placement phases of one generation run.
#[derive(Clone, Debug, Default)]
pub struct Board {
    pub busy: TeacherBusyMap,
    daily_lectures: HashMap<(TeacherId, Day), u32>,
    class_slots: HashSet<(ClassId, Day, Slot)>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing availability map, e.g. commitments outside this run.
    pub fn with_busy(busy: TeacherBusyMap) -> Self {
        Self {
            busy,
            ..Self::default()
        }
    }

    pub fn lectures_on(&self, teacher: TeacherId, day: Day) -> u32 {
        self.daily_lectures
            .get(&(teacher, day))
            .copied()
            .unwrap_or(0)
    }

    pub fn class_has_entry(&self, class: ClassId, day: Day, slot: Slot) -> bool {
        self.class_slots.contains(&(class, day, slot))
    }

    pub fn record(&mut self, e: &TimetableEntry) {
        self.busy.mark(e.teacher_id, e.day, e.slot);
        self.class_slots.insert((e.class_id, e.day, e.slot));
        if !e.is_lab {
            *self.daily_lectures.entry((e.teacher_id, e.day)).or_default() += 1;
        }
    }
}
