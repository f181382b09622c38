use std::collections::{BTreeMap, HashMap, HashSet};

use types::{BatchId, ClassId, Day, FitnessPolicy, Slot, SubjectId, TeacherId, TimetableEntry};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fitness {
    /// Entries that land on an already-taken (teacher, day, slot).
    pub teacher_clashes: i64,
    /// Lab sessions above the per-class daily threshold, summed over (class, day).
    pub excess_labs: i64,
    /// Subjects seen on fewer than the minimum number of days.
    pub narrow_subjects: i64,
    pub score: i64,
}

/// Soft score of a candidate schedule. Higher is better, never below zero.
pub fn compute_fitness(entries: &[TimetableEntry], policy: &FitnessPolicy) -> Fitness {
    let mut taken: HashSet<(TeacherId, Day, Slot)> = HashSet::new();
    let mut teacher_clashes = 0i64;
    for e in entries {
        if !taken.insert((e.teacher_id, e.day, e.slot)) {
            teacher_clashes += 1;
        }
    }

    let mut sessions: HashMap<(ClassId, Day), HashSet<(Slot, Option<BatchId>, SubjectId, TeacherId)>> =
        HashMap::new();
    for e in entries.iter().filter(|e| e.is_lab) {
        let start = e.slot.window().map_or(e.slot, |w| w.slots()[0]);
        sessions
            .entry((e.class_id, e.day))
            .or_default()
            .insert((start, e.batch_id, e.subject_id, e.teacher_id));
    }
    let threshold = policy.labs_per_day_threshold as usize;
    let excess_labs: i64 = sessions
        .values()
        .map(|s| s.len().saturating_sub(threshold) as i64)
        .sum();

    let mut subject_days: BTreeMap<SubjectId, HashSet<Day>> = BTreeMap::new();
    for e in entries {
        subject_days.entry(e.subject_id).or_default().insert(e.day);
    }
    let narrow_subjects = subject_days
        .values()
        .filter(|days| days.len() < policy.min_spread_days)
        .count() as i64;

    let raw = policy.baseline
        - policy.clash_penalty * teacher_clashes
        - policy.lab_overflow_penalty * excess_labs
        - policy.spread_penalty * narrow_subjects;

    Fitness {
        teacher_clashes,
        excess_labs,
        narrow_subjects,
        score: raw.max(0),
    }
}
