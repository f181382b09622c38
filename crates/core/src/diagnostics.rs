//! Pre-generation health report over a snapshot, plus a post-generation summary.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use types::{Day, Instance, SubjectId, TeacherId, TimetableEntry};

pub const LOW_DAILY_LIMIT: u32 = 4;
pub const OVERLOAD_HOURS: u32 = 20;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct TeacherLoad {
    pub teacher_id: TeacherId,
    pub name: String,
    pub theory: u32,
    pub practical: u32,
}

impl TeacherLoad {
    pub fn total(&self) -> u32 {
        self.theory.saturating_add(self.practical)
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Bottleneck {
    pub teacher_id: TeacherId,
    pub weekly_theory: u32,
    pub daily_limit: u32,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Diagnostics {
    pub low_daily_limits: Vec<TeacherId>,
    pub overloaded: Vec<TeacherLoad>,
    pub lab_subjects_without_batches: Vec<SubjectId>,
    pub theory_subjects_without_teachers: Vec<SubjectId>,
    pub batches_per_class: BTreeMap<String, usize>,
    pub bottlenecks: Vec<Bottleneck>,
    pub total_theory_hours: u32,
    pub total_practical_hours: u32,
}

impl Diagnostics {
    pub fn warning_count(&self) -> usize {
        [
            !self.overloaded.is_empty(),
            !self.lab_subjects_without_batches.is_empty()
                || !self.theory_subjects_without_teachers.is_empty(),
            !self.bottlenecks.is_empty(),
        ]
        .into_iter()
        .filter(|&w| w)
        .count()
    }
}

pub fn diagnose(inst: &Instance) -> Diagnostics {
    let mut d = Diagnostics::default();

    let mut loads: BTreeMap<TeacherId, (u32, u32)> = BTreeMap::new();
    for l in &inst.weekly_loads {
        let e = loads.entry(l.teacher_id).or_default();
        e.0 = e.0.saturating_add(l.weekly_theory_load);
        e.1 = e.1.saturating_add(l.weekly_practical_load);
        d.total_theory_hours = d.total_theory_hours.saturating_add(l.weekly_theory_load);
        d.total_practical_hours = d.total_practical_hours.saturating_add(l.weekly_practical_load);
    }

    for t in &inst.teachers {
        let (theory, practical) = loads.get(&t.id).copied().unwrap_or_default();
        if let Some(limit) = t.daily_limit() {
            if limit < LOW_DAILY_LIMIT {
                d.low_daily_limits.push(t.id);
            }
            if theory > limit.saturating_mul(2) {
                d.bottlenecks.push(Bottleneck {
                    teacher_id: t.id,
                    weekly_theory: theory,
                    daily_limit: limit,
                });
            }
        }
        if theory.saturating_add(practical) > OVERLOAD_HOURS {
            d.overloaded.push(TeacherLoad {
                teacher_id: t.id,
                name: t.name.clone(),
                theory,
                practical,
            });
        }
    }
    d.overloaded.sort_by(|a, b| b.total().cmp(&a.total()));
    d.bottlenecks.sort_by(|a, b| b.weekly_theory.cmp(&a.weekly_theory));

    let batch_subjects: HashSet<SubjectId> =
        inst.batch_allocations.iter().map(|b| b.subject_id).collect();
    let theory_subjects: HashSet<SubjectId> = inst.allocations.iter().map(|a| a.subject_id).collect();
    for s in &inst.subjects {
        if s.is_lab && !batch_subjects.contains(&s.id) {
            d.lab_subjects_without_batches.push(s.id);
        } else if !s.is_lab && !theory_subjects.contains(&s.id) {
            d.theory_subjects_without_teachers.push(s.id);
        }
    }

    for c in &inst.classes {
        let n = inst.batches.iter().filter(|b| b.class_id == c.id).count();
        d.batches_per_class.insert(c.name.clone(), n);
    }

    d
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct ScheduleSummary {
    pub total: usize,
    pub labs: usize,
    pub lectures: usize,
    pub per_class: BTreeMap<String, usize>,
    pub per_day: BTreeMap<Day, usize>,
}

impl ScheduleSummary {
    pub fn of(inst: &Instance, entries: &[TimetableEntry]) -> Self {
        let mut s = ScheduleSummary {
            total: entries.len(),
            ..Default::default()
        };
        for e in entries {
            if e.is_lab {
                s.labs += 1;
            } else {
                s.lectures += 1;
            }
            let name = inst
                .class_name(e.class_id)
                .map_or_else(|| e.class_id.to_string(), str::to_string);
            *s.per_class.entry(name).or_default() += 1;
            *s.per_day.entry(e.day).or_default() += 1;
        }
        s
    }
}
