//! Hard-constraint checks over a complete schedule.
//!
//! Every check is independent of the schedulers: it sees only the finished
//! entries and the snapshot-derived [`Constraints`]. [`validate_schedule`]
//! runs them in a fixed order and stops at the first broken rule.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{debug, info, warn};
use types::{BatchId, ClassId, Day, Instance, LabWindow, LoadKey, Slot, SubjectId, TeacherId, TimetableEntry};

use crate::error::{Rule, Violation};
use crate::topology::Topology;

/// Snapshot maps the checks consult.
#[derive(Clone, Debug, Default)]
pub struct Constraints {
    pub loads: HashMap<LoadKey, (u32, u32)>,
    pub daily_limits: HashMap<TeacherId, u32>,
    pub allocations: HashSet<LoadKey>,
    pub batch_allocations: HashSet<(LoadKey, BatchId)>,
    pub lecture_slots: HashMap<ClassId, Vec<Slot>>,
}

impl Constraints {
    pub fn from_instance(inst: &Instance, topo: &Topology) -> Self {
        let loads = inst
            .weekly_loads
            .iter()
            .map(|l| (l.key(), (l.weekly_theory_load, l.weekly_practical_load)))
            .collect();
        let daily_limits = inst
            .teachers
            .iter()
            .filter_map(|t| t.daily_limit().map(|n| (t.id, n)))
            .collect();
        let allocations = inst.allocations.iter().map(|a| a.key()).collect();
        let batch_allocations = inst
            .batch_allocations
            .iter()
            .map(|b| (b.key(), b.batch_id))
            .collect();
        let lecture_slots = inst
            .classes
            .iter()
            .filter_map(|c| {
                topo.lecture_slots(&c.name)
                    .ok()
                    .map(|slots| (c.id, slots.to_vec()))
            })
            .collect();
        Self {
            loads,
            daily_limits,
            allocations,
            batch_allocations,
            lecture_slots,
        }
    }
}

/// Slots an entry keeps its teacher occupied for.
fn occupied_slots(e: &TimetableEntry) -> BTreeSet<Slot> {
    match (e.is_lab, e.slot.window()) {
        (true, Some(w)) => w.slots().into_iter().collect(),
        _ => BTreeSet::from([e.slot]),
    }
}

/// No teacher in two overlapping entries of different classes on the same day.
pub fn check_teacher_clash(entries: &[TimetableEntry]) -> Result<(), Violation> {
    let mut by_teacher_day: BTreeMap<(TeacherId, Day), Vec<&TimetableEntry>> = BTreeMap::new();
    for e in entries {
        by_teacher_day.entry((e.teacher_id, e.day)).or_default().push(e);
    }

    for ((teacher, day), group) in &by_teacher_day {
        for (i, a) in group.iter().enumerate() {
            let sa = occupied_slots(a);
            for b in &group[i + 1..] {
                if a.class_id == b.class_id {
                    continue;
                }
                let sb = occupied_slots(b);
                if let Some(s) = sa.intersection(&sb).next() {
                    return Err(Violation::new(
                        Rule::TeacherClash,
                        format!(
                            "teacher {teacher} on {day} at slot {s} in classes {} and {}",
                            a.class_id, b.class_id
                        ),
                    )
                    .with_entries([*a, *b]));
                }
            }
        }
    }
    Ok(())
}

pub fn check_slot_validity(entries: &[TimetableEntry], ctx: &Constraints) -> Result<(), Violation> {
    for e in entries {
        let ok = if e.is_lab {
            e.slot.window().is_some()
        } else {
            ctx.lecture_slots
                .get(&e.class_id)
                .is_some_and(|slots| slots.contains(&e.slot))
        };
        if !ok {
            let what = if e.is_lab { "lab" } else { "lecture" };
            return Err(Violation::new(
                Rule::SlotValidity,
                format!("{what} of class {} on {} in invalid slot {}", e.class_id, e.day, e.slot),
            )
            .with_entries([e]));
        }
    }
    Ok(())
}

/// Lectures count per slot, labs once per distinct session.
pub fn check_weekly_load(entries: &[TimetableEntry], ctx: &Constraints) -> Result<(), Violation> {
    let mut used: BTreeMap<LoadKey, (u32, u32)> = BTreeMap::new();
    let mut seen_sessions: HashSet<(Day, Option<LabWindow>, LoadKey)> = HashSet::new();

    for e in entries {
        let key = e.key();
        let u = used.entry(key).or_default();
        if e.is_lab {
            if seen_sessions.insert((e.day, e.slot.window(), key)) {
                u.1 += 1;
            }
        } else {
            u.0 += 1;
        }
    }

    for (key, (theory, practical)) in used {
        let Some(&(allowed_theory, allowed_practical)) = ctx.loads.get(&key) else {
            return Err(Violation::new(
                Rule::WeeklyLoad,
                format!("no weekly load configured for {key}"),
            )
            .with_entries(entries.iter().filter(|e| e.key() == key)));
        };
        if practical > allowed_practical {
            return Err(Violation::new(
                Rule::WeeklyLoad,
                format!("practical overload for {key}: used {practical}, allowed {allowed_practical}"),
            ));
        }
        if theory > allowed_theory {
            return Err(Violation::new(
                Rule::WeeklyLoad,
                format!("theory overload for {key}: used {theory}, allowed {allowed_theory}"),
            ));
        }
    }
    Ok(())
}

/// Lecture cap per teacher per day. Labs are exempt.
pub fn check_daily_limits(entries: &[TimetableEntry], ctx: &Constraints) -> Result<(), Violation> {
    let mut lectures: BTreeMap<(TeacherId, Day), u32> = BTreeMap::new();
    for e in entries.iter().filter(|e| !e.is_lab) {
        *lectures.entry((e.teacher_id, e.day)).or_default() += 1;
    }
    for ((teacher, day), count) in lectures {
        if let Some(&max) = ctx.daily_limits.get(&teacher) {
            if count > max {
                return Err(Violation::new(
                    Rule::DailyLimit,
                    format!("teacher {teacher} has {count} lectures on {day}, limit {max}"),
                ));
            }
        }
    }
    Ok(())
}

pub fn check_allocation_validity(
    entries: &[TimetableEntry],
    ctx: &Constraints,
) -> Result<(), Violation> {
    for e in entries {
        let ok = match (e.is_lab, e.batch_id) {
            (true, Some(b)) => ctx.batch_allocations.contains(&(e.key(), b)),
            (true, None) => false,
            (false, _) => ctx.allocations.contains(&e.key()),
        };
        if !ok {
            return Err(Violation::new(
                Rule::AllocationValidity,
                format!("entry on {} slot {} is not allocated: {}", e.day, e.slot, e.key()),
            )
            .with_entries([e]));
        }
    }
    Ok(())
}

/// Each lab group's slots split into canonical adjacent window pairs.
pub fn check_lab_continuity(entries: &[TimetableEntry]) -> Result<(), Violation> {
    let mut labs: BTreeMap<(Day, ClassId, Option<BatchId>, SubjectId), BTreeSet<Slot>> =
        BTreeMap::new();
    for e in entries.iter().filter(|e| e.is_lab) {
        labs.entry((e.day, e.class_id, e.batch_id, e.subject_id))
            .or_default()
            .insert(e.slot);
    }

    for ((day, class, batch, subject), slots) in labs {
        let slots: Vec<Slot> = slots.into_iter().collect();
        let group = || {
            format!(
                "class {class}, batch {}, subject {subject} on {day}",
                batch.map_or_else(|| "-".to_string(), |b| b.to_string())
            )
        };
        if slots.len() % 2 != 0 {
            return Err(Violation::new(
                Rule::LabContinuity,
                format!("odd number of lab slots for {}", group()),
            ));
        }
        for pair in slots.chunks(2) {
            let (a, b) = (pair[0], pair[1]);
            let canonical = a.window().map(LabWindow::slots);
            if b.0 != a.0 + 1 || canonical != Some([a, b]) {
                return Err(Violation::new(
                    Rule::LabContinuity,
                    format!("slots {a},{b} do not form a lab window for {}", group()),
                ));
            }
        }
    }
    Ok(())
}

/// One batch per (subject, teacher) inside a day/class/window.
pub fn check_parallel_batches(entries: &[TimetableEntry]) -> Result<(), Violation> {
    let mut windows: BTreeMap<(Day, ClassId, Option<LabWindow>), HashMap<(SubjectId, TeacherId), &TimetableEntry>> =
        BTreeMap::new();

    for e in entries.iter().filter(|e| e.is_lab) {
        let seen = windows
            .entry((e.day, e.class_id, e.slot.window()))
            .or_default();
        match seen.get(&(e.subject_id, e.teacher_id)) {
            Some(prev) if prev.batch_id != e.batch_id => {
                return Err(Violation::new(
                    Rule::ParallelBatch,
                    format!(
                        "teacher {} runs subject {} for two batches of class {} on {}",
                        e.teacher_id, e.subject_id, e.class_id, e.day
                    ),
                )
                .with_entries([*prev, e]));
            }
            Some(_) => {}
            None => {
                seen.insert((e.subject_id, e.teacher_id), e);
            }
        }
    }
    Ok(())
}

fn run_checks(entries: &[TimetableEntry], ctx: &Constraints) -> Result<(), Violation> {
    check_teacher_clash(entries)?;
    debug!("no teacher clashes");
    check_slot_validity(entries, ctx)?;
    debug!("all slots valid");
    check_weekly_load(entries, ctx)?;
    debug!("weekly loads within limits");
    check_daily_limits(entries, ctx)?;
    debug!("daily limits satisfied");
    check_allocation_validity(entries, ctx)?;
    debug!("all allocations valid");
    check_lab_continuity(entries)?;
    debug!("lab continuity valid");
    check_parallel_batches(entries)
}

pub fn validate_schedule(entries: &[TimetableEntry], ctx: &Constraints) -> Result<(), Violation> {
    let result = run_checks(entries, ctx);
    match &result {
        Ok(()) => info!(entries = entries.len(), "all constraints passed"),
        Err(v) => warn!(rule = %v.rule, message = %v.message, "constraint violated"),
    }
    result
}
