//! Phase 2: single-slot lectures, one class at a time.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use sched_core::{ConfigError, GenerationError, PlacementError, Topology};
use tracing::{debug, info};
use types::{Class, Day, Instance, LoadKey, TeacherId, TimetableEntry};

use crate::board::Board;

/// Per-day cap on one subject for each spreading pass; `None` is unrestricted.
pub const SPREAD_PASSES: [Option<u32>; 3] = [Some(1), Some(2), None];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LectureTask {
    pub key: LoadKey,
    pub hours: u32,
}

/// Theory tasks of one class, most-constrained teacher first.
pub fn lecture_tasks(
    inst: &Instance,
    class: &Class,
    allocations: &HashSet<LoadKey>,
    board: &Board,
) -> Result<Vec<LectureTask>, ConfigError> {
    let mut tasks = Vec::new();
    for load in &inst.weekly_loads {
        if load.class_id != class.id || load.weekly_theory_load == 0 {
            continue;
        }
        let key = load.key();
        if !allocations.contains(&key) {
            return Err(ConfigError::NoAllocation {
                key,
                class_name: class.name.clone(),
            });
        }
        tasks.push(LectureTask {
            key,
            hours: load.weekly_theory_load,
        });
    }
    // stable: equal busy-ness keeps snapshot order
    tasks.sort_by_cached_key(|t| Reverse(board.busy.busy_count(t.key.teacher)));
    Ok(tasks)
}

pub fn schedule_class_lectures(
    inst: &Instance,
    topo: &Topology,
    class: &Class,
    days: &[Day],
    limits: &HashMap<TeacherId, u32>,
    allocations: &HashSet<LoadKey>,
    board: &mut Board,
) -> Result<Vec<TimetableEntry>, GenerationError> {
    let lecture_slots = topo.lecture_slots(&class.name)?;
    let tasks = lecture_tasks(inst, class, allocations, board)?;
    let mut timetable = Vec::new();

    for task in &tasks {
        let teacher = task.key.teacher;
        let max_daily = limits.get(&teacher).copied();
        let mut per_day: HashMap<Day, u32> = HashMap::new();
        let mut placed = 0u32;

        'passes: for cap in SPREAD_PASSES {
            for &day in days {
                for &slot in lecture_slots {
                    if placed >= task.hours {
                        break 'passes;
                    }
                    let today = per_day.get(&day).copied().unwrap_or(0);
                    if cap.is_some_and(|c| today >= c) {
                        continue;
                    }
                    if board.class_has_entry(class.id, day, slot) {
                        continue;
                    }
                    if slot
                        .window()
                        .is_some_and(|w| board.busy.is_busy_in_window(teacher, day, w))
                    {
                        continue;
                    }
                    if board.busy.is_busy(teacher, day, slot) {
                        continue;
                    }
                    if max_daily.is_some_and(|m| board.lectures_on(teacher, day) >= m) {
                        continue;
                    }

                    let e = TimetableEntry {
                        day,
                        slot,
                        class_id: class.id,
                        subject_id: task.key.subject,
                        teacher_id: teacher,
                        batch_id: None,
                        is_lab: false,
                    };
                    board.record(&e);
                    timetable.push(e);
                    *per_day.entry(day).or_default() += 1;
                    placed += 1;
                }
            }
        }

        if placed < task.hours {
            return Err(PlacementError::LectureStuck {
                key: task.key,
                class_name: class.name.clone(),
                placed,
                required: task.hours,
            }
            .into());
        }
        debug!(
            class = %class.name,
            subject = %task.key.subject,
            teacher = %teacher,
            placed,
            "lectures placed"
        );
    }

    info!(class = %class.name, entries = timetable.len(), "generated lectures");
    Ok(timetable)
}
