//! Phase 1: every lab session of every class, placed before any lecture.

use std::collections::{HashMap, HashSet};

use sched_core::{ConfigError, GenerationError, PlacementError, Topology};
use tracing::{debug, info};
use types::{BatchId, ClassId, Day, Instance, LabWindow, LoadKey, SubjectId, TimetableEntry};

use crate::board::Board;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabTask {
    pub key: LoadKey,
    pub batch: BatchId,
}

/// One task per practical hour, batches assigned round-robin, ordered by (teacher, class).
pub fn expand_lab_tasks(inst: &Instance) -> Result<Vec<LabTask>, ConfigError> {
    let mut batches: HashMap<LoadKey, Vec<BatchId>> = HashMap::new();
    for b in &inst.batch_allocations {
        batches.entry(b.key()).or_default().push(b.batch_id);
    }

    let mut tasks = Vec::new();
    for load in inst.weekly_loads.iter().filter(|l| l.weekly_practical_load > 0) {
        let key = load.key();
        let class_name = inst
            .class_name(key.class)
            .ok_or(ConfigError::UnknownClass(key.class))?;
        let allocated = match batches.get(&key) {
            Some(b) if !b.is_empty() => b,
            _ => {
                return Err(ConfigError::NoBatchAllocation {
                    key,
                    class_name: class_name.to_string(),
                })
            }
        };
        for i in 0..load.weekly_practical_load as usize {
            tasks.push(LabTask {
                key,
                batch: allocated[i % allocated.len()],
            });
        }
    }

    tasks.sort_by_key(|t| (t.key.teacher, t.key.class));
    Ok(tasks)
}

pub fn schedule_labs(
    inst: &Instance,
    topo: &Topology,
    days: &[Day],
    board: &mut Board,
) -> Result<Vec<TimetableEntry>, GenerationError> {
    let tasks = expand_lab_tasks(inst)?;
    info!(sessions = tasks.len(), "generating labs");

    let mut timetable = Vec::with_capacity(tasks.len() * 2);
    // (day, class, window) -> subjects already running in parallel there
    let mut parallel: HashMap<(Day, ClassId, LabWindow), HashSet<SubjectId>> = HashMap::new();
    let mut used_days: HashSet<(LoadKey, Day)> = HashSet::new();

    for task in &tasks {
        let class_name = inst
            .class_name(task.key.class)
            .ok_or(ConfigError::UnknownClass(task.key.class))?;
        let windows = topo.lab_windows(class_name)?;

        let spot = windows.iter().find_map(|&window| {
            days.iter().copied().find(|&day| {
                if used_days.contains(&(task.key, day)) {
                    return false;
                }
                if board.busy.is_busy_in_window(task.key.teacher, day, window) {
                    return false;
                }
                !parallel
                    .get(&(day, task.key.class, window))
                    .is_some_and(|subjects| subjects.contains(&task.key.subject))
            })
            .map(|day| (window, day))
        });

        let Some((window, day)) = spot else {
            return Err(PlacementError::LabBlocked {
                key: task.key,
                class_name: class_name.to_string(),
                batch: task.batch,
            }
            .into());
        };

        for slot in window.slots() {
            let e = TimetableEntry {
                day,
                slot,
                class_id: task.key.class,
                subject_id: task.key.subject,
                teacher_id: task.key.teacher,
                batch_id: Some(task.batch),
                is_lab: true,
            };
            board.record(&e);
            timetable.push(e);
        }
        parallel
            .entry((day, task.key.class, window))
            .or_default()
            .insert(task.key.subject);
        used_days.insert((task.key, day));
        debug!(
            teacher = %task.key.teacher,
            subject = %task.key.subject,
            class = class_name,
            batch = %task.batch,
            %day,
            ?window,
            "lab placed"
        );
    }

    info!(entries = timetable.len(), "generated lab entries");
    Ok(timetable)
}
