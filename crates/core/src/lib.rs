pub mod diagnostics;
pub mod error;
pub mod scoring;
pub mod topology;
pub mod validate;

use std::collections::{HashMap, HashSet};

use thiserror::Error;

pub use error::{ConfigError, GenerationError, PlacementError, Rule, Violation};
pub use topology::Topology;
pub use types::{
    Allocation, Batch, BatchAllocation, Class, Instance, SolveEnvelope, SolveParams, SolveResult,
    Teacher, TimetableEntry, WeeklyLoad,
};
pub use validate::{validate_schedule, Constraints};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid snapshot: {0}")]
    Msg(String),
}

/// Referential integrity of a snapshot. Collects every problem before failing.
pub fn check_snapshot(inst: &Instance, topo: &Topology) -> Result<(), SnapshotError> {
    let mut errors: Vec<String> = Vec::new();

    fn chk_unique<I: ToString>(what: &str, ids: impl Iterator<Item = I>, errors: &mut Vec<String>) {
        let mut seen = HashSet::new();
        for id in ids {
            let s = id.to_string();
            if !seen.insert(s.clone()) {
                errors.push(format!("duplicate {what}: {s}"));
            }
        }
    }
    chk_unique("class id", inst.classes.iter().map(|x| x.id), &mut errors);
    chk_unique("teacher id", inst.teachers.iter().map(|x| x.id), &mut errors);
    chk_unique("subject id", inst.subjects.iter().map(|x| x.id), &mut errors);
    chk_unique("batch id", inst.batches.iter().map(|x| x.id), &mut errors);
    // loads and allocations are keyed by their triple
    chk_unique("weekly load", inst.weekly_loads.iter().map(|l| l.key()), &mut errors);
    chk_unique("allocation", inst.allocations.iter().map(|a| a.key()), &mut errors);
    chk_unique(
        "batch allocation",
        inst.batch_allocations
            .iter()
            .map(|b| format!("{}, batch {}", b.key(), b.batch_id)),
        &mut errors,
    );

    let classes: HashSet<_> = inst.classes.iter().map(|c| c.id).collect();
    let teachers: HashSet<_> = inst.teachers.iter().map(|t| t.id).collect();
    let subjects: HashSet<_> = inst.subjects.iter().map(|s| s.id).collect();
    let batch_class: HashMap<_, _> = inst.batches.iter().map(|b| (b.id, b.class_id)).collect();

    for c in &inst.classes {
        if !topo.has_class(&c.name) {
            errors.push(format!("class {} ({}) has no slot rule", c.id, c.name));
        }
    }
    for b in &inst.batches {
        if !classes.contains(&b.class_id) {
            errors.push(format!("batch {} references missing class {}", b.id, b.class_id));
        }
    }

    let keys = inst
        .weekly_loads
        .iter()
        .map(|l| ("weekly load", l.key()))
        .chain(inst.allocations.iter().map(|a| ("allocation", a.key())))
        .chain(inst.batch_allocations.iter().map(|b| ("batch allocation", b.key())))
        .collect::<Vec<_>>();
    for (what, key) in keys {
        if !teachers.contains(&key.teacher) {
            errors.push(format!("{what} references missing teacher {}", key.teacher));
        }
        if !classes.contains(&key.class) {
            errors.push(format!("{what} references missing class {}", key.class));
        }
        // subjects are optional in thin snapshots
        if !subjects.is_empty() && !subjects.contains(&key.subject) {
            errors.push(format!("{what} references missing subject {}", key.subject));
        }
    }

    for b in &inst.batch_allocations {
        match batch_class.get(&b.batch_id) {
            None if !inst.batches.is_empty() => {
                errors.push(format!("batch allocation references missing batch {}", b.batch_id));
            }
            Some(&owner) if owner != b.class_id => errors.push(format!(
                "batch {} belongs to class {}, not {}",
                b.batch_id, owner, b.class_id
            )),
            _ => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SnapshotError::Msg(errors.join("; ")))
    }
}

/// A schedule generation strategy over one snapshot.
pub trait Solver: Send + Sync + 'static {
    fn solve(&self, env: &SolveEnvelope) -> Result<SolveResult, GenerationError>;
}
