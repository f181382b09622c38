use std::fmt;

use thiserror::Error;
use types::{BatchId, ClassId, LoadKey, TimetableEntry};

/// Missing or inconsistent input. Never retried.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("class {0} is not in the snapshot")]
    UnknownClass(ClassId),
    #[error("class {0:?} has no slot rule")]
    NoSlotRule(String),
    #[error("no batch allocation for practical load: {key} ({class_name})")]
    NoBatchAllocation { key: LoadKey, class_name: String },
    #[error("no theory allocation for lecture load: {key} ({class_name})")]
    NoAllocation { key: LoadKey, class_name: String },
}

/// The greedy ordering ran out of candidate slots for a task.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("lab placement failed: {key} ({class_name}), batch {batch}")]
    LabBlocked {
        key: LoadKey,
        class_name: String,
        batch: BatchId,
    },
    #[error("lecture placement stuck for {class_name}, {key}: placed {placed}/{required}")]
    LectureStuck {
        key: LoadKey,
        class_name: String,
        placed: u32,
        required: u32,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Rule {
    TeacherClash,
    SlotValidity,
    WeeklyLoad,
    DailyLimit,
    AllocationValidity,
    LabContinuity,
    ParallelBatch,
}

impl Rule {
    pub fn as_str(self) -> &'static str {
        match self {
            Rule::TeacherClash => "teacher_clash",
            Rule::SlotValidity => "slot_validity",
            Rule::WeeklyLoad => "weekly_load",
            Rule::DailyLimit => "daily_limit",
            Rule::AllocationValidity => "allocation_validity",
            Rule::LabContinuity => "lab_continuity",
            Rule::ParallelBatch => "parallel_batch",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hard constraint broken by a complete schedule.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{rule}: {message}")]
pub struct Violation {
    pub rule: Rule,
    pub message: String,
    pub entries: Vec<TimetableEntry>,
}

impl Violation {
    pub fn new(rule: Rule, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
            entries: Vec::new(),
        }
    }

    pub fn with_entries<'a>(mut self, entries: impl IntoIterator<Item = &'a TimetableEntry>) -> Self {
        self.entries.extend(entries.into_iter().cloned());
        self
    }
}

/// Outcome tag of a failed generation run. No variant leaves a partial schedule behind.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("placement exhausted: {0}")]
    Exhausted(#[from] PlacementError),
    #[error("validation failed: {0}")]
    Invalid(#[from] Violation),
    #[error("invalid snapshot: {0}")]
    Snapshot(String),
}

impl GenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Config(_) => "config",
            GenerationError::Exhausted(_) => "exhausted",
            GenerationError::Invalid(_) => "invalid",
            GenerationError::Snapshot(_) => "snapshot",
        }
    }
}
