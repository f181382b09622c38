use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            Serialize,
            Deserialize,
            JsonSchema,
            Eq,
            PartialEq,
            Hash,
            Ord,
            PartialOrd,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}
id_newtype!(TeacherId);
id_newtype!(SubjectId);
id_newtype!(ClassId);
id_newtype!(BatchId);

/// Teaching day. Declaration order is the week order used by every scheduler.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Hash, Ord, PartialOrd,
)]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
}

impl Day {
    pub const ALL: [Day; 5] = [Day::Mon, Day::Tue, Day::Wed, Day::Thu, Day::Fri];

    pub fn as_str(self) -> &'static str {
        match self {
            Day::Mon => "Mon",
            Day::Tue => "Tue",
            Day::Wed => "Wed",
            Day::Thu => "Thu",
            Day::Fri => "Fri",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the six hourly slots of a teaching day, numbered 1..=6.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Hash, Ord, PartialOrd,
)]
#[serde(transparent)]
pub struct Slot(pub u8);

impl Slot {
    pub const ALL: [Slot; 6] = [Slot(1), Slot(2), Slot(3), Slot(4), Slot(5), Slot(6)];

    /// Wall-clock interval of the slot as `(start, end)`.
    pub fn wall_clock(self) -> Option<(&'static str, &'static str)> {
        match self.0 {
            1 => Some(("08:30", "09:30")),
            2 => Some(("09:30", "10:30")),
            3 => Some(("10:45", "11:45")),
            4 => Some(("11:45", "12:45")),
            5 => Some(("13:30", "14:30")),
            6 => Some(("14:30", "15:30")),
            _ => None,
        }
    }

    pub fn window(self) -> Option<LabWindow> {
        LabWindow::containing(self)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Fixed two-slot lab window.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Hash, Ord, PartialOrd,
)]
#[serde(rename_all = "lowercase")]
pub enum LabWindow {
    Morning,
    Midday,
    Afternoon,
}

impl LabWindow {
    pub const ALL: [LabWindow; 3] = [LabWindow::Morning, LabWindow::Midday, LabWindow::Afternoon];

    pub fn slots(self) -> [Slot; 2] {
        match self {
            LabWindow::Morning => [Slot(1), Slot(2)],
            LabWindow::Midday => [Slot(3), Slot(4)],
            LabWindow::Afternoon => [Slot(5), Slot(6)],
        }
    }

    pub fn containing(slot: Slot) -> Option<LabWindow> {
        match slot.0 {
            1 | 2 => Some(LabWindow::Morning),
            3 | 4 => Some(LabWindow::Midday),
            5 | 6 => Some(LabWindow::Afternoon),
            _ => None,
        }
    }

    pub fn wall_clock(self) -> (&'static str, &'static str) {
        match self {
            LabWindow::Morning => ("08:30", "10:30"),
            LabWindow::Midday => ("10:45", "12:45"),
            LabWindow::Afternoon => ("13:30", "15:30"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct Class {
    pub id: ClassId,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    /// Zero or absent means no daily cap.
    #[serde(default)]
    pub max_lectures_per_day: Option<u32>,
}

impl Teacher {
    pub fn daily_limit(&self) -> Option<u32> {
        self.max_lectures_per_day.filter(|&n| n > 0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    #[serde(default)]
    pub is_lab: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct Batch {
    pub id: BatchId,
    pub class_id: ClassId,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct WeeklyLoad {
    pub teacher_id: TeacherId,
    pub subject_id: SubjectId,
    pub class_id: ClassId,
    #[serde(default)]
    pub weekly_theory_load: u32,
    #[serde(default)]
    pub weekly_practical_load: u32,
}

impl WeeklyLoad {
    pub fn key(&self) -> LoadKey {
        LoadKey {
            teacher: self.teacher_id,
            subject: self.subject_id,
            class: self.class_id,
        }
    }
}

/// `(teacher, subject, class)` triple that keys weekly loads and theory allocations.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct LoadKey {
    pub teacher: TeacherId,
    pub subject: SubjectId,
    pub class: ClassId,
}

impl fmt::Display for LoadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "teacher {}, subject {}, class {}",
            self.teacher, self.subject, self.class
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct Allocation {
    pub teacher_id: TeacherId,
    pub subject_id: SubjectId,
    pub class_id: ClassId,
}

impl Allocation {
    pub fn key(&self) -> LoadKey {
        LoadKey {
            teacher: self.teacher_id,
            subject: self.subject_id,
            class: self.class_id,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct BatchAllocation {
    pub teacher_id: TeacherId,
    pub subject_id: SubjectId,
    pub class_id: ClassId,
    pub batch_id: BatchId,
}

impl BatchAllocation {
    pub fn key(&self) -> LoadKey {
        LoadKey {
            teacher: self.teacher_id,
            subject: self.subject_id,
            class: self.class_id,
        }
    }
}

/// Per-class slot rule: the lecture whitelist and the lab windows in preference order.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct ClassSlotRule {
    pub class_name: String,
    pub lab_priority: Vec<LabWindow>,
    pub lecture_slots: Vec<Slot>,
}

/// Read-only snapshot handed over by the persistence boundary for one run.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct Instance {
    pub classes: Vec<Class>,
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub batches: Vec<Batch>,
    pub weekly_loads: Vec<WeeklyLoad>,
    #[serde(default)]
    pub allocations: Vec<Allocation>,
    #[serde(default)]
    pub batch_allocations: Vec<BatchAllocation>,
    /// Overrides the standard slot table when non-empty.
    #[serde(default)]
    pub slot_rules: Vec<ClassSlotRule>,
}

impl Instance {
    pub fn class_name(&self, id: ClassId) -> Option<&str> {
        self.classes
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
    }
}

/// One placed hour of the weekly schedule. A lab session is two entries, one per window slot.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Hash)]
pub struct TimetableEntry {
    pub day: Day,
    pub slot: Slot,
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    #[serde(default)]
    pub batch_id: Option<BatchId>,
    pub is_lab: bool,
}

impl TimetableEntry {
    pub fn key(&self) -> LoadKey {
        LoadKey {
            teacher: self.teacher_id,
            subject: self.subject_id,
            class: self.class_id,
        }
    }

    /// Persistence row. Lab entries carry the wall-clock span of their whole window.
    pub fn to_row(&self) -> Option<ScheduleRow> {
        let (start, end) = if self.is_lab {
            self.slot.window()?.wall_clock()
        } else {
            self.slot.wall_clock()?
        };
        Some(ScheduleRow {
            class_id: self.class_id,
            subject_id: self.subject_id,
            teacher_id: self.teacher_id,
            batch_id: self.batch_id,
            is_lab: self.is_lab,
            day: self.day,
            start_time: start.to_string(),
            end_time: end.to_string(),
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
pub struct ScheduleRow {
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    pub batch_id: Option<BatchId>,
    pub is_lab: bool,
    pub day: Day,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    #[default]
    Greedy,
    Fitness,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct FitnessPolicy {
    #[serde(default = "FitnessPolicy::default_baseline")]
    pub baseline: i64,
    #[serde(default = "FitnessPolicy::default_clash_penalty")]
    pub clash_penalty: i64,
    #[serde(default = "FitnessPolicy::default_lab_threshold")]
    pub labs_per_day_threshold: u32,
    #[serde(default = "FitnessPolicy::default_lab_penalty")]
    pub lab_overflow_penalty: i64,
    #[serde(default = "FitnessPolicy::default_spread_penalty")]
    pub spread_penalty: i64,
    #[serde(default = "FitnessPolicy::default_min_days")]
    pub min_spread_days: usize,
}

impl FitnessPolicy {
    fn default_baseline() -> i64 {
        1000
    }
    fn default_clash_penalty() -> i64 {
        300
    }
    fn default_lab_threshold() -> u32 {
        2
    }
    fn default_lab_penalty() -> i64 {
        50
    }
    fn default_spread_penalty() -> i64 {
        20
    }
    fn default_min_days() -> usize {
        2
    }
}

impl Default for FitnessPolicy {
    fn default() -> Self {
        Self {
            baseline: Self::default_baseline(),
            clash_penalty: Self::default_clash_penalty(),
            labs_per_day_threshold: Self::default_lab_threshold(),
            lab_overflow_penalty: Self::default_lab_penalty(),
            spread_penalty: Self::default_spread_penalty(),
            min_spread_days: Self::default_min_days(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct SolveParams {
    #[serde(default)]
    pub solver: SolverKind,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "SolveParams::default_population")]
    pub population: usize,
    #[serde(default = "SolveParams::default_generations")]
    pub generations: usize,
    #[serde(default = "SolveParams::default_mutation_rate")]
    pub mutation_rate: f64,
    #[serde(default)]
    pub fitness: FitnessPolicy,
}

impl SolveParams {
    fn default_population() -> usize {
        30
    }
    fn default_generations() -> usize {
        50
    }
    fn default_mutation_rate() -> f64 {
        0.2
    }
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            solver: SolverKind::default(),
            seed: 0,
            population: Self::default_population(),
            generations: Self::default_generations(),
            mutation_rate: Self::default_mutation_rate(),
            fitness: FitnessPolicy::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct SolveEnvelope {
    pub instance: Instance,
    #[serde(default)]
    pub params: SolveParams,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct SolveResult {
    pub status: String,
    pub entries: Vec<TimetableEntry>,
    #[serde(default)]
    pub fitness: Option<i64>,
    pub stats: serde_json::Value,
}

impl SolveResult {
    /// One row per entry; `None` if any entry sits outside the slot grid.
    pub fn rows(&self) -> Option<Vec<ScheduleRow>> {
        self.entries.iter().map(TimetableEntry::to_row).collect()
    }
}
