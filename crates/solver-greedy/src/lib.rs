pub mod board;
pub mod labs;
pub mod lectures;

use std::collections::{HashMap, HashSet};

use sched_core::diagnostics::ScheduleSummary;
use sched_core::{validate_schedule, Constraints, GenerationError, Solver, Topology};
use tracing::info;
use types::{Day, Instance, SolveEnvelope, SolveResult, TimetableEntry};

pub use board::{Board, TeacherBusyMap};

/// Lab-first greedy generator. Deterministic for a fixed day order.
#[derive(Clone, Debug)]
pub struct GreedySolver {
    days: Vec<Day>,
}

impl GreedySolver {
    pub fn new() -> Self {
        Self {
            days: Day::ALL.to_vec(),
        }
    }

    /// Same placement rules, with the day loop walked in `days` order.
    pub fn with_day_order(days: Vec<Day>) -> Self {
        Self { days }
    }

    pub fn generate(
        &self,
        inst: &Instance,
        topo: &Topology,
    ) -> Result<Vec<TimetableEntry>, GenerationError> {
        self.generate_on(inst, topo, Board::new())
    }

    /// Runs both phases on a caller-supplied board.
    pub fn generate_on(
        &self,
        inst: &Instance,
        topo: &Topology,
        mut board: Board,
    ) -> Result<Vec<TimetableEntry>, GenerationError> {
        let mut timetable = labs::schedule_labs(inst, topo, &self.days, &mut board)?;

        let limits: HashMap<_, _> = inst
            .teachers
            .iter()
            .filter_map(|t| t.daily_limit().map(|n| (t.id, n)))
            .collect();
        let allocations: HashSet<_> = inst.allocations.iter().map(|a| a.key()).collect();

        let mut classes: Vec<_> = inst.classes.iter().collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        info!(classes = classes.len(), "generating lectures");
        for class in classes {
            let entries = lectures::schedule_class_lectures(
                inst,
                topo,
                class,
                &self.days,
                &limits,
                &allocations,
                &mut board,
            )?;
            timetable.extend(entries);
        }

        info!(entries = timetable.len(), "total entries generated");
        Ok(timetable)
    }
}

impl Default for GreedySolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for GreedySolver {
    fn solve(&self, env: &SolveEnvelope) -> Result<SolveResult, GenerationError> {
        let inst = &env.instance;
        let topo = Topology::for_instance(inst);
        let entries = self.generate(inst, &topo)?;

        validate_schedule(&entries, &Constraints::from_instance(inst, &topo))?;

        let summary = ScheduleSummary::of(inst, &entries);
        info!(
            total = summary.total,
            labs = summary.labs,
            lectures = summary.lectures,
            "timetable generated"
        );
        Ok(SolveResult {
            status: "solved".into(),
            entries,
            fitness: None,
            stats: serde_json::json!({
                "method": "greedy",
                "labs": summary.labs,
                "lectures": summary.lectures,
                "per_class": summary.per_class,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Allocation, Class, ClassId, Slot, SubjectId, Teacher, TeacherId, WeeklyLoad};

    fn single_class(theory: u32, limit: Option<u32>) -> Instance {
        Instance {
            classes: vec![Class {
                id: ClassId(1),
                name: "SE-C".into(),
            }],
            teachers: vec![Teacher {
                id: TeacherId(1),
                name: "T".into(),
                max_lectures_per_day: limit,
            }],
            weekly_loads: vec![WeeklyLoad {
                teacher_id: TeacherId(1),
                subject_id: SubjectId(1),
                class_id: ClassId(1),
                weekly_theory_load: theory,
                weekly_practical_load: 0,
            }],
            allocations: vec![Allocation {
                teacher_id: TeacherId(1),
                subject_id: SubjectId(1),
                class_id: ClassId(1),
            }],
            ..Instance::default()
        }
    }

    #[test]
    fn theory_only_class_spreads_over_distinct_days() {
        let inst = single_class(3, None);
        let entries = GreedySolver::new()
            .generate(&inst, &Topology::standard())
            .unwrap();
        assert_eq!(entries.len(), 3);
        let days: HashSet<_> = entries.iter().map(|e| e.day).collect();
        assert_eq!(days.len(), 3);
        let whitelist = [Slot(1), Slot(2), Slot(3), Slot(4)];
        assert!(entries.iter().all(|e| !e.is_lab && whitelist.contains(&e.slot)));
    }

    #[test]
    fn daily_limit_of_one_uses_every_day_once() {
        let inst = single_class(5, Some(1));
        let env = SolveEnvelope {
            instance: inst,
            params: Default::default(),
        };
        let res = GreedySolver::new().solve(&env).unwrap();
        let mut days: Vec<_> = res.entries.iter().map(|e| e.day).collect();
        days.sort();
        assert_eq!(days, Day::ALL.to_vec());
    }

    #[test]
    fn reversed_day_order_fills_friday_first() {
        let inst = single_class(1, None);
        let mut days = Day::ALL.to_vec();
        days.reverse();
        let entries = GreedySolver::with_day_order(days)
            .generate(&inst, &Topology::standard())
            .unwrap();
        assert_eq!(entries[0].day, Day::Fri);
    }

    #[test]
    fn preseeded_commitments_are_respected() {
        // the teacher is already committed elsewhere on Monday and in every slot-1
        let mut busy = TeacherBusyMap::new();
        for slot in Slot::ALL {
            busy.mark(TeacherId(1), Day::Mon, slot);
        }
        for day in Day::ALL {
            busy.mark(TeacherId(1), day, Slot(1));
        }
        let inst = single_class(2, None);
        let entries = GreedySolver::new()
            .generate_on(&inst, &Topology::standard(), Board::with_busy(busy))
            .unwrap();
        let placed: Vec<_> = entries.iter().map(|e| (e.day, e.slot)).collect();
        assert_eq!(placed, vec![(Day::Tue, Slot(3)), (Day::Wed, Slot(3))]);
    }

    #[test]
    fn unconfigured_class_fails_loudly() {
        let mut inst = single_class(1, None);
        inst.classes[0].name = "ZZ-Z".into();
        let err = GreedySolver::new()
            .generate(&inst, &Topology::standard())
            .unwrap_err();
        assert_eq!(err.kind(), "config");
    }
}
