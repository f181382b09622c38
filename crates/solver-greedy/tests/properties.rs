use std::collections::{BTreeMap, HashSet};

use proptest::prelude::*;
use sched_core::validate::check_teacher_clash;
use sched_core::{validate_schedule, Constraints, Topology};
use solver_greedy::GreedySolver;
use types::{
    Allocation, Batch, BatchAllocation, BatchId, Class, ClassId, Day, Instance, LoadKey, SubjectId,
    Teacher, TeacherId, WeeklyLoad,
};

const CLASS_NAMES: [&str; 3] = ["SE-A", "SE-B", "TE-B"];

/// (class, teacher, subject, theory, practical)
type LoadRow = (u32, u32, u32, u32, u32);

fn build(loads: &[LoadRow], limits: &[Option<u32>], batches_per_class: u32) -> Instance {
    let classes = CLASS_NAMES
        .iter()
        .enumerate()
        .map(|(i, n)| Class {
            id: ClassId(i as u32 + 1),
            name: n.to_string(),
        })
        .collect();
    let teachers = limits
        .iter()
        .enumerate()
        .map(|(i, &l)| Teacher {
            id: TeacherId(i as u32 + 1),
            name: format!("T{i}"),
            max_lectures_per_day: l,
        })
        .collect::<Vec<_>>();
    let batch_id = |class: u32, n: u32| BatchId(class * 10 + n);
    let batches = (1..=CLASS_NAMES.len() as u32)
        .flat_map(|c| {
            (0..batches_per_class).map(move |n| Batch {
                id: batch_id(c, n),
                class_id: ClassId(c),
                name: format!("B{n}"),
            })
        })
        .collect();

    let mut seen = HashSet::new();
    let mut inst = Instance {
        classes,
        teachers,
        batches,
        ..Instance::default()
    };
    for &(c, t, s, theory, practical) in loads {
        let class = c % CLASS_NAMES.len() as u32 + 1;
        let teacher = t % limits.len() as u32 + 1;
        if !seen.insert((teacher, s, class)) {
            continue;
        }
        inst.weekly_loads.push(WeeklyLoad {
            teacher_id: TeacherId(teacher),
            subject_id: SubjectId(s),
            class_id: ClassId(class),
            weekly_theory_load: theory,
            weekly_practical_load: practical,
        });
        inst.allocations.push(Allocation {
            teacher_id: TeacherId(teacher),
            subject_id: SubjectId(s),
            class_id: ClassId(class),
        });
        if practical > 0 {
            for n in 0..batches_per_class {
                inst.batch_allocations.push(BatchAllocation {
                    teacher_id: TeacherId(teacher),
                    subject_id: SubjectId(s),
                    class_id: ClassId(class),
                    batch_id: batch_id(class, n),
                });
            }
        }
    }
    inst
}

fn instances() -> impl Strategy<Value = Instance> {
    (
        prop::collection::vec((0u32..3, 0u32..4, 0u32..4, 0u32..5, 0u32..3), 1..8),
        prop::collection::vec(prop::option::of(1u32..4), 1..4),
        1u32..3,
    )
        .prop_map(|(loads, limits, batches)| build(&loads, &limits, batches))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn successful_runs_pass_every_hard_constraint(inst in instances()) {
        let topo = Topology::standard();
        if let Ok(entries) = GreedySolver::new().generate(&inst, &topo) {
            prop_assert_eq!(check_teacher_clash(&entries), Ok(()));
            prop_assert_eq!(validate_schedule(&entries, &Constraints::from_instance(&inst, &topo)), Ok(()));
        }
    }

    #[test]
    fn successful_runs_conserve_weekly_load(inst in instances()) {
        let topo = Topology::standard();
        if let Ok(entries) = GreedySolver::new().generate(&inst, &topo) {
            let mut theory: BTreeMap<LoadKey, u32> = BTreeMap::new();
            let mut sessions: HashSet<(LoadKey, Day)> = HashSet::new();
            for e in &entries {
                if e.is_lab {
                    // one session per day per triple
                    sessions.insert((e.key(), e.day));
                } else {
                    *theory.entry(e.key()).or_default() += 1;
                }
            }
            for l in &inst.weekly_loads {
                prop_assert_eq!(theory.get(&l.key()).copied().unwrap_or(0), l.weekly_theory_load);
                let labs = sessions.iter().filter(|(k, _)| *k == l.key()).count() as u32;
                prop_assert_eq!(labs, l.weekly_practical_load);
            }
        }
    }

    #[test]
    fn generation_is_deterministic(inst in instances()) {
        let topo = Topology::standard();
        let a = GreedySolver::new().generate(&inst, &topo);
        let b = GreedySolver::new().generate(&inst, &topo);
        prop_assert_eq!(a, b);
    }
}

#[test]
fn lab_pairs_are_canonical_windows() {
    let inst = build(&[(0, 0, 1, 2, 2), (1, 1, 2, 3, 1), (2, 0, 3, 1, 2)], &[None, Some(3)], 2);
    let entries = GreedySolver::new()
        .generate(&inst, &Topology::standard())
        .unwrap();
    let mut by_group: BTreeMap<_, Vec<u8>> = BTreeMap::new();
    for e in entries.iter().filter(|e| e.is_lab) {
        by_group
            .entry((e.day, e.class_id, e.batch_id, e.subject_id))
            .or_default()
            .push(e.slot.0);
    }
    for slots in by_group.values_mut() {
        slots.sort_unstable();
        for pair in slots.chunks(2) {
            assert!(matches!(pair, [1, 2] | [3, 4] | [5, 6]), "{pair:?}");
        }
    }
}
