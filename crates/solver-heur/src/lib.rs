use rand::seq::{index, SliceRandom};
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sched_core::scoring::{compute_fitness, Fitness};
use sched_core::{GenerationError, Solver, Topology};
use solver_greedy::GreedySolver;
use tracing::{debug, info, warn};
use types::{Day, FitnessPolicy, Instance, SolveEnvelope, SolveParams, SolveResult, TimetableEntry};

/// Population search over greedy-built candidates, ranked by soft fitness only.
pub struct FitnessSolver;

impl FitnessSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FitnessSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for FitnessSolver {
    fn solve(&self, env: &SolveEnvelope) -> Result<SolveResult, GenerationError> {
        let params = &env.params;
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let topo = Topology::for_instance(&env.instance);

        let population = initial_population(&env.instance, &topo, params.population, &mut rng)?;
        let pop = population.len();
        let best = evolve(population, params, &mut rng);

        info!(score = best.score, "fitness search finished");
        Ok(SolveResult {
            status: "scored".into(),
            entries: best.entries,
            fitness: Some(best.score),
            stats: serde_json::json!({
                "method": "ga",
                "pop": pop,
                "generations": params.generations,
                "best": best.score,
                "teacher_clashes": best.fitness.teacher_clashes,
                "excess_labs": best.fitness.excess_labs,
                "narrow_subjects": best.fitness.narrow_subjects,
            }),
        })
    }
}

#[derive(Clone, Debug)]
pub struct Candidate {
    pub entries: Vec<TimetableEntry>,
    pub fitness: Fitness,
    pub score: i64,
}

impl Candidate {
    pub fn new(entries: Vec<TimetableEntry>, policy: &FitnessPolicy) -> Self {
        let fitness = compute_fitness(&entries, policy);
        Self {
            score: fitness.score,
            entries,
            fitness,
        }
    }
}

/// Independent greedy runs, each walking the week in its own shuffled day order.
/// Failed runs are skipped; the last failure is returned if none succeed.
pub fn initial_population(
    inst: &Instance,
    topo: &Topology,
    size: usize,
    rng: &mut ChaCha8Rng,
) -> Result<Vec<Vec<TimetableEntry>>, GenerationError> {
    let size = size.max(1);
    let mut population = Vec::with_capacity(size);
    let mut last_err = None;

    for _ in 0..size * 2 {
        if population.len() == size {
            break;
        }
        let mut days = Day::ALL.to_vec();
        days.shuffle(rng);
        match GreedySolver::with_day_order(days).generate(inst, topo) {
            Ok(entries) => population.push(entries),
            Err(e) => {
                debug!(error = %e, "candidate construction failed");
                last_err = Some(e);
            }
        }
    }

    match (population.is_empty(), last_err) {
        (true, Some(e)) => Err(e),
        _ => Ok(population),
    }
}

/// Swaps the (day, slot) placement of two random same-kind entries, with probability `rate`.
pub fn mutate(mut entries: Vec<TimetableEntry>, rate: f64, rng: &mut ChaCha8Rng) -> Vec<TimetableEntry> {
    if rng.gen::<f64>() > rate || entries.len() < 2 {
        return entries;
    }
    let picked = index::sample(rng, entries.len(), 2);
    let (i, j) = (picked.index(0), picked.index(1));
    if entries[i].is_lab != entries[j].is_lab {
        return entries;
    }
    let (di, si) = (entries[i].day, entries[i].slot);
    entries[i].day = entries[j].day;
    entries[i].slot = entries[j].slot;
    entries[j].day = di;
    entries[j].slot = si;
    entries
}

/// Keep the top third each generation; refill with mutated copies of random survivors.
pub fn evolve(
    population: Vec<Vec<TimetableEntry>>,
    params: &SolveParams,
    rng: &mut ChaCha8Rng,
) -> Candidate {
    let policy = &params.fitness;
    let size = population.len().max(1);
    let keep = (size / 3).max(1);
    let mut scored: Vec<Candidate> = population
        .into_iter()
        .map(|entries| Candidate::new(entries, policy))
        .collect();

    if scored.is_empty() {
        warn!("empty population");
        return Candidate::new(Vec::new(), policy);
    }

    for generation in 0..params.generations {
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        debug!(generation, best = scored[0].score, "generation scored");

        scored.truncate(keep);
        let mut next = scored.clone();
        while next.len() < size {
            let Some(parent) = scored.choose(rng) else {
                break;
            };
            let child = mutate(parent.entries.clone(), params.mutation_rate, rng);
            next.push(Candidate::new(child, policy));
        }
        scored = next;
    }

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.swap_remove(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{
        Allocation, BatchAllocation, BatchId, Class, ClassId, Slot, SubjectId, Teacher, TeacherId,
        WeeklyLoad,
    };

    fn entry(day: Day, slot: u8, lab: bool) -> TimetableEntry {
        TimetableEntry {
            day,
            slot: Slot(slot),
            class_id: ClassId(1),
            subject_id: SubjectId(1),
            teacher_id: TeacherId(1),
            batch_id: lab.then_some(BatchId(1)),
            is_lab: lab,
        }
    }

    fn instance() -> Instance {
        Instance {
            classes: vec![
                Class {
                    id: ClassId(1),
                    name: "SE-A".into(),
                },
                Class {
                    id: ClassId(2),
                    name: "SE-B".into(),
                },
            ],
            teachers: vec![Teacher {
                id: TeacherId(1),
                name: "T".into(),
                max_lectures_per_day: Some(2),
            }],
            weekly_loads: vec![
                WeeklyLoad {
                    teacher_id: TeacherId(1),
                    subject_id: SubjectId(1),
                    class_id: ClassId(1),
                    weekly_theory_load: 3,
                    weekly_practical_load: 1,
                },
                WeeklyLoad {
                    teacher_id: TeacherId(1),
                    subject_id: SubjectId(2),
                    class_id: ClassId(2),
                    weekly_theory_load: 2,
                    weekly_practical_load: 0,
                },
            ],
            allocations: vec![
                Allocation {
                    teacher_id: TeacherId(1),
                    subject_id: SubjectId(1),
                    class_id: ClassId(1),
                },
                Allocation {
                    teacher_id: TeacherId(1),
                    subject_id: SubjectId(2),
                    class_id: ClassId(2),
                },
            ],
            batch_allocations: vec![BatchAllocation {
                teacher_id: TeacherId(1),
                subject_id: SubjectId(1),
                class_id: ClassId(1),
                batch_id: BatchId(1),
            }],
            ..Instance::default()
        }
    }

    #[test]
    fn zero_rate_never_mutates() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let entries = vec![entry(Day::Mon, 1, false), entry(Day::Tue, 2, false)];
        for _ in 0..50 {
            assert_eq!(mutate(entries.clone(), 0.0, &mut rng), entries);
        }
    }

    #[test]
    fn lab_and_lecture_are_never_swapped() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let entries = vec![entry(Day::Mon, 1, false), entry(Day::Tue, 3, true)];
        for _ in 0..50 {
            assert_eq!(mutate(entries.clone(), 1.0, &mut rng), entries);
        }
    }

    #[test]
    fn same_kind_swap_exchanges_day_and_slot() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let entries = vec![entry(Day::Mon, 1, false), entry(Day::Fri, 6, false)];
        let out = mutate(entries, 1.0, &mut rng);
        assert_eq!((out[0].day, out[0].slot), (Day::Fri, Slot(6)));
        assert_eq!((out[1].day, out[1].slot), (Day::Mon, Slot(1)));
    }

    #[test]
    fn survivors_keep_the_best_score() {
        let params = SolveParams {
            generations: 10,
            mutation_rate: 1.0,
            ..SolveParams::default()
        };
        let good = vec![entry(Day::Mon, 3, false), entry(Day::Tue, 3, false)];
        let bad = vec![entry(Day::Mon, 3, false), entry(Day::Mon, 3, false)];
        let start = Candidate::new(good.clone(), &params.fitness).score;
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let best = evolve(vec![bad.clone(), good, bad], &params, &mut rng);
        assert!(best.score >= start);
    }

    #[test]
    fn fixed_seed_reproduces_result() {
        let env = SolveEnvelope {
            instance: instance(),
            params: SolveParams {
                solver: types::SolverKind::Fitness,
                seed: 42,
                population: 6,
                generations: 5,
                ..SolveParams::default()
            },
        };
        let a = FitnessSolver::new().solve(&env).unwrap();
        let b = FitnessSolver::new().solve(&env).unwrap();
        assert_eq!(a.entries, b.entries);
        assert_eq!(a.fitness, b.fitness);
        assert_eq!(a.status, "scored");
    }

    #[test]
    fn infeasible_instance_surfaces_generation_error() {
        let mut inst = instance();
        inst.batch_allocations.clear();
        let env = SolveEnvelope {
            instance: inst,
            params: SolveParams::default(),
        };
        let err = FitnessSolver::new().solve(&env).unwrap_err();
        assert_eq!(err.kind(), "config");
    }
}
