pub mod pipeline;
pub mod store;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use sched_core::{GenerationError, Solver};
use solver_greedy::GreedySolver;
use solver_heur::FitnessSolver;
use tracing::{error, info};
use types::{SolveEnvelope, SolveResult, SolverKind};
use uuid::Uuid;

pub use pipeline::run_once;
pub use store::{InMemStore, ScheduleStore};

/// Routes a run to the solver named in its params.
#[derive(Clone, Default)]
pub struct DispatchSolver {
    greedy: Arc<GreedySolver>,
    fitness: Arc<FitnessSolver>,
}

impl DispatchSolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Solver for DispatchSolver {
    fn solve(&self, env: &SolveEnvelope) -> Result<SolveResult, GenerationError> {
        match env.params.solver {
            SolverKind::Greedy => self.greedy.solve(env),
            SolverKind::Fitness => self.fitness.solve(env),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RunId(pub String);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Running,
    Generated { result: SolveResult },
    Failed { kind: String, message: String },
}

impl RunStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, RunStatus::Generated { .. } | RunStatus::Failed { .. })
    }
}

/// Generation runs on the tokio runtime, tracked by id.
#[derive(Clone)]
pub struct InMemRuns<S: Solver> {
    inner: Arc<RwLock<HashMap<String, RunStatus>>>,
    solver: Arc<S>,
    store: Arc<dyn ScheduleStore>,
}

impl<S: Solver> InMemRuns<S> {
    pub fn new(solver: S, store: Arc<dyn ScheduleStore>) -> Self {
        Self {
            inner: Default::default(),
            solver: Arc::new(solver),
            store,
        }
    }

    pub fn enqueue(&self, env: SolveEnvelope) -> RunId {
        let id = Uuid::new_v4().to_string();
        self.inner.write().insert(id.clone(), RunStatus::Queued);

        let map = self.inner.clone();
        let solver = self.solver.clone();
        let store = self.store.clone();
        let id_for_task = id.clone();

        tokio::spawn(async move {
            map.write().insert(id_for_task.clone(), RunStatus::Running);
            let status = match run_once(solver, env, store.as_ref()).await {
                Ok(result) => {
                    info!(run = %id_for_task, entries = result.entries.len(), "run finished");
                    RunStatus::Generated { result }
                }
                Err(e) => {
                    error!(run = %id_for_task, error = %e, "run failed");
                    let kind = e
                        .downcast_ref::<GenerationError>()
                        .map_or("internal", GenerationError::kind);
                    RunStatus::Failed {
                        kind: kind.to_string(),
                        message: format!("{e:#}"),
                    }
                }
            };
            map.write().insert(id_for_task, status);
        });

        RunId(id)
    }

    pub fn get(&self, id: &str) -> Option<RunStatus> {
        self.inner.read().get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use types::{
        Allocation, Class, ClassId, Instance, SolveParams, SubjectId, Teacher, TeacherId,
        WeeklyLoad,
    };

    fn env(solver: SolverKind, theory: u32) -> SolveEnvelope {
        SolveEnvelope {
            instance: Instance {
                classes: vec![Class {
                    id: ClassId(1),
                    name: "TE-A".into(),
                }],
                teachers: vec![Teacher {
                    id: TeacherId(1),
                    name: "T".into(),
                    max_lectures_per_day: Some(1),
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
            },
            params: SolveParams {
                solver,
                population: 4,
                generations: 3,
                ..SolveParams::default()
            },
        }
    }

    async fn wait<S: Solver>(runs: &InMemRuns<S>, id: &RunId) -> RunStatus {
        for _ in 0..500 {
            if let Some(st) = runs.get(&id.0) {
                if st.is_finished() {
                    return st;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run {} did not finish", id.0);
    }

    #[test]
    fn dispatch_follows_solver_kind() {
        let d = DispatchSolver::new();
        let greedy = d.solve(&env(SolverKind::Greedy, 2)).unwrap();
        assert_eq!(greedy.stats["method"], "greedy");
        assert!(greedy.fitness.is_none());
        let fit = d.solve(&env(SolverKind::Fitness, 2)).unwrap();
        assert_eq!(fit.stats["method"], "ga");
        assert!(fit.fitness.is_some());
    }

    #[tokio::test]
    async fn queued_run_generates_and_persists() {
        let store = Arc::new(InMemStore::new());
        let runs = InMemRuns::new(DispatchSolver::new(), store.clone());
        let id = runs.enqueue(env(SolverKind::Greedy, 3));
        match wait(&runs, &id).await {
            RunStatus::Generated { result } => assert_eq!(result.entries.len(), 3),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn exhausted_run_reports_kind() {
        // six lectures with a one-per-day limit over five days
        let store = Arc::new(InMemStore::new());
        let runs = InMemRuns::new(DispatchSolver::new(), store.clone());
        let id = runs.enqueue(env(SolverKind::Greedy, 6));
        match wait(&runs, &id).await {
            RunStatus::Failed { kind, message } => {
                assert_eq!(kind, "exhausted");
                assert!(message.contains("placed 5"), "{message}");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_run_is_none() {
        let runs = InMemRuns::new(DispatchSolver::new(), Arc::new(InMemStore::new()));
        assert!(runs.get("nope").is_none());
    }
}
