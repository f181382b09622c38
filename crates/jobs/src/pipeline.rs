use std::sync::Arc;

use anyhow::Context;
use sched_core::{check_snapshot, GenerationError, SnapshotError, Solver, Topology};
use tracing::{error, info, warn};
use types::{SolveEnvelope, SolveResult};

use crate::store::ScheduleStore;

/// Integrity check, generation, then a full replace of the store.
/// The store is not touched unless the solver succeeds.
pub async fn run_once<S: Solver>(
    solver: Arc<S>,
    env: SolveEnvelope,
    store: &dyn ScheduleStore,
) -> anyhow::Result<SolveResult> {
    let topo = Topology::for_instance(&env.instance);
    if let Err(SnapshotError::Msg(m)) = check_snapshot(&env.instance, &topo) {
        warn!(error = %m, "snapshot rejected");
        return Err(GenerationError::Snapshot(m).into());
    }

    let solver_kind = env.params.solver;
    let res = tokio::task::spawn_blocking(move || solver.solve(&env))
        .await
        .context("solver task aborted")??;

    let Some(rows) = res.rows() else {
        error!(entries = res.entries.len(), "entry outside the slot grid");
        anyhow::bail!("schedule has an entry outside the slot grid, nothing persisted");
    };
    store
        .replace_all(rows)
        .await
        .context("replacing stored schedule")?;
    info!(?solver_kind, entries = res.entries.len(), "schedule persisted");
    Ok(res)
}
