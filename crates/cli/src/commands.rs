use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use jobs::{run_once, DispatchSolver};
use sched_core::diagnostics::{diagnose, ScheduleSummary};
use sched_core::{validate_schedule, Constraints, Topology};
use serde_json::{json, Value};
use tracing::{info, warn};
use types::{Instance, SolveEnvelope, TimetableEntry};

use crate::config::GenerateArgs;
use crate::store::JsonFileStore;

/// Accepts a bare instance or a full `{instance, params}` envelope.
pub async fn read_envelope(path: &Path) -> anyhow::Result<SolveEnvelope> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let v: Value =
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))?;
    let env = if v.get("instance").is_some() {
        serde_json::from_value(v)?
    } else {
        SolveEnvelope {
            instance: serde_json::from_value(v)?,
            params: Default::default(),
        }
    };
    Ok(env)
}

async fn read_entries(path: &Path) -> anyhow::Result<Vec<TimetableEntry>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

pub async fn generate(args: &GenerateArgs) -> anyhow::Result<Value> {
    let mut env = read_envelope(&args.input).await?;
    args.apply(&mut env.params);

    let report = diagnose(&env.instance);
    if report.warning_count() > 0 {
        warn!(warnings = report.warning_count(), "snapshot has load warnings");
    }

    let summary_inst = env.instance.clone();
    let store = JsonFileStore::new(&args.output);
    let res = run_once(Arc::new(DispatchSolver::new()), env, &store).await?;

    if let Some(path) = &args.entries {
        let body = serde_json::to_vec_pretty(&res.entries)?;
        tokio::fs::write(path, body)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
    }

    let summary = ScheduleSummary::of(&summary_inst, &res.entries);
    info!(output = %args.output.display(), total = summary.total, "generation complete");
    Ok(json!({
        "status": res.status,
        "fitness": res.fitness,
        "summary": summary,
        "stats": res.stats,
    }))
}

/// Returns the report and whether every constraint held.
pub async fn validate(input: &Path, entries: &Path) -> anyhow::Result<(Value, bool)> {
    let inst = read_envelope(input).await?.instance;
    let entries = read_entries(entries).await?;
    let topo = Topology::for_instance(&inst);

    Ok(match validate_schedule(&entries, &Constraints::from_instance(&inst, &topo)) {
        Ok(()) => (json!({ "valid": true, "entries": entries.len() }), true),
        Err(v) => (
            json!({
                "valid": false,
                "rule": v.rule.as_str(),
                "message": v.message,
                "offending": v.entries,
            }),
            false,
        ),
    })
}

pub async fn diagnose_file(input: &Path) -> anyhow::Result<Value> {
    let env = read_envelope(input).await?;
    Ok(serde_json::to_value(diagnose(&env.instance))?)
}

pub fn schema() -> anyhow::Result<Value> {
    Ok(serde_json::to_value(schemars::schema_for!(Instance))?)
}
