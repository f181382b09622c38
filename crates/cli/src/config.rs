use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use types::{SolveParams, SolverKind};

#[derive(Copy, Clone, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum SolverArg {
    Greedy,
    Fitness,
}

impl From<SolverArg> for SolverKind {
    fn from(arg: SolverArg) -> Self {
        match arg {
            SolverArg::Greedy => Self::Greedy,
            SolverArg::Fitness => Self::Fitness,
        }
    }
}

/// Weekly timetable generator over JSON snapshots.
#[derive(Debug, Parser)]
#[command(name = "timetable", version)]
pub struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum, env = "TIMETABLE__LOG__FORMAT", default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate, validate and persist a full schedule.
    Generate(GenerateArgs),
    /// Check an existing list of entries against every hard constraint.
    Validate {
        /// Snapshot JSON (an instance or a solve envelope)
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        /// Timetable entries JSON
        #[arg(long, value_name = "FILE")]
        entries: PathBuf,
    },
    /// Report teacher overloads and missing allocations before generating.
    Diagnose {
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
    },
    /// Print the snapshot JSON schema.
    Schema,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Snapshot JSON (an instance or a solve envelope)
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,
    /// Schedule rows are written here, replacing any previous content
    #[arg(long, value_name = "FILE")]
    pub output: PathBuf,
    /// Also write the raw timetable entries
    #[arg(long, value_name = "FILE")]
    pub entries: Option<PathBuf>,

    #[arg(long, value_enum, env = "TIMETABLE__SOLVER")]
    pub solver: Option<SolverArg>,
    #[arg(long, env = "TIMETABLE__SEED")]
    pub seed: Option<u64>,
    #[arg(long, env = "TIMETABLE__POPULATION")]
    pub population: Option<usize>,
    #[arg(long, env = "TIMETABLE__GENERATIONS")]
    pub generations: Option<usize>,
    #[arg(long, env = "TIMETABLE__MUTATION_RATE")]
    pub mutation_rate: Option<f64>,
}

impl GenerateArgs {
    /// Flags and env win over whatever the snapshot carried.
    pub fn apply(&self, params: &mut SolveParams) {
        if let Some(s) = self.solver {
            params.solver = s.into();
        }
        if let Some(seed) = self.seed {
            params.seed = seed;
        }
        if let Some(n) = self.population {
            params.population = n;
        }
        if let Some(n) = self.generations {
            params.generations = n;
        }
        if let Some(r) = self.mutation_rate {
            params.mutation_rate = r.clamp(0.0, 1.0);
        }
    }
}
