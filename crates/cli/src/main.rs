mod commands;
mod config;
mod store;
mod telemetry;

use std::process::ExitCode;

use clap::Parser;
use config::{Cli, Command};
use serde_json::Value;

fn print(v: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(v)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    telemetry::init(cli.log_format);

    match cli.command {
        Command::Generate(args) => print(&commands::generate(&args).await?)?,
        Command::Validate { input, entries } => {
            let (report, ok) = commands::validate(&input, &entries).await?;
            print(&report)?;
            if !ok {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Diagnose { input } => print(&commands::diagnose_file(&input).await?)?,
        Command::Schema => print(&commands::schema()?)?,
    }
    Ok(ExitCode::SUCCESS)
}
