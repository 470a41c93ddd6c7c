//! Noesis CLI entry point

use std::process::ExitCode;

use clap::Parser;
use console::style;

use noesis::cli::{commands, Cli, CliError, Commands};
use noesis::infrastructure::{telemetry, ConfigLoader};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err}", style("error:").red().bold());
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // Init runs before configuration exists.
    if let Commands::Init { force } = cli.command {
        return commands::handle_init(force, cli.json);
    }

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let _guard = telemetry::init(&config.logging)?;

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Submit { query, file, facts } => {
            commands::handle_submit(config, query, file, facts, cli.json).await
        }
        Commands::Status { cycle_id } => {
            commands::handle_status(config, &cycle_id, cli.json).await
        }
        Commands::Cancel { cycle_id } => {
            commands::handle_cancel(config, &cycle_id, cli.json).await
        }
        Commands::Stats => commands::handle_stats(config, cli.json).await,
        Commands::Sweep { roadmap, contexts } => {
            commands::handle_sweep(config, roadmap, contexts, cli.json).await
        }
        Commands::Score { file } => commands::handle_score(config, file, cli.json).await,
    }
}
