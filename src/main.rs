use std::process::ExitCode;

use ctp_eval::{cli, config::ExperimentConfig, experiment};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let arguments = cli::cli();
    let config = match ExperimentConfig::from_cli(&arguments) {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    println!(
        "Mode: {}, Seed: {}, Results: {}",
        config.mode,
        config.seed,
        config.results_dir.display()
    );

    match experiment::run(&config) {
        Ok(summary) => {
            println!("Harvested: {}", summary.harvested);
            println!("Failed: {}", summary.failed);
            println!("Timeouts: {}", summary.timed_out);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
