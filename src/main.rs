//! Entry point for the arc-extract application.
//! Handles CLI parsing, logging setup, and dispatches the selected extraction jobs.

use arc_extract::config::RunFile;
use arc_extract::parallel::ParallelConfig;
use clap::Parser;
use env_logger::{Builder, Env};
use log::{error, info};

mod cli;

use cli::{Args, Command};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    let (jobs, threads) = match args.command {
        Command::Run { config } => {
            let run = RunFile::load(&config)?;
            info!("Loaded {} jobs from {}", run.jobs.len(), config.display());
            (run.jobs, args.threads.or(run.threads))
        }
        command => (command.into_job_spec().into_iter().collect(), args.threads),
    };

    ParallelConfig::new(threads).setup_global_pool()?;

    let mut failed = 0;
    for spec in jobs {
        let name = spec.dataset().name();
        info!("▶ {name}");
        match spec.into_job().run() {
            Ok(outputs) => {
                for path in outputs {
                    info!("✅ Saved result to {}", path.display());
                }
            }
            Err(e) => {
                error!("{name} failed: {e}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!("{failed} job(s) failed").into());
    }
    info!("Extraction completed.");
    Ok(())
}
