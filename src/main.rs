mod cli;
mod error;
mod logging;
mod scheduler;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use crate::scheduler::Scheduler;
use clap::Parser;
use exn::ResultExt;
use refile_config::Config;
use refile_convert::{ConverterHandle, Ghostscript, run_script};
use refile_pipeline::Pipeline;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbosity());
    match execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = ?e, "refile failed");
            ExitCode::FAILURE
        },
    }
}

async fn execute(cli: Cli) -> Result<ExitCode> {
    let command = cli.command.unwrap_or_default();
    if let Command::Script { script, working_dir, args } = command {
        return script_command(&script, &working_dir, &args);
    }

    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let converter = Ghostscript::new(config.converter.executable.clone()).or_raise(|| ErrorKind::Converter)?;
    tracing::info!(executable = %converter.executable().display(), "Using Ghostscript");
    let converter: ConverterHandle = Arc::new(converter);
    let pipeline = Arc::new(Pipeline::from_config(&config, converter));

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    match command {
        Command::Once => {
            let summary = pipeline.run(&cancel).await.or_raise(|| ErrorKind::Run)?;
            Ok(match summary.tally().failed {
                0 => ExitCode::SUCCESS,
                _ => ExitCode::from(2),
            })
        },
        _ => {
            Scheduler::new(pipeline, config.period()).serve(cancel).await;
            Ok(ExitCode::SUCCESS)
        },
    }
}

fn script_command(script: &Path, working_dir: &Path, args: &[String]) -> Result<ExitCode> {
    let output = run_script(script, working_dir, args).or_raise(|| ErrorKind::Script)?;
    // Relaying output is best effort; a closed pipe is not worth failing over.
    let _ = std::io::stdout().write_all(output.stdout.as_bytes());
    let _ = std::io::stderr().write_all(output.stderr.as_bytes());
    Ok(match output.code {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    })
}

fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupted; stopping after the current stage");
                cancel.cancel();
            },
            Err(e) => tracing::warn!(error = %e, "Cannot listen for Ctrl-C; stop the process some other way"),
        }
    });
}
