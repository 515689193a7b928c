//! Command line interface for the extension bundler.
//!
//! This module provides the CLI for packaging and patch operations,
//! with proper argument parsing, command execution, and user feedback.

mod args;
pub mod commands;
mod output;

pub use args::{ApplyArgs, Args, BuildArgs, Command, ComposeArgs, DiffArgs, RuntimeConfig};
pub use output::OutputManager;

use tokio_util::sync::CancellationToken;

use crate::error::{CliError, Result};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute(args).await
}

/// Runs already parsed arguments, reporting failures through the output manager.
pub async fn execute(args: Args) -> Result<i32> {
    let runtime_config = RuntimeConfig::from(&args);

    if let Err(reason) = args.validate() {
        let error = CliError::InvalidArguments { reason };
        runtime_config.error(&error.to_string())?;
        return Ok(1);
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    let outcome = match &args.command {
        Command::Build(build) => commands::build::execute(build, &runtime_config, cancel).await,
        Command::Compose(compose) => {
            commands::compose::execute(compose, &runtime_config, cancel).await
        }
        Command::Diff(diff) => commands::patch::execute_diff(diff, &runtime_config).await,
        Command::Apply(apply) => commands::patch::execute_apply(apply, &runtime_config).await,
    };

    match outcome {
        Ok(()) => Ok(0),
        Err(e) => {
            runtime_config.error(&e.to_string())?;
            for suggestion in e.recovery_suggestions() {
                runtime_config.indent(&suggestion)?;
            }
            Ok(1)
        }
    }
}

/// Validate arguments without executing (for testing)
pub fn validate_args(args: &Args) -> std::result::Result<(), String> {
    args.validate()
}
