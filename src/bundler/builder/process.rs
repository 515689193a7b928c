//! Supervised external commands.
//!
//! Every child is spawned with `kill_on_drop`, so abandoning the wait on
//! timeout or cancellation also terminates the process.

use std::{
    process::{Output, Stdio},
    time::Duration,
};

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::bundler::error::{Error, Result};

/// Lines of stderr kept in a [`Error::CommandFailed`] reason.
const STDERR_TAIL_LINES: usize = 20;

/// Runs `command` to completion under an optional time limit.
///
/// Output is captured. A non-zero exit becomes [`Error::CommandFailed`]
/// carrying the tail of stderr; an elapsed limit becomes [`Error::Timeout`]
/// and a fired `cancel` token becomes [`Error::Cancelled`]. In the last two
/// cases the child has been killed by the time this returns.
pub async fn run_supervised(
    mut command: Command,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<Output> {
    let display = describe(&command);
    if cancel.is_cancelled() {
        return Err(Error::Cancelled { what: display });
    }

    command
        .kill_on_drop(true)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    log::debug!("running `{}`", display);
    let child = command.spawn().map_err(|e| Error::CommandFailed {
        command: display.clone(),
        reason: format!("failed to spawn: {e}"),
    })?;

    let what = display.clone();
    let wait = async move {
        let waited = match timeout {
            Some(after) => tokio::time::timeout(after, child.wait_with_output())
                .await
                .map_err(|_| Error::Timeout {
                    what: what.clone(),
                    after,
                })?,
            None => child.wait_with_output().await,
        };
        waited.map_err(|e| Error::CommandFailed {
            command: what,
            reason: format!("failed to wait: {e}"),
        })
    };

    let output = tokio::select! {
        _ = cancel.cancelled() => {
            log::warn!("cancelling `{}`", display);
            return Err(Error::Cancelled { what: display });
        }
        output = wait => output?,
    };

    if !output.status.success() {
        return Err(Error::CommandFailed {
            command: display,
            reason: format!("{}: {}", output.status, stderr_tail(&output.stderr)),
        });
    }
    Ok(output)
}

/// `program arg1 arg2 ...` for logs and errors.
pub fn describe(command: &Command) -> String {
    let std = command.as_std();
    std::iter::once(std.get_program())
        .chain(std.get_args())
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return "no output on stderr".to_string();
    }
    lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n")
}
