//! External process launch, cancellable wait, and termination
//!
//! The wait is a cooperative polling loop rather than an OS exit
//! notification: cancellation responsiveness is bounded by [`POLL_INTERVAL`]
//! and identical across platforms. Cancellation returns immediately without
//! waiting for the process; the caller terminates the orphan via
//! [`try_end_process`].

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Interval between liveness checks while waiting for the external tool.
///
/// This bounds cancellation latency: a cancelled wait returns within one
/// poll interval.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Resolve an executable path, verifying it names an existing file.
///
/// # Errors
///
/// Returns [`Error::LaunchFailed`] when the path cannot be canonicalized or
/// does not point at a regular file.
pub(crate) fn resolve_executable(executable: &Path) -> Result<PathBuf> {
    let resolved = executable.canonicalize().map_err(|e| Error::LaunchFailed {
        path: executable.to_path_buf(),
        reason: format!("not a valid executable path: {e}"),
    })?;
    if !resolved.is_file() {
        return Err(Error::LaunchFailed {
            path: resolved,
            reason: "not a file".into(),
        });
    }
    Ok(resolved)
}

/// Launch the external tool as a detached child with no visible window and
/// no shell in between.
///
/// The tool takes its entire parameter list as one argument string of
/// comma-separated `key="value"` pairs, passed here as a single argv entry.
/// `kill_on_drop` is set so an unexpected unwind cannot leak the child.
///
/// # Errors
///
/// Returns [`Error::LaunchFailed`] when the executable path does not resolve
/// to an existing file or the OS refuses to start the process.
pub(crate) fn launch(
    executable: &Path,
    argument_string: &str,
    capture_stderr: bool,
) -> Result<Child> {
    let resolved = resolve_executable(executable)?;

    let mut command = Command::new(&resolved);
    command
        .arg(argument_string)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(if capture_stderr {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .kill_on_drop(true);

    #[cfg(windows)]
    {
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        command.creation_flags(CREATE_NO_WINDOW);
    }

    debug!(executable = %resolved.display(), "launching external tool");
    command.spawn().map_err(|e| Error::LaunchFailed {
        path: resolved,
        reason: e.to_string(),
    })
}

/// Wait for the child to exit, observing the cancellation token at every
/// poll boundary.
///
/// Suspends the calling task (not a runtime thread) between polls. Returns
/// the exit status once the process has exited.
///
/// # Errors
///
/// Returns [`Error::Cancelled`] as soon as cancellation is observed, without
/// waiting for the process to exit; the caller is responsible for
/// terminating the orphaned child.
pub(crate) async fn wait_with_cancellation(
    child: &mut Child,
    cancel: &CancellationToken,
) -> Result<std::process::ExitStatus> {
    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Best-effort kill and reap of a child process.
///
/// Safe to call multiple times and from any failure path: "already exited"
/// counts as success. Returns `false` only when termination was attempted
/// and failed for another reason.
pub(crate) async fn try_end_process(child: &mut Child) -> bool {
    match child.start_kill() {
        Ok(()) => {}
        // InvalidInput means the child has already been reaped
        Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => {}
        Err(e) => {
            warn!(error = %e, "failed to kill external tool process");
            return false;
        }
    }
    match child.wait().await {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "failed to reap external tool process");
            false
        }
    }
}
