//! Export orchestration: drive one finsql.exe invocation from argument
//! assembly through classification
//!
//! One linear pass per request: assemble arguments → launch → cancellable
//! wait → classify (stderr, then exit code, then log text). No retries are
//! performed here; retry policy, if any, belongs to the caller.

use super::args::{design_arguments, export_arguments, VariantPolicy};
use super::classify::{classify_log, LogDiagnosis};
use super::cleanup::{safe_delete, unique_temp_path, TempArtifact};
use super::process;
use crate::config::NavEnvironment;
use crate::error::{ExportError, Result};
use crate::types::LicenseStatus;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tokio::process::Child;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Read the child's captured stderr to end. Missing pipe or a read failure
/// degrades to empty text; classification then falls back to the exit code.
async fn read_stderr(child: &mut Child) -> String {
    let mut text = String::new();
    if let Some(mut stderr) = child.stderr.take() {
        if let Err(e) = stderr.read_to_string(&mut text).await {
            tracing::warn!(error = %e, "failed to read export tool stderr");
        }
    }
    text
}

/// Run one export invocation and classify its outcome.
///
/// `single_object` selects the reporting mode for license problems: a
/// single-object export returns [`LicenseStatus::Unlicensed`] as a normal
/// value, a multi-object export raises [`ExportError::LicenseDenied`].
///
/// On every exit path the diagnostic log file is deleted and the child
/// process is released; on every failure path any partial target artifact
/// is deleted as well.
pub(crate) async fn export_filter(
    env: &NavEnvironment,
    variant: VariantPolicy,
    filter: &str,
    single_object: bool,
    target: &Path,
    cancel: &CancellationToken,
) -> Result<LicenseStatus> {
    let executable = env.finsql_executable()?;
    let log_guard = TempArtifact::new(unique_temp_path("nav-export-log-", "log"));
    let arguments = export_arguments(env, variant, filter, single_object, target, log_guard.path());

    debug!(
        filter,
        single_object,
        target = %target.display(),
        "launching finsql export"
    );
    let mut child = process::launch(&executable, &arguments, true)?;

    let status = match process::wait_with_cancellation(&mut child, cancel).await {
        Ok(status) => status,
        Err(e) => {
            // Cancelled (or the wait itself failed): never leave an orphan,
            // never leave a partial artifact.
            process::try_end_process(&mut child).await;
            safe_delete(target);
            return Err(e);
        }
    };

    let stderr_text = read_stderr(&mut child).await;
    if !stderr_text.trim().is_empty() {
        // Takes precedence over the exit code: the tool sometimes exits 0
        // after writing a warning that marks an incomplete export.
        safe_delete(target);
        return Err(ExportError::ToolStderr {
            stderr: stderr_text,
        }
        .into());
    }

    if status.success() {
        // Exit 0 with no target file is a known symptom of a pre-2013
        // finsql.exe, so the file check is part of the success contract.
        if !target.exists() {
            return Err(ExportError::MissingOutputFile {
                path: target.to_path_buf(),
            }
            .into());
        }
        info!(filter, target = %target.display(), "export completed");
        return Ok(LicenseStatus::Licensed);
    }

    // The export failed. A target file may have been partially written; we
    // ignore its content and clean up instead.
    safe_delete(target);

    let log_text = match tokio::fs::read_to_string(log_guard.path()).await {
        Ok(text) => text,
        Err(_) => {
            return Err(ExportError::LogFileMissing {
                path: log_guard.path().to_path_buf(),
            }
            .into());
        }
    };

    match classify_log(&log_text) {
        LogDiagnosis::PermissionDenied if single_object => {
            debug!(filter, "object excluded by license");
            Ok(LicenseStatus::Unlicensed)
        }
        LogDiagnosis::PermissionDenied => Err(ExportError::LicenseDenied { log: log_text }.into()),
        LogDiagnosis::NoServiceTier => Err(ExportError::NoServiceTier { log: log_text }.into()),
        LogDiagnosis::Other => Err(ExportError::ExportFailed {
            filter: filter.to_string(),
            log: log_text,
        }
        .into()),
    }
}

/// Run one `designobject` invocation: open the C/AL designer for an object
/// in the tool's own UI process and wait for the designer to close.
pub(crate) async fn design_object(
    env: &NavEnvironment,
    oref: crate::types::ObjectReference,
    cancel: &CancellationToken,
) -> Result<()> {
    let executable = env.finsql_executable()?;
    let log_guard = TempArtifact::new(unique_temp_path("nav-design-log-", "log"));
    let arguments = design_arguments(env, oref, log_guard.path());

    let mut child = process::launch(&executable, &arguments, false)?;
    let status = match process::wait_with_cancellation(&mut child, cancel).await {
        Ok(status) => status,
        Err(e) => {
            process::try_end_process(&mut child).await;
            return Err(e);
        }
    };
    debug!(object = %oref, exit_code = status.code(), "designer session ended");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::SqlAuth;
    use crate::error::Error;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    fn fake_finsql(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("finsql");
        let script = format!(
            "#!/bin/sh\n\
             args=\"$1\"\n\
             target=$(printf '%s' \"$args\" | sed -n 's/.* file=\"\\([^\"]*\\)\".*/\\1/p')\n\
             logfile=$(printf '%s' \"$args\" | sed -n 's/.*logfile=\"\\([^\"]*\\)\".*/\\1/p')\n\
             {body}\n"
        );
        std::fs::write(&path, script).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn env_with_tool(tool: PathBuf) -> NavEnvironment {
        NavEnvironment {
            auth: SqlAuth::Credentials {
                username: "sa".into(),
                password: "secret".into(),
            },
            finsql_path: Some(tool),
            ..NavEnvironment::new("navsql01", "CRONUS")
        }
    }

    #[tokio::test]
    async fn stderr_takes_precedence_over_exit_zero() {
        let dir = tempfile::TempDir::new().unwrap();
        let tool = fake_finsql(
            dir.path(),
            "echo exported > \"$target\"\necho 'warning: incomplete' 1>&2\nexit 0",
        );
        let env = env_with_tool(tool);
        let target = dir.path().join("out.txt");

        let result = export_filter(
            &env,
            VariantPolicy::nav2013(),
            "ID=1..10",
            false,
            &target,
            &CancellationToken::new(),
        )
        .await;

        match result {
            Err(Error::Export(ExportError::ToolStderr { stderr })) => {
                assert!(stderr.contains("warning: incomplete"));
            }
            other => panic!("expected ToolStderr, got {other:?}"),
        }
        // The partially written target must be cleaned up.
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn log_file_missing_when_tool_writes_no_log() {
        let dir = tempfile::TempDir::new().unwrap();
        let tool = fake_finsql(dir.path(), "exit 1");
        let env = env_with_tool(tool);
        let target = dir.path().join("out.txt");

        let result = export_filter(
            &env,
            VariantPolicy::nav2013(),
            "ID=1..10",
            false,
            &target,
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(
            result,
            Err(Error::Export(ExportError::LogFileMissing { .. }))
        ));
    }
}
