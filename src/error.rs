//! Error types for nav-adapter
//!
//! The taxonomy separates caller bugs (invalid filters, bad request shape)
//! from environment problems (missing finsql.exe, database connectivity) and
//! from classified export failures. Mid-export failures are never surfaced as
//! a raw exit code: the orchestrator reads the tool's diagnostic log and maps
//! it to a concrete [`ExportError`] variant before returning.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for nav-adapter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for nav-adapter
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid id range or version list filter (caller bug, not retryable)
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    /// Malformed export request (e.g. target file without a `.txt` extension)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The development client executable could not be started
    #[error("cannot launch {}: {reason}", path.display())]
    LaunchFailed {
        /// The executable path that failed to launch
        path: PathBuf,
        /// Why the launch failed (path does not resolve, OS refused, ...)
        reason: String,
    },

    /// The operation was cancelled by the caller. No artifact is produced.
    #[error("operation cancelled")]
    Cancelled,

    /// A classified export failure (see [`ExportError`])
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// TDS protocol or SQL Server error from a metadata query
    #[error("database error: {0}")]
    Database(#[from] tiberius::error::Error),

    /// A metadata query returned a row we could not interpret
    #[error("metadata query error: {0}")]
    Metadata(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g. "auth")
        key: Option<String>,
    },
}

/// Validation errors for id ranges and version list filters
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// An id range with no bounds at all, or with lower > upper
    #[error("invalid id range: lower={lower:?}, upper={upper:?}")]
    InvalidRange {
        /// The rejected lower bound
        lower: Option<i32>,
        /// The rejected upper bound
        upper: Option<i32>,
    },

    /// A version list filter whose pattern is empty or pure whitespace
    #[error("version list filter pattern must not be empty")]
    EmptyPattern,
}

/// Classified export failures
///
/// Produced by the orchestrator from the tool's exit code, captured stderr
/// and the diagnostic log file. The log-based variants carry the raw log
/// text so callers can show the tool's own description of the failure.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The tool wrote to stderr. This takes precedence over the exit code:
    /// finsql.exe has been observed to exit 0 after writing a warning that
    /// marks an incomplete export.
    #[error("export tool wrote to stderr: {stderr}")]
    ToolStderr {
        /// The captured stderr text
        stderr: String,
    },

    /// Exit code 0 but the target file does not exist. Known symptom of
    /// invoking a finsql.exe older than NAV 2013.
    #[error(
        "export finished with exit code 0, but the export file '{}' does not exist; \
         possible cause is that finsql.exe is earlier than NAV 2013",
        path.display()
    )]
    MissingOutputFile {
        /// The expected target artifact path
        path: PathBuf,
    },

    /// Non-zero exit and the diagnostic log file could not be opened
    #[error("could not open export log file: {}", path.display())]
    LogFileMissing {
        /// The diagnostic log path named on the command line
        path: PathBuf,
    },

    /// One or more objects are excluded by the active license.
    ///
    /// Raised only for multi-object export; single-object export reports
    /// this as [`LicenseStatus::Unlicensed`](crate::types::LicenseStatus)
    /// instead of an error.
    #[error("export failed with the following log messages:\n{log}")]
    LicenseDenied {
        /// The diagnostic log text
        log: String,
    },

    /// No service tier is registered for the database, or several are and
    /// the tool cannot pick one
    #[error("export failed with the following log message:\n{log}")]
    NoServiceTier {
        /// The diagnostic log text
        log: String,
    },

    /// Unclassified non-zero exit with log text
    #[error("export with filter '{filter}' failed with the following log messages:\n{log}")]
    ExportFailed {
        /// The object filter that was being exported
        filter: String,
        /// The diagnostic log text
        log: String,
    },
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_error_converts_to_top_level_error() {
        let err: Error = FilterError::EmptyPattern.into();
        assert!(matches!(err, Error::Filter(FilterError::EmptyPattern)));
    }

    #[test]
    fn export_error_converts_to_top_level_error() {
        let err: Error = ExportError::LicenseDenied {
            log: "denied".into(),
        }
        .into();
        assert!(matches!(
            err,
            Error::Export(ExportError::LicenseDenied { .. })
        ));
    }

    #[test]
    fn invalid_range_display_includes_bounds() {
        let err = FilterError::InvalidRange {
            lower: Some(10),
            upper: Some(5),
        };
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains('5'));
    }

    #[test]
    fn missing_output_file_display_names_the_path() {
        let err = ExportError::MissingOutputFile {
            path: PathBuf::from("/tmp/export.txt"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/export.txt"));
        assert!(msg.contains("exit code 0"));
    }

    #[test]
    fn export_failed_display_includes_filter_and_log() {
        let err = ExportError::ExportFailed {
            filter: "ID=1..10".into(),
            log: "something broke".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ID=1..10"));
        assert!(msg.contains("something broke"));
    }

    #[test]
    fn cancelled_is_not_an_export_error() {
        let err = Error::Cancelled;
        assert!(!matches!(err, Error::Export(_)));
        assert_eq!(err.to_string(), "operation cancelled");
    }
}
