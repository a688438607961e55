//! Failure classification for finsql.exe log output
//!
//! finsql.exe reports failure details only as human-readable text in the
//! file named by its `logfile` argument. Classification works by matching
//! fixed substrings of that text, in priority order.
//!
//! Known limitation: the markers are the English-language messages emitted
//! by the tool. A localized finsql.exe writes different text, and every
//! failure then falls through to the generic category. The tool provides no
//! structured error codes to classify on instead.

/// Log marker for an object excluded by the active license
pub(crate) const PERMISSION_DENIED_MARKER: &str = "You do not have permission to read the";

/// Log marker for a database with no registered service tier
pub(crate) const NO_SERVICE_TIER_MARKER: &str =
    "There are no NAV Server instances available for this database";

/// Log marker for a database registered with several service tiers
pub(crate) const AMBIGUOUS_SERVICE_TIER_MARKER: &str =
    "This database is registered with several NAV Server instances";

/// What the diagnostic log says went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogDiagnosis {
    /// An object is excluded by the active license
    PermissionDenied,
    /// No usable service tier (none registered, or several)
    NoServiceTier,
    /// Anything else
    Other,
}

/// Classify the diagnostic log text of a failed export.
pub(crate) fn classify_log(log_text: &str) -> LogDiagnosis {
    if log_text.contains(PERMISSION_DENIED_MARKER) {
        LogDiagnosis::PermissionDenied
    } else if log_text.contains(NO_SERVICE_TIER_MARKER)
        || log_text.contains(AMBIGUOUS_SERVICE_TIER_MARKER)
    {
        LogDiagnosis::NoServiceTier
    } else {
        LogDiagnosis::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_marker_is_recognized() {
        let log = "Error: You do not have permission to read the Codeunit object 50000.";
        assert_eq!(classify_log(log), LogDiagnosis::PermissionDenied);
    }

    #[test]
    fn missing_service_tier_marker_is_recognized() {
        let log = "There are no NAV Server instances available for this database.";
        assert_eq!(classify_log(log), LogDiagnosis::NoServiceTier);
    }

    #[test]
    fn ambiguous_service_tier_marker_is_recognized() {
        let log = "This database is registered with several NAV Server instances. \
                   Specify the instance to use.";
        assert_eq!(classify_log(log), LogDiagnosis::NoServiceTier);
    }

    #[test]
    fn permission_marker_takes_priority_over_service_tier_markers() {
        let log = "You do not have permission to read the Table object 18.\n\
                   There are no NAV Server instances available for this database.";
        assert_eq!(classify_log(log), LogDiagnosis::PermissionDenied);
    }

    #[test]
    fn unrecognized_log_text_is_other() {
        assert_eq!(
            classify_log("The object file could not be written."),
            LogDiagnosis::Other
        );
        assert_eq!(classify_log(""), LogDiagnosis::Other);
    }

    #[test]
    fn marker_matching_is_case_sensitive() {
        // The tool emits fixed-case English text; lowercased variants are
        // not the tool's own messages and must not match.
        assert_eq!(
            classify_log("you do not have permission to read the object"),
            LogDiagnosis::Other
        );
    }
}
