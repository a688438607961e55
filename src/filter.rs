//! Object id ranges and version list filters
//!
//! These value types render into two textual query languages: a SQL
//! predicate fragment for the `dbo.Object` metadata query, and NAV's own
//! filter syntax for finsql.exe (`1..50000|100000..` for ranges,
//! `<>PATTERN` for version exclusions). Version patterns are rendered as
//! bound `NOT LIKE` parameters, never spliced into the SQL text, since they
//! are user-supplied.

use crate::error::{FilterError, Result};

/// The SQL tautology used when a filter set is empty
const SQL_TAUTOLOGY: &str = "1=1";

/// A contiguous, inclusive range of NAV object ids
///
/// Either bound may be absent (open range), but not both; when both are
/// present, `lower <= upper` must hold. Validated at construction and
/// immutable afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectIdRange {
    lower: Option<i32>,
    upper: Option<i32>,
}

impl ObjectIdRange {
    /// Create a validated id range.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidRange`] when both bounds are absent or
    /// when `lower > upper`.
    pub fn new(lower: Option<i32>, upper: Option<i32>) -> Result<Self> {
        if lower.is_none() && upper.is_none() {
            return Err(FilterError::InvalidRange { lower, upper }.into());
        }
        if let (Some(lo), Some(hi)) = (lower, upper) {
            if lo > hi {
                return Err(FilterError::InvalidRange { lower, upper }.into());
            }
        }
        Ok(Self { lower, upper })
    }

    /// The lower bound, if any
    pub fn lower(&self) -> Option<i32> {
        self.lower
    }

    /// The upper bound, if any
    pub fn upper(&self) -> Option<i32> {
        self.upper
    }

    /// Render a set of ranges as a SQL predicate over the `ID` column.
    ///
    /// An empty set renders as the tautology `1=1`; otherwise the per-range
    /// predicates are OR-joined.
    pub fn sql_predicate(ranges: &[ObjectIdRange]) -> String {
        if ranges.is_empty() {
            return SQL_TAUTOLOGY.to_string();
        }
        ranges
            .iter()
            .map(ObjectIdRange::sql_fragment)
            .collect::<Vec<_>>()
            .join(" OR ")
    }

    /// Render a set of ranges in NAV filter syntax, `|`-joined
    /// (e.g. `..17|19..36|50003..`). An empty set renders as an empty
    /// string.
    pub fn nav_filter_expression(ranges: &[ObjectIdRange]) -> String {
        ranges
            .iter()
            .map(ObjectIdRange::nav_fragment)
            .collect::<Vec<_>>()
            .join("|")
    }

    fn sql_fragment(&self) -> String {
        match (self.lower, self.upper) {
            (Some(lo), Some(hi)) => format!("({lo} <= ID AND ID <= {hi})"),
            (None, Some(hi)) => format!("ID <= {hi}"),
            (Some(lo), None) => format!("{lo} <= ID"),
            // unreachable by construction
            (None, None) => SQL_TAUTOLOGY.to_string(),
        }
    }

    fn nav_fragment(&self) -> String {
        match (self.lower, self.upper) {
            (Some(lo), Some(hi)) => format!("{lo}..{hi}"),
            (None, Some(hi)) => format!("..{hi}"),
            (Some(lo), None) => format!("{lo}.."),
            (None, None) => String::new(),
        }
    }
}

impl std::fmt::Display for ObjectIdRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.nav_fragment())
    }
}

/// A text pattern matched against NAV's version list, used to exclude
/// tagged object variants from exports and metadata queries
///
/// The pattern may contain `*` wildcards. Non-empty by construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VersionListFilter {
    pattern: String,
}

impl VersionListFilter {
    /// Create a validated version list filter.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::EmptyPattern`] when the pattern is empty or
    /// pure whitespace.
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if pattern.trim().is_empty() {
            return Err(FilterError::EmptyPattern.into());
        }
        Ok(Self { pattern })
    }

    /// The raw pattern, with `*` wildcards untranslated
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Render a set of exclusions as a parameterized SQL predicate over the
    /// `[Version List]` column.
    ///
    /// Returns the AND-joined `NOT LIKE` clause plus one bound parameter
    /// value per exclusion, in clause order, with `*` translated to SQL `%`
    /// and no other characters altered. An empty set renders as the
    /// tautology `1=1` with no parameters.
    pub fn sql_predicate(exclusions: &[VersionListFilter]) -> (String, Vec<String>) {
        if exclusions.is_empty() {
            return (SQL_TAUTOLOGY.to_string(), Vec::new());
        }
        let clause = (0..exclusions.len())
            .map(|i| format!("[Version List] NOT LIKE {}", Self::sql_parameter_name(i)))
            .collect::<Vec<_>>()
            .join(" AND ");
        let parameters = exclusions
            .iter()
            .map(|exclusion| exclusion.pattern.replace('*', "%"))
            .collect();
        (clause, parameters)
    }

    /// Render a set of exclusions in NAV filter syntax, `&`-joined
    /// (e.g. `<>NAVW1*&<>MyMod*`). An empty set renders as an empty string.
    pub fn nav_filter_expression(exclusions: &[VersionListFilter]) -> String {
        exclusions
            .iter()
            .map(|exclusion| format!("<>{}", exclusion.pattern))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// The name of the i'th version list parameter
    fn sql_parameter_name(i: usize) -> String {
        format!("@versionFilter{i}")
    }
}

impl std::fmt::Display for VersionListFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pattern)
    }
}
