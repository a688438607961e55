//! finsql.exe argument assembly
//!
//! The tool takes a single argument string of comma-separated `key="value"`
//! pairs. Assembly is pure string building, kept separate from process
//! handling so the exact command lines can be unit tested.

use crate::config::{NavEnvironment, SqlAuth};
use crate::types::ObjectReference;
use std::path::Path;

/// Behavioral differences between NAV platform revisions
///
/// The revisions supported here differ in exactly one decision: whether a
/// multi-object export instructs the tool to silently skip unlicensed
/// objects, or fails the whole batch on encountering one. New revisions are
/// added by supplying a new policy value, not by branching on revision
/// identity inside the orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VariantPolicy {
    /// Skip unlicensed objects during multi-object export instead of
    /// failing the batch
    pub skip_unlicensed_on_batch: bool,
}

impl VariantPolicy {
    /// NAV 2013 behavior: a batch export fails hard on an unlicensed object
    pub fn nav2013() -> Self {
        Self {
            skip_unlicensed_on_batch: false,
        }
    }

    /// NAV 2015 (and newer) behavior: a batch export silently skips
    /// unlicensed objects
    pub fn nav2015() -> Self {
        Self {
            skip_unlicensed_on_batch: true,
        }
    }
}

/// Render one ` key="value"` pair.
fn param(name: &str, value: &str) -> String {
    format!(" {name}=\"{value}\"")
}

/// Append the authentication parameters: `ntauthentication="1"` for
/// integrated auth, otherwise `ntauthentication="0"` plus explicit
/// credentials. Never both forms.
fn push_auth(parts: &mut Vec<String>, env: &NavEnvironment) {
    match &env.auth {
        SqlAuth::Integrated => {
            parts.push(param("ntauthentication", "1"));
        }
        SqlAuth::Credentials { username, password } => {
            parts.push(param("ntauthentication", "0"));
            parts.push(param("username", username));
            parts.push(param("password", password));
        }
    }
}

/// Assemble the argument string for an `exportobjects` invocation.
///
/// The unlicensed-skip flag is appended only for multi-object export under a
/// skip-unlicensed variant. Single-object export never gets the flag: that
/// path needs the export to fail so license status can be inspected.
pub(crate) fn export_arguments(
    env: &NavEnvironment,
    variant: VariantPolicy,
    filter: &str,
    single_object: bool,
    target: &Path,
    log_file: &Path,
) -> String {
    let mut parts = vec![
        param("command", "exportobjects"),
        param("filter", filter),
        param("file", &target.display().to_string()),
        param("servername", &env.db_server),
        param("database", &env.db_name),
    ];
    push_auth(&mut parts, env);
    parts.push(param("logfile", &log_file.display().to_string()));
    if variant.skip_unlicensed_on_batch && !single_object {
        parts.push(param("ExportTxtSkipUnlicensed", "1"));
    }
    parts.join(",")
}

/// Assemble the argument string for a `designobject` invocation, which opens
/// the C/AL designer for one object (e.g. `designobject="Page 21"`).
pub(crate) fn design_arguments(
    env: &NavEnvironment,
    oref: ObjectReference,
    log_file: &Path,
) -> String {
    let mut parts = vec![
        param("designobject", &oref.to_string()),
        param("servername", &env.db_server),
        param("database", &env.db_name),
    ];
    push_auth(&mut parts, env);
    parts.push(param("logfile", &log_file.display().to_string()));
    parts.join(",")
}
