//! The adapter surface for one NAV environment
//!
//! [`NavAdapter`] is the seam callers program against; [`FinsqlAdapter`] is
//! the implementation that drives finsql.exe for object export and reads the
//! application database for metadata. One adapter value serves one
//! environment; platform revision differences are captured at construction
//! as a [`VariantPolicy`].

use crate::config::NavEnvironment;
use crate::db;
use crate::error::{Error, Result};
use crate::filter::{ObjectIdRange, VersionListFilter};
use crate::finsql::{self, unique_temp_path, TempArtifact, VariantPolicy};
use crate::types::{LicenseStatus, ObjectMetadata, ObjectReference, ServiceTier};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Operations against one NAV environment
///
/// Export operations shell out to the environment's finsql.exe; metadata
/// operations query the application database directly. All long-running
/// operations take a [`CancellationToken`]; callers wanting a timeout cancel
/// the token from a timer.
#[async_trait]
pub trait NavAdapter: Send + Sync {
    /// Export a single object as C/AL text into `out`.
    ///
    /// An object excluded by the active license is a normal outcome here:
    /// the method returns [`LicenseStatus::Unlicensed`] and writes nothing.
    async fn export_single(
        &self,
        oref: ObjectReference,
        out: &mut (dyn AsyncWrite + Send + Unpin),
        cancel: &CancellationToken,
    ) -> Result<LicenseStatus>;

    /// Export every object in the given id ranges into `file_path`.
    ///
    /// The target must have a `.txt` extension; finsql.exe silently switches
    /// to its binary `.fob` format for anything else.
    async fn export_multiple(
        &self,
        ranges: &[ObjectIdRange],
        file_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Open the C/AL designer for one object and wait for it to close.
    async fn design_object(&self, oref: ObjectReference) -> Result<()>;

    /// Fetch metadata for every object in the given id ranges, minus objects
    /// whose version list matches one of the exclusion patterns.
    async fn object_metadata(
        &self,
        ranges: &[ObjectIdRange],
        version_exclusions: &[VersionListFilter],
        cancel: &CancellationToken,
    ) -> Result<HashSet<ObjectMetadata>>;

    /// Fetch the service tier registrations for the environment's database.
    async fn service_tiers(&self, cancel: &CancellationToken) -> Result<Vec<ServiceTier>>;

    /// Probe the environment and report everything wrong with it.
    ///
    /// Never fails: each problem becomes one human-readable string, an empty
    /// list means the environment looks usable.
    async fn test(&self, cancel: &CancellationToken) -> Vec<String>;
}

/// [`NavAdapter`] implementation backed by finsql.exe and a TDS connection
#[derive(Debug, Clone)]
pub struct FinsqlAdapter {
    env: NavEnvironment,
    variant: VariantPolicy,
}

impl FinsqlAdapter {
    /// Adapter for a NAV 2013 environment (batch export fails hard on an
    /// unlicensed object).
    pub fn nav2013(env: NavEnvironment) -> Self {
        Self {
            env,
            variant: VariantPolicy::nav2013(),
        }
    }

    /// Adapter for a NAV 2015 (or newer) environment (batch export silently
    /// skips unlicensed objects).
    pub fn nav2015(env: NavEnvironment) -> Self {
        Self {
            env,
            variant: VariantPolicy::nav2015(),
        }
    }

    /// The environment this adapter serves
    pub fn environment(&self) -> &NavEnvironment {
        &self.env
    }

    /// The revision policy this adapter applies
    pub fn variant(&self) -> VariantPolicy {
        self.variant
    }
}

#[async_trait]
impl NavAdapter for FinsqlAdapter {
    async fn export_single(
        &self,
        oref: ObjectReference,
        out: &mut (dyn AsyncWrite + Send + Unpin),
        cancel: &CancellationToken,
    ) -> Result<LicenseStatus> {
        let filter = format!("Type={};ID={}", oref.object_type, oref.id);
        // The tool must create this file itself; pre-creating it would blind
        // the missing-output check.
        let target = TempArtifact::new(unique_temp_path("nav-export-", "txt"));

        let status =
            finsql::export_filter(&self.env, self.variant, &filter, true, target.path(), cancel)
                .await?;

        if status.is_licensed() {
            let mut exported = tokio::fs::File::open(target.path()).await?;
            tokio::io::copy(&mut exported, out).await?;
            out.flush().await?;
        }
        Ok(status)
    }

    async fn export_multiple(
        &self,
        ranges: &[ObjectIdRange],
        file_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let is_txt = file_path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("txt"));
        if !is_txt {
            return Err(Error::InvalidRequest(format!(
                "export target must be a .txt file: {}",
                file_path.display()
            )));
        }

        let expression = ObjectIdRange::nav_filter_expression(ranges);
        let filter = if expression.is_empty() {
            String::new()
        } else {
            format!("ID={expression}")
        };

        finsql::export_filter(&self.env, self.variant, &filter, false, file_path, cancel)
            .await
            .map(|_| ())
    }

    async fn design_object(&self, oref: ObjectReference) -> Result<()> {
        // The designer is interactive; it runs until the operator closes it,
        // with no external cancellation.
        let never = CancellationToken::new();
        finsql::design_object(&self.env, oref, &never).await
    }

    async fn object_metadata(
        &self,
        ranges: &[ObjectIdRange],
        version_exclusions: &[VersionListFilter],
        cancel: &CancellationToken,
    ) -> Result<HashSet<ObjectMetadata>> {
        db::object_metadata(&self.env, ranges, version_exclusions, cancel).await
    }

    async fn service_tiers(&self, cancel: &CancellationToken) -> Result<Vec<ServiceTier>> {
        db::service_tiers(&self.env, cancel).await
    }

    async fn test(&self, cancel: &CancellationToken) -> Vec<String> {
        let mut problems = Vec::new();

        match self.env.finsql_executable() {
            Ok(path) if path.is_file() => {}
            Ok(path) => {
                problems.push(format!(
                    "development environment client is not a file: {}",
                    path.display()
                ));
            }
            Err(e) => problems.push(e.to_string()),
        }

        if let Err(e) = db::probe(&self.env, cancel).await {
            problems.push(format!("database connectivity: {e}"));
        }

        if problems.is_empty() {
            info!(server = %self.env.db_server, database = %self.env.db_name, "environment probe passed");
        }
        problems
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn export_multiple_rejects_non_txt_target() {
        let adapter = FinsqlAdapter::nav2015(NavEnvironment::new("navsql01", "CRONUS"));
        let result = adapter
            .export_multiple(&[], &PathBuf::from("/tmp/objects.fob"), &CancellationToken::new())
            .await;
        match result {
            Err(Error::InvalidRequest(message)) => {
                assert!(message.contains("objects.fob"));
            }
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn export_multiple_accepts_uppercase_txt_extension() {
        // Validation passes; the error must come from the launch stage, not
        // the extension check.
        let env = NavEnvironment {
            finsql_path: Some(PathBuf::from("/nonexistent/finsql.exe")),
            ..NavEnvironment::new("navsql01", "CRONUS")
        };
        let adapter = FinsqlAdapter::nav2013(env);
        let result = adapter
            .export_multiple(&[], &PathBuf::from("/tmp/OBJECTS.TXT"), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(Error::LaunchFailed { .. })));
    }

    #[test]
    fn constructors_select_the_revision_policy() {
        let env = NavEnvironment::new("navsql01", "CRONUS");
        assert!(!FinsqlAdapter::nav2013(env.clone()).variant().skip_unlicensed_on_batch);
        assert!(FinsqlAdapter::nav2015(env).variant().skip_unlicensed_on_batch);
    }
}
