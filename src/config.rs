//! Configuration types for nav-adapter

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

fn default_db_port() -> u16 {
    1433
}

fn default_connect_timeout_secs() -> u64 {
    6
}

/// SQL Server authentication mode
///
/// The type makes "integrated and explicit credentials at the same time"
/// unrepresentable: finsql.exe is given either `ntauthentication="1"` or
/// `ntauthentication="0"` plus a username and password, never both.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SqlAuth {
    /// Windows integrated authentication
    #[default]
    Integrated,
    /// Explicit SQL Server credentials
    Credentials {
        /// SQL Server login name
        username: String,
        /// SQL Server password
        password: String,
    },
}

/// A Dynamics NAV environment: the application database coordinates plus the
/// development client executable used for exports.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavEnvironment {
    /// Database server host name (optionally `host\instance`)
    pub db_server: String,

    /// TDS port for direct metadata queries (default: 1433).
    /// Not passed to finsql.exe, which resolves the server on its own.
    #[serde(default = "default_db_port")]
    pub db_port: u16,

    /// Application database name
    pub db_name: String,

    /// Authentication mode (default: integrated)
    #[serde(default)]
    pub auth: SqlAuth,

    /// Path to finsql.exe. When `None`, the executable is searched in PATH.
    #[serde(default)]
    pub finsql_path: Option<PathBuf>,

    /// Database connect timeout in seconds (default: 6)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl NavEnvironment {
    /// Create an environment with integrated authentication and defaults for
    /// everything but the database coordinates.
    pub fn new(db_server: impl Into<String>, db_name: impl Into<String>) -> Self {
        Self {
            db_server: db_server.into(),
            db_port: default_db_port(),
            db_name: db_name.into(),
            auth: SqlAuth::Integrated,
            finsql_path: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }

    /// Returns `true` when the environment uses Windows integrated
    /// authentication.
    pub fn is_nt_authentication(&self) -> bool {
        matches!(self.auth, SqlAuth::Integrated)
    }

    /// Database connect timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Resolve the finsql.exe executable: the configured path if set,
    /// otherwise a PATH lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LaunchFailed`] when no path is configured and the
    /// executable is not found in PATH. An explicitly configured path is
    /// returned as-is; its existence is checked at launch time.
    pub fn finsql_executable(&self) -> Result<PathBuf> {
        match &self.finsql_path {
            Some(path) => Ok(path.clone()),
            None => which::which("finsql.exe").map_err(|e| Error::LaunchFailed {
                path: PathBuf::from("finsql.exe"),
                reason: format!("not found in PATH: {e}"),
            }),
        }
    }

    /// Build the TDS client configuration for direct metadata queries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for integrated authentication: the TDS
    /// client used here requires explicit SQL Server credentials. Integrated
    /// authentication is still honored for finsql.exe invocations, which
    /// authenticate on their own.
    pub(crate) fn tds_config(&self) -> Result<tiberius::Config> {
        let mut config = tiberius::Config::new();
        config.host(&self.db_server);
        config.port(self.db_port);
        config.database(&self.db_name);
        config.trust_cert();
        match &self.auth {
            SqlAuth::Credentials { username, password } => {
                config.authentication(tiberius::AuthMethod::sql_server(username, password));
            }
            SqlAuth::Integrated => {
                return Err(Error::Config {
                    message: "direct metadata queries require explicit SQL Server credentials; \
                              integrated authentication is only supported for finsql.exe \
                              invocations"
                        .into(),
                    key: Some("auth".into()),
                });
            }
        }
        Ok(config)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn credentials_env() -> NavEnvironment {
        NavEnvironment {
            auth: SqlAuth::Credentials {
                username: "sa".into(),
                password: "secret".into(),
            },
            ..NavEnvironment::new("navsql01", "CRONUS")
        }
    }

    #[test]
    fn new_defaults_to_integrated_auth() {
        let env = NavEnvironment::new("navsql01", "CRONUS");
        assert!(env.is_nt_authentication());
        assert_eq!(env.db_port, 1433);
        assert_eq!(env.connect_timeout(), Duration::from_secs(6));
        assert!(env.finsql_path.is_none());
    }

    #[test]
    fn credentials_auth_is_not_nt_authentication() {
        assert!(!credentials_env().is_nt_authentication());
    }

    #[test]
    fn tds_config_rejects_integrated_auth() {
        let env = NavEnvironment::new("navsql01", "CRONUS");
        match env.tds_config() {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("auth")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn tds_config_accepts_explicit_credentials() {
        assert!(credentials_env().tds_config().is_ok());
    }

    #[test]
    fn explicit_finsql_path_wins_over_path_lookup() {
        let env = NavEnvironment {
            finsql_path: Some(PathBuf::from(r"C:\NAV\finsql.exe")),
            ..NavEnvironment::new("navsql01", "CRONUS")
        };
        assert_eq!(
            env.finsql_executable().unwrap(),
            PathBuf::from(r"C:\NAV\finsql.exe")
        );
    }

    #[test]
    fn environment_deserializes_with_defaults() {
        let env: NavEnvironment = serde_json::from_str(
            r#"{"db_server": "navsql01", "db_name": "CRONUS"}"#,
        )
        .unwrap();
        assert_eq!(env.db_server, "navsql01");
        assert_eq!(env.db_name, "CRONUS");
        assert_eq!(env.auth, SqlAuth::Integrated);
        assert_eq!(env.connect_timeout_secs, 6);
    }

    #[test]
    fn auth_serializes_with_mode_tag() {
        let json = serde_json::to_string(&SqlAuth::Credentials {
            username: "sa".into(),
            password: "secret".into(),
        })
        .unwrap();
        assert!(json.contains(r#""mode":"credentials""#));
    }
}
