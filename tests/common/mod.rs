//! Common test utilities for nav-adapter integration tests
//!
//! The real development environment client only exists on Windows, so the
//! tests drive shell-script stand-ins that parse the same single argument
//! string and act out one scenario each (write the target, write a log,
//! fail, hang).

use nav_adapter::{NavEnvironment, SqlAuth};
use std::path::PathBuf;
use tempfile::TempDir;

/// A scripted stand-in for finsql.exe inside its own temp directory.
///
/// Every invocation dumps the full argument string to `args.txt` so tests
/// can assert on the exact command line. The script body can use `$target`
/// and `$logfile`, pre-extracted from the argument string.
pub struct FakeTool {
    dir: TempDir,
    tool: PathBuf,
}

#[allow(dead_code)]
impl FakeTool {
    pub fn new(body: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let tool = dir.path().join("finsql");
        let args_file = dir.path().join("args.txt");
        // The space before `file=` keeps the pattern from matching `logfile=`.
        let script = format!(
            "#!/bin/sh\n\
             args=\"$1\"\n\
             printf '%s' \"$args\" > \"{args}\"\n\
             target=$(printf '%s' \"$args\" | sed -n 's/.* file=\"\\([^\"]*\\)\".*/\\1/p')\n\
             logfile=$(printf '%s' \"$args\" | sed -n 's/.*logfile=\"\\([^\"]*\\)\".*/\\1/p')\n\
             {body}\n",
            args = args_file.display(),
        );
        std::fs::write(&tool, script).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&tool).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&tool, perms).unwrap();
        }
        Self { dir, tool }
    }

    /// An environment wired to this fake tool, with explicit credentials.
    pub fn environment(&self) -> NavEnvironment {
        NavEnvironment {
            auth: SqlAuth::Credentials {
                username: "sa".into(),
                password: "secret".into(),
            },
            finsql_path: Some(self.tool.clone()),
            ..NavEnvironment::new("navsql01", "CRONUS")
        }
    }

    /// A scratch path inside the tool's temp directory.
    pub fn scratch(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// The full argument string of the last invocation.
    pub fn dumped_args(&self) -> String {
        std::fs::read_to_string(self.dir.path().join("args.txt")).unwrap()
    }

    /// The value of one `key="value"` pair from the last invocation.
    pub fn dumped_value(&self, key: &str) -> Option<String> {
        let args = self.dumped_args();
        let marker = format!(" {key}=\"");
        let start = args.find(&marker)? + marker.len();
        let rest = &args[start..];
        Some(rest[..rest.find('"')?].to_string())
    }
}
