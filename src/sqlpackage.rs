//! SqlPackage invocation
//!
//! The schema diff itself is produced by the external `SqlPackage` tool in
//! two calls: extract a dacpac from the source database, then script the
//! changes needed to bring the target database in line with it.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::SyncScriptError;

/// Server, database and SQL login for one side of the comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub server: String,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl ConnectionDescriptor {
    /// ADO.NET connection string passed to SqlPackage.
    pub fn connection_string(&self) -> String {
        self.render(&self.password)
    }

    /// Connection string with the password replaced, for logging.
    pub fn masked_connection_string(&self) -> String {
        self.render("********")
    }

    fn render(&self, password: &str) -> String {
        format!(
            "Data Source={};Initial Catalog={};User ID={};Password={};TrustServerCertificate=True",
            self.server, self.database, self.user, password
        )
    }
}

/// Handle on a SqlPackage executable
#[derive(Debug, Clone)]
pub struct SqlPackage {
    executable: PathBuf,
    verbose: bool,
}

impl SqlPackage {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            verbose: false,
        }
    }

    /// Echo each command line (password masked) before running it.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Extract a dacpac from `source` into `dacpac_path`.
    pub fn extract(
        &self,
        source: &ConnectionDescriptor,
        dacpac_path: &Path,
    ) -> Result<(), SyncScriptError> {
        let args = vec![
            "/Action:Extract".to_string(),
            format!("/SourceConnectionString:{}", source.connection_string()),
            format!("/TargetFile:{}", dacpac_path.display()),
        ];
        let masked = vec![
            "/Action:Extract".to_string(),
            format!("/SourceConnectionString:{}", source.masked_connection_string()),
            format!("/TargetFile:{}", dacpac_path.display()),
        ];
        self.run("Extract", &args, &masked)
    }

    /// Script the changes that make `target` match `dacpac_path` into `output_path`.
    ///
    /// Objects missing from the dacpac are dropped from the target.
    pub fn script(
        &self,
        dacpac_path: &Path,
        target: &ConnectionDescriptor,
        output_path: &Path,
    ) -> Result<(), SyncScriptError> {
        let script_args = |connection: String| {
            vec![
                "/Action:Script".to_string(),
                format!("/SourceFile:{}", dacpac_path.display()),
                format!("/TargetConnectionString:{}", connection),
                format!("/OutputPath:{}", output_path.display()),
                "/p:DropObjectsNotInSource=True".to_string(),
            ]
        };
        self.run(
            "Script",
            &script_args(target.connection_string()),
            &script_args(target.masked_connection_string()),
        )
    }

    fn run(&self, action: &str, args: &[String], masked: &[String]) -> Result<(), SyncScriptError> {
        if self.verbose {
            println!("Running: {} {}", self.executable.display(), masked.join(" "));
        }

        let output = Command::new(&self.executable)
            .args(args)
            .output()
            .map_err(|e| SyncScriptError::SqlPackageLaunchError {
                path: self.executable.clone(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let diagnostics = [stderr.trim(), stdout.trim()]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            return Err(SyncScriptError::SqlPackageFailed {
                action: action.to_string(),
                code: output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none".to_string()),
                diagnostics,
            });
        }

        if self.verbose {
            println!("{} completed successfully", action);
        }

        Ok(())
    }
}
