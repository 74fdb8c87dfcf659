//! Environment configuration for the sync workflow
//!
//! Values come from the process environment; a `.env` file in the working
//! directory is loaded first when present.

use std::path::PathBuf;

use crate::error::SyncScriptError;
use crate::sqlpackage::ConnectionDescriptor;

/// Default name of the final script inside the output directory
pub const DEFAULT_FINAL_SCRIPT_NAME: &str = "storedProcedures.sql";
/// Default output directory
pub const DEFAULT_OUTPUT_DIR: &str = "output";

const REQUIRED_VARS: [&str; 6] = [
    "SERVER",
    "SQL_USERNAME",
    "SQL_PASSWORD",
    "SOURCE_DB",
    "TARGET_DB",
    "SQL_PACKAGE_PATH",
];

/// Settings for one sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub server: String,
    pub username: String,
    pub password: String,
    pub source_db: String,
    pub target_db: String,
    pub sqlpackage_path: PathBuf,
    pub final_script_name: String,
    pub output_dir: PathBuf,
}

impl SyncConfig {
    /// Load from the environment, reading `.env` first if it exists.
    pub fn from_env() -> Result<Self, SyncScriptError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    ///
    /// Every missing required variable is reported in a single error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SyncScriptError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|name| get(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(SyncScriptError::MissingEnvironment {
                names: missing.join(", "),
            });
        }

        let required = |name: &str| get(name).unwrap_or_default();
        Ok(Self {
            server: required("SERVER"),
            username: required("SQL_USERNAME"),
            password: required("SQL_PASSWORD"),
            source_db: required("SOURCE_DB"),
            target_db: required("TARGET_DB"),
            sqlpackage_path: PathBuf::from(required("SQL_PACKAGE_PATH")),
            final_script_name: get("FINAL_SCRIPT_NAME")
                .unwrap_or_else(|| DEFAULT_FINAL_SCRIPT_NAME.to_string()),
            output_dir: get("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        })
    }

    /// Connection to the database the schema is copied from.
    pub fn source(&self) -> ConnectionDescriptor {
        self.connection(&self.source_db)
    }

    /// Connection to the database the script will be run against.
    pub fn target(&self) -> ConnectionDescriptor {
        self.connection(&self.target_db)
    }

    fn connection(&self, database: &str) -> ConnectionDescriptor {
        ConnectionDescriptor {
            server: self.server.clone(),
            database: database.to_string(),
            user: self.username.clone(),
            password: self.password.clone(),
        }
    }
}
