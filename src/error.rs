//! Error types for rust-sqlsync

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while producing a sync script
#[derive(Error, Debug)]
pub enum SyncScriptError {
    #[error("Failed to read SQL script: {path}")]
    ScriptReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write SQL script to {path}")]
    ScriptWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create output directory: {path}")]
    OutputDirError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unterminated block comment: reached end of script at line {line}")]
    UnterminatedComment { line: u64 },

    #[error("SQL tokenize error at line {line}: {message}")]
    TokenizeError { line: u64, message: String },

    #[error("Missing required environment variables: {names}")]
    MissingEnvironment { names: String },

    #[error("Failed to launch SqlPackage at {path}")]
    SqlPackageLaunchError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SqlPackage {action} failed (exit code {code}): {diagnostics}")]
    SqlPackageFailed {
        action: String,
        code: String,
        diagnostics: String,
    },
}

impl From<sqlparser::tokenizer::TokenizerError> for SyncScriptError {
    fn from(err: sqlparser::tokenizer::TokenizerError) -> Self {
        let line = err.location.line;
        if err.message.contains("multi-line comment") {
            SyncScriptError::UnterminatedComment { line }
        } else {
            SyncScriptError::TokenizeError {
                line,
                message: err.message,
            }
        }
    }
}
