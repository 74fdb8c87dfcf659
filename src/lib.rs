//! rust-sqlsync: idempotent sync scripts from SqlPackage output
//!
//! This library turns the deployment script SqlPackage generates for two
//! databases into a re-runnable script holding only the drops, functions
//! and procedures, each definition in drop-then-create form with a
//! verification probe after it.

pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod script;
pub mod sqlpackage;
mod util;

use std::path::{Path, PathBuf};

use anyhow::Result;

pub use config::SyncConfig;
pub use error::SyncScriptError;
pub use pipeline::{run_pipeline, Pipeline, PipelineOutput, PipelineStats};
pub use sqlpackage::{ConnectionDescriptor, SqlPackage};

/// File SqlPackage writes the raw script to
pub const RAW_SCRIPT_NAME: &str = "sync_script_main.sql";
/// Intermediate file holding the noise-stripped script
pub const CLEANED_SCRIPT_NAME: &str = "cleaned_sync_script.sql";
/// Intermediate file holding the sectioned script before rewriting
pub const FILTERED_SCRIPT_NAME: &str = "filtered_sync_script.sql";

/// Options for a full sync run against live databases
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub config: SyncConfig,
    /// Write the cleaned and filtered intermediate scripts next to the final one
    pub write_intermediates: bool,
    /// Enable verbose output
    pub verbose: bool,
}

/// Options for rewriting an existing SqlPackage script
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    /// Raw script produced by SqlPackage
    pub input_path: PathBuf,
    /// Where the final script is written
    pub output_path: PathBuf,
    /// Directory for the intermediate scripts, if wanted
    pub intermediates_dir: Option<PathBuf>,
    /// Enable verbose output
    pub verbose: bool,
}

/// Outcome of a run
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub final_path: PathBuf,
    pub stats: PipelineStats,
    /// Size of the raw script in bytes
    pub raw_size: u64,
    /// Size of the final script in bytes
    pub final_size: u64,
}

impl SyncReport {
    /// e.g. `Size reduction: 152.3KB -> 12.1KB (140.2KB saved)`
    pub fn size_summary(&self) -> String {
        let saved = self.raw_size as i64 - self.final_size as i64;
        format!(
            "Size reduction: {} -> {} ({:.1}KB saved)",
            util::format_kb(self.raw_size),
            util::format_kb(self.final_size),
            saved as f64 / 1024.0
        )
    }
}

/// Extract the source schema, script the diff against the target and
/// rewrite the result into the final sync script.
pub fn generate_sync_script(options: SyncOptions) -> Result<SyncReport> {
    let config = &options.config;
    let output_dir = &config.output_dir;

    std::fs::create_dir_all(output_dir).map_err(|e| SyncScriptError::OutputDirError {
        path: output_dir.clone(),
        source: e,
    })?;

    let dacpac_path = output_dir.join(format!("{}.dacpac", config.source_db));
    let script_path = output_dir.join(RAW_SCRIPT_NAME);
    let final_path = output_dir.join(&config.final_script_name);

    let sqlpackage = SqlPackage::new(&config.sqlpackage_path).verbose(options.verbose);

    if options.verbose {
        println!("Step 1: Extracting dacpac from {}", config.source_db);
    }
    sqlpackage.extract(&config.source(), &dacpac_path)?;

    if options.verbose {
        println!("Step 2: Generating sync script against {}", config.target_db);
    }
    sqlpackage.script(&dacpac_path, &config.target(), &script_path)?;

    if options.verbose {
        println!("Step 3: Rewriting {}", script_path.display());
    }
    let intermediates = options.write_intermediates.then_some(output_dir.as_path());
    process_script_file(&script_path, &final_path, intermediates, options.verbose)
}

/// Rewrite an existing SqlPackage script without touching any database.
pub fn rewrite_script_file(options: RewriteOptions) -> Result<SyncReport> {
    if let Some(parent) = options.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir(parent)?;
        }
    }
    if let Some(dir) = &options.intermediates_dir {
        create_dir(dir)?;
    }

    process_script_file(
        &options.input_path,
        &options.output_path,
        options.intermediates_dir.as_deref(),
        options.verbose,
    )
}

/// Run the pipeline over script text and return the final script.
pub fn process_script(raw: &str) -> Result<String> {
    Ok(run_pipeline(raw)?.verified)
}

fn process_script_file(
    input_path: &Path,
    final_path: &Path,
    intermediates_dir: Option<&Path>,
    verbose: bool,
) -> Result<SyncReport> {
    let raw = util::read_file_with_encoding_fallback(input_path).map_err(|e| {
        SyncScriptError::ScriptReadError {
            path: input_path.to_path_buf(),
            source: e,
        }
    })?;

    let output = Pipeline::new(&raw).verbose(verbose).run()?;

    // Final script first: intermediates never outlive a failed final write
    write_script(final_path, &output.verified, verbose)?;
    if let Some(dir) = intermediates_dir {
        write_script(&dir.join(CLEANED_SCRIPT_NAME), &output.cleaned, verbose)?;
        write_script(&dir.join(FILTERED_SCRIPT_NAME), &output.filtered, verbose)?;
    }

    let raw_size = std::fs::metadata(input_path)
        .map(|m| m.len())
        .unwrap_or(raw.len() as u64);

    let report = SyncReport {
        final_path: final_path.to_path_buf(),
        stats: output.stats(),
        raw_size,
        final_size: output.verified.len() as u64,
    };

    if verbose {
        println!(
            "Extracted {} functions, {} procedures and {} drop statements",
            report.stats.functions, report.stats.procedures, report.stats.drops
        );
        println!("{}", report.size_summary());
    }

    Ok(report)
}

fn create_dir(path: &Path) -> Result<(), SyncScriptError> {
    std::fs::create_dir_all(path).map_err(|e| SyncScriptError::OutputDirError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write through a sibling temp file so a failed write leaves no partial script.
fn write_script(path: &Path, content: &str, verbose: bool) -> Result<(), SyncScriptError> {
    let file_name = path.file_name().unwrap_or_default().to_string_lossy();
    let temp_path = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp_path, content)
        .and_then(|()| std::fs::rename(&temp_path, path))
        .map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            SyncScriptError::ScriptWriteError {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
    if verbose {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
