use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use rust_sqlsync::{
    generate_sync_script, rewrite_script_file, RewriteOptions, SyncConfig, SyncOptions, SyncReport,
};

#[derive(Parser)]
#[command(name = "rust-sqlsync")]
#[command(author, version, about = "Idempotent sync scripts for SQL Server functions and procedures")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two databases with SqlPackage and write an idempotent sync script
    ///
    /// Connection settings are read from the environment (or a .env file):
    /// SERVER, SQL_USERNAME, SQL_PASSWORD, SOURCE_DB, TARGET_DB, SQL_PACKAGE_PATH.
    Sync {
        /// Output directory (overrides OUTPUT_DIR, default: output)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Name of the final script (overrides FINAL_SCRIPT_NAME, default: storedProcedures.sql)
        #[arg(short, long)]
        final_script_name: Option<String>,

        /// Do not write the cleaned and filtered intermediate scripts
        #[arg(long)]
        no_intermediates: bool,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Rewrite an existing SqlPackage script into an idempotent sync script
    Rewrite {
        /// Path to the SqlPackage-generated script
        #[arg(short, long)]
        input: PathBuf,

        /// Path of the final script
        #[arg(short, long)]
        output: PathBuf,

        /// Also write the cleaned and filtered intermediate scripts here
        #[arg(long)]
        intermediates_dir: Option<PathBuf>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Commands::Sync {
            output_dir,
            final_script_name,
            no_intermediates,
            verbose,
        } => {
            let mut config = SyncConfig::from_env()?;
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(name) = final_script_name {
                config.final_script_name = name;
            }

            generate_sync_script(SyncOptions {
                config,
                write_intermediates: !no_intermediates,
                verbose,
            })?
        }
        Commands::Rewrite {
            input,
            output,
            intermediates_dir,
            verbose,
        } => rewrite_script_file(RewriteOptions {
            input_path: input,
            output_path: output,
            intermediates_dir,
            verbose,
        })?,
    };

    print_summary(&report);

    Ok(())
}

fn print_summary(report: &SyncReport) {
    println!(
        "Final sync script: {} ({} functions, {} procedures, {} drops)",
        report.final_path.display(),
        report.stats.functions,
        report.stats.procedures,
        report.stats.drops
    );
    println!("{}", report.size_summary());
}
