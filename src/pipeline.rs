//! The five-stage rewrite pipeline
//!
//! Each stage consumes the complete output of the previous one and leaves an
//! immutable snapshot behind in [`PipelineOutput`], so any stage can be
//! inspected or tested on its own.

use crate::error::SyncScriptError;
use crate::model::{build_sections, AssembledScript, ClassifiedScript};
use crate::parser::{classify_script, strip_noise};
use crate::script::{add_verification_probes, make_idempotent};

/// Pipeline context over one raw script
#[derive(Debug, Clone)]
pub struct Pipeline<'a> {
    raw: &'a str,
    verbose: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            verbose: false,
        }
    }

    /// Print a line per stage while running.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Run every stage in order.
    ///
    /// Stops at the first stage that fails; no partial output is returned.
    pub fn run(self) -> Result<PipelineOutput, SyncScriptError> {
        let cleaned = strip_noise(self.raw)?;
        if self.verbose {
            println!(
                "Stripped noise: {} -> {} bytes",
                self.raw.len(),
                cleaned.len()
            );
        }

        let classified = classify_script(&cleaned)?;
        if self.verbose {
            println!(
                "Classified {} functions, {} procedures, {} drop statements",
                classified.functions.len(),
                classified.procedures.len(),
                classified.drops.len()
            );
        }

        let assembled = build_sections(&classified);
        let filtered = assembled.render();
        if self.verbose && (assembled.duplicates_removed > 0 || assembled.drops_superseded > 0) {
            println!(
                "Removed {} duplicate definitions and {} superseded drops",
                assembled.duplicates_removed, assembled.drops_superseded
            );
        }

        let rewritten = make_idempotent(&filtered)?;
        let verified = add_verification_probes(&rewritten)?;
        if self.verbose {
            println!("Rewrote script: {} bytes", verified.len());
        }

        Ok(PipelineOutput {
            cleaned,
            classified,
            assembled,
            filtered,
            rewritten,
            verified,
        })
    }
}

/// Run the full pipeline quietly.
pub fn run_pipeline(raw: &str) -> Result<PipelineOutput, SyncScriptError> {
    Pipeline::new(raw).run()
}

/// Snapshots left behind by each stage
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Noise stripper output
    pub cleaned: String,
    /// Classifier output
    pub classified: ClassifiedScript,
    /// Sections after dedup
    pub assembled: AssembledScript,
    /// Sectioned script text
    pub filtered: String,
    /// Drop-then-create form
    pub rewritten: String,
    /// Final artifact with verification probes
    pub verified: String,
}

impl PipelineOutput {
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            functions: self.assembled.functions.len(),
            procedures: self.assembled.procedures.len(),
            drops: self.assembled.drops.len(),
            duplicates_removed: self.assembled.duplicates_removed,
            drops_superseded: self.assembled.drops_superseded,
        }
    }
}

/// Object counts of the final script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub functions: usize,
    pub procedures: usize,
    pub drops: usize,
    pub duplicates_removed: usize,
    pub drops_superseded: usize,
}
