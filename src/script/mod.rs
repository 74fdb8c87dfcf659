//! Script rewriting: idempotent definitions and verification probes

mod rewriter;
mod verification;

pub use rewriter::make_idempotent;
pub use verification::{add_verification_probes, verification_probe, CREATED_MARKER, FAILED_MARKER};

use crate::parser::{terminate, Batch};

/// Render a batch so it always ends with exactly one terminator line.
///
/// Batches holding only whitespace or comments are returned as written.
fn render_statement_batch(batch: &Batch) -> String {
    if batch.first_statement_index().is_some() {
        terminate(&batch.text())
    } else {
        batch.render_terminated()
    }
}
