//! Post-creation verification probes
//!
//! After each `CREATE FUNCTION|PROCEDURE` batch a probe batch is appended
//! that reports whether the object now exists:
//!
//! ```sql
//! CREATE PROCEDURE [dbo].[Foo] AS BEGIN SELECT 1 END
//! GO
//! IF OBJECT_ID('[dbo].[Foo]') IS NOT NULL
//!     PRINT '<<< CREATED PROCEDURE [dbo].[Foo] >>>'
//! ELSE
//!     PRINT '<<< FAILED CREATING PROCEDURE [dbo].[Foo] >>>'
//! GO
//! ```
//!
//! The probe lives in its own batch; inside the create batch it would become
//! part of the routine body. Nothing else in the script is modified.

use super::render_statement_batch;
use crate::error::SyncScriptError;
use crate::model::{Action, ObjectKind};
use crate::parser::{parse_routine_header, split_sql_batches, BATCH_TERMINATOR};

/// Text printed by a probe when the object exists.
pub const CREATED_MARKER: &str = "<<< CREATED";
/// Text printed by a probe when the object is missing.
pub const FAILED_MARKER: &str = "<<< FAILED CREATING";

/// Append a verification probe batch after every create batch.
pub fn add_verification_probes(text: &str) -> Result<String, SyncScriptError> {
    let batches = split_sql_batches(text)?;

    let mut out = String::with_capacity(text.len() * 2);
    for batch in &batches {
        let header = batch
            .first_statement_index()
            .and_then(|idx| parse_routine_header(&batch.tokens, idx))
            .filter(|h| h.action == Action::Create);

        match header {
            Some(header) => {
                out.push_str(&render_statement_batch(batch));
                out.push_str(&verification_probe(header.kind, &header.name.raw));
            }
            None if batch.terminated => out.push_str(&batch.render_terminated()),
            None => out.push_str(&batch.text()),
        }
    }

    Ok(out)
}

/// Build the probe batch for one object, terminator included.
pub fn verification_probe(kind: ObjectKind, name: &str) -> String {
    let literal = name.replace('\'', "''");
    format!(
        "IF OBJECT_ID('{literal}') IS NOT NULL\n    \
         PRINT '{CREATED_MARKER} {kind} {literal} >>>'\n\
         ELSE\n    \
         PRINT '{FAILED_MARKER} {kind} {literal} >>>'\n\
         {BATCH_TERMINATOR}\n"
    )
}
