//! Idempotent drop-then-create rewriting
//!
//! Every function or procedure definition batch becomes two batches:
//!
//! ```sql
//! DROP PROCEDURE IF EXISTS [dbo].[Foo]
//! GO
//! CREATE PROCEDURE [dbo].[Foo] ...
//! GO
//! ```
//!
//! Only the action words of the header are replaced (`ALTER` and
//! `CREATE OR ALTER` become `CREATE`); the name and body are emitted as written.

use super::render_statement_batch;
use crate::error::SyncScriptError;
use crate::model::{Action, DropKind};
use crate::parser::{
    normalize_blank_lines, parse_drop_batch, parse_routine_header, render_tokens,
    split_sql_batches, terminate, Batch, ObjectKey, RoutineHeader, BATCH_TERMINATOR,
};

/// Rewrite every definition in `text` into drop-then-create form.
///
/// Empty batches (a `GO` directly after another `GO`) are removed and blank
/// line runs are collapsed afterwards.
pub fn make_idempotent(text: &str) -> Result<String, SyncScriptError> {
    let batches = split_sql_batches(text)?;

    let mut out = String::with_capacity(text.len() + batches.len() * 48);
    let mut previous_drop: Option<(DropKind, ObjectKey)> = None;

    for batch in &batches {
        if batch.is_blank() {
            continue;
        }

        let header = batch
            .first_statement_index()
            .and_then(|idx| parse_routine_header(&batch.tokens, idx));

        match header {
            Some(header) => {
                let kind = DropKind::from(header.kind);
                let already_dropped =
                    previous_drop.as_ref() == Some(&(kind, header.name.key()));
                out.push_str(&rewrite_definition(batch, &header, !already_dropped));
                previous_drop = None;
            }
            None => {
                out.push_str(&render_statement_batch(batch));
                previous_drop = conditional_drop_target(batch);
            }
        }
    }

    normalize_blank_lines(&out)
}

/// Render one definition batch as `[DROP ... GO] CREATE ... GO`.
fn rewrite_definition(batch: &Batch, header: &RoutineHeader, with_drop: bool) -> String {
    let tokens = &batch.tokens;
    let mut out = render_tokens(&tokens[..header.start]);

    if with_drop {
        out.push_str(&format!(
            "DROP {} IF EXISTS {}\n{}\n",
            header.kind.keyword(),
            header.name.raw,
            BATCH_TERMINATOR
        ));
    }

    let action = match header.action {
        Action::Create => render_tokens(&tokens[header.start..header.action_end]),
        Action::Alter => "CREATE".to_string(),
    };
    let definition = format!("{}{}", action, render_tokens(&tokens[header.action_end..]));
    out.push_str(&terminate(&definition));

    out
}

/// The object a `DROP <KIND> IF EXISTS <name>` batch removes, if it removes exactly one.
fn conditional_drop_target(batch: &Batch) -> Option<(DropKind, ObjectKey)> {
    let drop = parse_drop_batch(&batch.tokens)?;
    match drop.names.as_slice() {
        [name] if drop.if_exists => Some((drop.kind, name.key())),
        _ => None,
    }
}
