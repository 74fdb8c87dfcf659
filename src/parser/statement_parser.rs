//! Batch classification: definitions and drops
//!
//! Two independent scans run over the batches of a cleaned script:
//!
//! - the **definition scan** walks each batch with a small state machine
//!   (`Seeking` -> `InHeader` -> `InBody` -> `AtTerminator`) and keeps a
//!   function or procedure only if its body holds a top-level `BEGIN` block
//!   and every `BEGIN`/`CASE` is closed by a matching `END` before the batch ends;
//! - the **drop scan** recognizes batches that only drop procedures,
//!   functions or tables and rewrites each one to its conditional form.
//!
//! Anything else (SET options, SQLCMD directives, table changes, probes)
//! is left unclassified and never reaches the output.

use sqlparser::tokenizer::{Token, TokenWithSpan};

use super::batch_parser::{split_batches, Batch};
use super::drop_parser::parse_drop_batch;
use super::routine_parser::{parse_routine_header, RoutineHeader};
use super::token_parser_base::{
    closes_block, collapse_blank_lines, is_trivia, opens_block, render_tokens, tokenize,
};
use crate::error::SyncScriptError;
use crate::model::{ClassifiedScript, DropStatement, ObjectKind, SqlObject};

/// Definition scan state over one batch
#[derive(Debug)]
enum ScanState {
    /// Looking for a `CREATE`/`ALTER` routine header
    Seeking,
    /// Past the name, before the first top-level `BEGIN`
    InHeader {
        header: RoutineHeader,
        paren_depth: usize,
    },
    /// Inside the body, tracking block nesting
    InBody {
        header: RoutineHeader,
        block_depth: usize,
        malformed: bool,
    },
    /// Batch end reached with a complete candidate
    AtTerminator { header: RoutineHeader },
}

/// Classify a cleaned script into functions, procedures and drops.
pub fn classify_script(cleaned: &str) -> Result<ClassifiedScript, SyncScriptError> {
    let batches = split_batches(tokenize(cleaned)?);

    let mut classified = ClassifiedScript::default();
    for object in scan_definitions(&batches) {
        match object.kind {
            ObjectKind::Function => classified.functions.push(object),
            ObjectKind::Procedure => classified.procedures.push(object),
        }
    }
    classified.drops = scan_drops(&batches);

    Ok(classified)
}

/// Definition scan: every batch holding a well-formed function or procedure.
pub fn scan_definitions(batches: &[Batch]) -> Vec<SqlObject> {
    batches.iter().filter_map(classify_definition).collect()
}

/// Drop scan: every explicit drop, rewritten to `DROP <KIND> IF EXISTS <name>;`.
pub fn scan_drops(batches: &[Batch]) -> Vec<DropStatement> {
    batches
        .iter()
        .filter_map(|batch| parse_drop_batch(&batch.tokens))
        .flat_map(|drop| {
            let kind = drop.kind;
            drop.names.into_iter().map(move |name| DropStatement {
                kind,
                key: name.key(),
                name: name.raw,
            })
        })
        .collect()
}

/// Run the definition state machine over one batch.
fn classify_definition(batch: &Batch) -> Option<SqlObject> {
    let tokens = &batch.tokens;
    let mut state = ScanState::Seeking;
    let mut pos = 0;

    while pos < tokens.len() {
        state = match state {
            ScanState::Seeking => {
                if is_trivia(&tokens[pos].token) {
                    pos += 1;
                    ScanState::Seeking
                } else if let Some(header) = parse_routine_header(tokens, pos) {
                    pos = header.end;
                    ScanState::InHeader {
                        header,
                        paren_depth: 0,
                    }
                } else {
                    pos += 1;
                    ScanState::Seeking
                }
            }
            ScanState::InHeader {
                header,
                paren_depth,
            } => {
                let token = &tokens[pos].token;
                let next = match token {
                    Token::LParen => ScanState::InHeader {
                        header,
                        paren_depth: paren_depth + 1,
                    },
                    Token::RParen => ScanState::InHeader {
                        header,
                        paren_depth: paren_depth.saturating_sub(1),
                    },
                    _ if paren_depth == 0 && opens_block(tokens, pos) => ScanState::InBody {
                        header,
                        block_depth: 1,
                        malformed: false,
                    },
                    _ => ScanState::InHeader {
                        header,
                        paren_depth,
                    },
                };
                pos += 1;
                next
            }
            ScanState::InBody {
                header,
                block_depth,
                malformed,
            } => {
                let (block_depth, malformed) = if opens_block(tokens, pos) {
                    (block_depth + 1, malformed)
                } else if closes_block(tokens, pos) {
                    match block_depth.checked_sub(1) {
                        Some(depth) => (depth, malformed),
                        None => (0, true),
                    }
                } else {
                    (block_depth, malformed)
                };
                pos += 1;
                ScanState::InBody {
                    header,
                    block_depth,
                    malformed,
                }
            }
            ScanState::AtTerminator { .. } => break,
        };
    }

    // End of batch: only a balanced body reaches the terminator state
    state = match state {
        ScanState::InBody {
            header,
            block_depth: 0,
            malformed: false,
        } => ScanState::AtTerminator { header },
        other => other,
    };

    match state {
        ScanState::AtTerminator { header } => Some(build_object(tokens, header)),
        _ => None,
    }
}

fn build_object(tokens: &[TokenWithSpan], header: RoutineHeader) -> SqlObject {
    let body_tokens = collapse_blank_lines(tokens[header.start..].to_vec());
    let body = render_tokens(&body_tokens).trim_end().to_string();

    SqlObject {
        kind: header.kind,
        action: header.action,
        key: header.name.key(),
        qualified_name: header.name.raw,
        body,
    }
}
