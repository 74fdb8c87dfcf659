//! GO batch splitting over the token stream
//!
//! A batch ends at a line holding only the `GO` terminator (any case),
//! optionally followed by `;`, spaces or a trailing line comment. `GO <count>`
//! is not treated as a terminator. Because splitting happens on tokens, a
//! `GO` inside a string literal, comment or bracketed identifier never splits.
//!
//! A `GO` may also share its line with a statement that is already complete:
//! after a top-level `;`, after the `END` closing the outermost block, or
//! after `PRINT '...'`. Whatever follows it on the line starts the next batch.

use sqlparser::tokenizer::{Token, TokenWithSpan, Whitespace};

use super::token_parser_base::{
    closes_block, is_keyword_ci, is_layout, is_trivia, opens_block, render_tokens, tokenize,
};
use crate::error::SyncScriptError;

/// The batch terminator as emitted in output.
pub const BATCH_TERMINATOR: &str = "GO";

/// A SQL batch and whether a terminator closed it
#[derive(Debug, Clone)]
pub struct Batch {
    /// Tokens of the batch, excluding the terminator line
    pub tokens: Vec<TokenWithSpan>,
    /// Whether a `GO` line closed this batch (false only for a trailing remainder)
    pub terminated: bool,
}

impl Batch {
    /// Source text of the batch.
    pub fn text(&self) -> String {
        render_tokens(&self.tokens)
    }

    /// True when the batch holds nothing but spaces and line breaks.
    pub fn is_blank(&self) -> bool {
        self.tokens.iter().all(|t| is_layout(&t.token))
    }

    /// Index of the first token that is not whitespace or a comment.
    pub fn first_statement_index(&self) -> Option<usize> {
        self.tokens.iter().position(|t| !is_trivia(&t.token))
    }

    /// Render the batch followed by its terminator line, if it had one.
    pub fn render_terminated(&self) -> String {
        let text = self.text();
        if !self.terminated {
            return text;
        }
        terminate(&text)
    }
}

/// Append a terminator line to batch text, dropping trailing whitespace first.
pub fn terminate(text: &str) -> String {
    let body = text.trim_end();
    if body.is_empty() {
        format!("{}{}\n", text, BATCH_TERMINATOR)
    } else {
        format!("{}\n{}\n", body, BATCH_TERMINATOR)
    }
}

/// Tokenize `sql` and split it into batches.
pub fn split_sql_batches(sql: &str) -> Result<Vec<Batch>, SyncScriptError> {
    Ok(split_batches(tokenize(sql)?))
}

/// Split a token stream into batches at `GO` terminators.
pub fn split_batches(tokens: Vec<TokenWithSpan>) -> Vec<Batch> {
    let mut batches = Vec::new();
    let mut current: Vec<TokenWithSpan> = Vec::new();
    let mut depth: usize = 0;
    let mut i = 0;

    while i < tokens.len() {
        let end = terminator_end(&tokens, i).or_else(|| {
            if depth == 0 {
                inline_terminator_end(&tokens, i)
            } else {
                None
            }
        });
        if let Some(end) = end {
            batches.push(Batch {
                tokens: std::mem::take(&mut current),
                terminated: true,
            });
            depth = 0;
            i = end;
            continue;
        }

        if opens_block(&tokens, i) {
            depth += 1;
        } else if closes_block(&tokens, i) {
            depth = depth.saturating_sub(1);
        }
        current.push(tokens[i].clone());
        i += 1;
    }

    if !current.is_empty() {
        batches.push(Batch {
            tokens: current,
            terminated: false,
        });
    }

    batches
}

/// If `tokens[i]` is a standalone `GO`, return the index just past its line.
///
/// The terminator line includes any `;`, spaces, trailing comment and the
/// line break that follow `GO`. Leading spaces before `GO` on the same line
/// belong to the batch being closed.
pub fn terminator_end(tokens: &[TokenWithSpan], i: usize) -> Option<usize> {
    if !is_keyword_ci(&tokens.get(i)?.token, BATCH_TERMINATOR) {
        return None;
    }

    // Only spaces/tabs may precede GO on its line
    let mut back = i;
    while back > 0 {
        match &tokens[back - 1].token {
            Token::Whitespace(Whitespace::Space | Whitespace::Tab) => back -= 1,
            Token::Whitespace(Whitespace::Newline) => break,
            _ => return None,
        }
    }

    let mut j = i + 1;
    let mut seen_semicolon = false;
    while let Some(token) = tokens.get(j) {
        match &token.token {
            Token::Whitespace(Whitespace::Space | Whitespace::Tab) => j += 1,
            Token::SemiColon if !seen_semicolon => {
                seen_semicolon = true;
                j += 1;
            }
            Token::Whitespace(Whitespace::SingleLineComment { .. }) => j += 1,
            Token::Whitespace(Whitespace::Newline) => return Some(j + 1),
            _ => return None,
        }
    }

    Some(j)
}

/// If `tokens[i]` is a `GO` on the same line as a complete statement, return
/// the index just past it.
///
/// The statement before it must end in `;`, `END` or a `PRINT` literal; the
/// caller checks that no block is still open. A trailing `;`, spaces, comment
/// and line break belong to the terminator; anything else on the line starts
/// the next batch.
pub fn inline_terminator_end(tokens: &[TokenWithSpan], i: usize) -> Option<usize> {
    if !is_keyword_ci(&tokens.get(i)?.token, BATCH_TERMINATOR) {
        return None;
    }

    let mut back = i;
    while back > 0 && is_blank(&tokens[back - 1].token) {
        back -= 1;
    }
    if !completes_statement(tokens, back.checked_sub(1)?) {
        return None;
    }

    let mut j = i + 1;
    while tokens.get(j).is_some_and(|t| is_blank(&t.token)) {
        j += 1;
    }
    match tokens.get(j).map(|t| &t.token) {
        // GO <count>
        Some(Token::Number(..)) => return None,
        Some(Token::SemiColon) => j += 1,
        _ => {}
    }

    while let Some(token) = tokens.get(j) {
        match &token.token {
            Token::Whitespace(
                Whitespace::Space | Whitespace::Tab | Whitespace::SingleLineComment { .. },
            ) => j += 1,
            Token::Whitespace(Whitespace::Newline) => return Some(j + 1),
            _ => return Some(j),
        }
    }

    Some(j)
}

fn is_blank(token: &Token) -> bool {
    matches!(token, Token::Whitespace(Whitespace::Space | Whitespace::Tab))
}

/// Whether the token at `pos` ends a statement: `;`, `END`, or the literal of `PRINT '...'`.
fn completes_statement(tokens: &[TokenWithSpan], pos: usize) -> bool {
    match &tokens[pos].token {
        Token::SemiColon => true,
        Token::SingleQuotedString(_) | Token::NationalStringLiteral(_) => tokens[..pos]
            .iter()
            .rev()
            .find(|t| !is_trivia(&t.token))
            .is_some_and(|t| is_keyword_ci(&t.token, "PRINT")),
        token => is_keyword_ci(token, "END"),
    }
}
