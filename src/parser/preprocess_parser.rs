//! Token-based noise stripping for generated deployment scripts
//!
//! This module removes the informational chatter SqlPackage writes around
//! every change while keeping the statements themselves intact.
//!
//! ## Preprocessing Operations
//!
//! Applied in this order in a single pass over the tokens:
//!
//! 1. **Announcement prints**: `PRINT N'...';` followed by `GO` (on its own
//!    line or the same one) is removed together with its terminator and the
//!    blank space after it.
//! 2. **Header comments**: `-- Alter Procedure: [dbo].[Foo]` style lines are
//!    removed including their line break.
//! 3. **Line comments**: any other `-- ...` is removed; the line break stays.
//! 4. **Block comments**: `/* ... */` is removed. A block comment that never
//!    closes is a hard error instead of silently eating the rest of the script.
//! 5. **Blank lines**: runs of blank lines collapse to a single blank line.

use once_cell::sync::Lazy;
use regex::Regex;
use sqlparser::tokenizer::{Token, TokenWithSpan, Whitespace};

use super::batch_parser::{inline_terminator_end, terminator_end};
use super::token_parser_base::{
    collapse_blank_lines, is_keyword_ci, is_layout, is_trivia, render_tokens, tokenize,
};
use crate::error::SyncScriptError;

/// Matches the body of a generated `-- Alter Procedure: [dbo].[Foo]` comment.
static HEADER_COMMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(alter|create)\s+(procedure|function)\s*:").expect("Invalid header regex")
});

/// Strip generated noise from a raw deployment script.
///
/// The input is left untouched; a new string is returned.
pub fn strip_noise(raw: &str) -> Result<String, SyncScriptError> {
    let tokens = tokenize(raw)?;
    let stripped = NoiseStripper::new(&tokens).run();
    Ok(render_tokens(&collapse_blank_lines(stripped)))
}

/// Single-pass noise remover over a token slice.
struct NoiseStripper<'a> {
    tokens: &'a [TokenWithSpan],
    pos: usize,
    output: Vec<TokenWithSpan>,
}

impl<'a> NoiseStripper<'a> {
    fn new(tokens: &'a [TokenWithSpan]) -> Self {
        Self {
            tokens,
            pos: 0,
            output: Vec::with_capacity(tokens.len()),
        }
    }

    fn run(mut self) -> Vec<TokenWithSpan> {
        while self.pos < self.tokens.len() {
            if let Some(end) = self.announcement_print_end() {
                self.pos = end;
                continue;
            }

            let tokens = self.tokens;
            let token = &tokens[self.pos];
            match &token.token {
                Token::Whitespace(Whitespace::SingleLineComment { comment, .. }) => {
                    if HEADER_COMMENT_RE.is_match(comment) {
                        // Drop the line break that ended the header comment too
                        self.skip_following_newline();
                    }
                }
                Token::Whitespace(Whitespace::MultiLineComment(_)) => {
                    if self.needs_separator() {
                        self.output.push(TokenWithSpan {
                            token: Token::Whitespace(Whitespace::Space),
                            span: token.span,
                        });
                    }
                }
                _ => self.output.push(token.clone()),
            }
            self.pos += 1;
        }

        self.output
    }

    /// `PRINT N'...' [;]` followed by a `GO` line: return the index after it
    /// and any whitespace that trails it.
    fn announcement_print_end(&self) -> Option<usize> {
        if !is_keyword_ci(&self.tokens[self.pos].token, "PRINT") {
            return None;
        }

        let mut j = self.skip_layout(self.pos + 1);
        if !matches!(
            self.tokens.get(j).map(|t| &t.token),
            Some(Token::NationalStringLiteral(_))
        ) {
            return None;
        }
        j = self.skip_layout(j + 1);
        if matches!(self.tokens.get(j).map(|t| &t.token), Some(Token::SemiColon)) {
            j = self.skip_layout(j + 1);
        }

        let end = terminator_end(self.tokens, j)
            .or_else(|| inline_terminator_end(self.tokens, j))?;
        Some(self.skip_layout(end))
    }

    fn skip_layout(&self, mut j: usize) -> usize {
        while j < self.tokens.len() && is_layout(&self.tokens[j].token) {
            j += 1;
        }
        j
    }

    fn skip_following_newline(&mut self) {
        if matches!(
            self.tokens.get(self.pos + 1).map(|t| &t.token),
            Some(Token::Whitespace(Whitespace::Newline))
        ) {
            self.pos += 1;
        }
    }

    /// Whether removing the comment at `pos` would fuse two tokens together.
    fn needs_separator(&self) -> bool {
        let before = self.output.last().is_some_and(|t| !is_trivia(&t.token));
        let after = self
            .tokens
            .get(self.pos + 1)
            .is_some_and(|t| !is_trivia(&t.token));
        before && after
    }
}
