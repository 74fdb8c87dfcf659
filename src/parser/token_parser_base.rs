//! Base token parser providing common helper methods for T-SQL script scanning.
//!
//! Every stage of the sync pipeline works on the token stream produced here
//! rather than on raw text, so comment markers, `GO` and keywords that appear
//! inside string literals or bracketed identifiers are never misread.
//!
//! ## Usage
//!
//! ```ignore
//! let tokens = tokenize("ALTER PROCEDURE [dbo].[Foo] AS BEGIN SELECT 1 END")?;
//! let mut parser = TokenParser::new(&tokens, 0);
//! parser.skip_whitespace();
//! assert!(parser.check_keyword_ci("ALTER"));
//! ```

use sqlparser::tokenizer::{Location, Span, Token, TokenWithSpan, Tokenizer, Whitespace};

use super::identifier_utils::{format_token_sql, QualifiedName};
use super::tsql_dialect::TsqlScriptDialect;
use crate::error::SyncScriptError;

/// Words after `BEGIN` that start a statement rather than a block.
const NON_BLOCK_BEGIN: &[&str] = &["TRAN", "TRANSACTION", "DISTRIBUTED", "DIALOG", "CONVERSATION"];

/// Words after `END` that end a statement rather than a block.
const NON_BLOCK_END: &[&str] = &["CONVERSATION"];

/// Tokenize T-SQL text with nested block comments.
///
/// Single-line comments are split so the comment token never carries its
/// line break; the break follows as a separate `Newline` token. Block
/// comments that never close surface as [`SyncScriptError::UnterminatedComment`].
///
/// A token whose display form differs from its source text (`!=` shown as
/// `<>`, `X'41'` shown as `0x41`) is replaced by a placeholder carrying the
/// source text, so rendering reproduces the input.
pub fn tokenize(sql: &str) -> Result<Vec<TokenWithSpan>, SyncScriptError> {
    let dialect = TsqlScriptDialect::new();
    let raw = Tokenizer::new(&dialect, sql).tokenize_with_location()?;

    let mut source = SourceCursor::new(sql);
    let mut tokens = Vec::with_capacity(raw.len());
    for token in raw {
        let text = source.advance_to(token.span.end);
        match token.token {
            Token::EOF => {}
            Token::Whitespace(Whitespace::SingleLineComment { comment, prefix })
                if comment.ends_with('\n') =>
            {
                let span = token.span;
                let trimmed = comment.trim_end_matches(['\r', '\n']).to_string();
                tokens.push(TokenWithSpan {
                    token: Token::Whitespace(Whitespace::SingleLineComment {
                        comment: trimmed,
                        prefix,
                    }),
                    span,
                });
                tokens.push(newline_token(span));
            }
            other @ (Token::Whitespace(_) | Token::Word(_)) => tokens.push(TokenWithSpan {
                token: other,
                span: token.span,
            }),
            other => tokens.push(TokenWithSpan {
                token: verbatim(other, text),
                span: token.span,
            }),
        }
    }

    Ok(tokens)
}

fn verbatim(token: Token, text: &str) -> Token {
    if format_token_sql(&token) == text {
        token
    } else {
        Token::Placeholder(text.to_string())
    }
}

/// Walks the source text in step with token spans.
///
/// Lines and columns advance exactly as the tokenizer counts them: one column
/// per character, a new line after each `\n`.
struct SourceCursor<'s> {
    sql: &'s str,
    offset: usize,
    line: u64,
    column: u64,
}

impl<'s> SourceCursor<'s> {
    fn new(sql: &'s str) -> Self {
        Self {
            sql,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Move to `end` and return the text passed over.
    fn advance_to(&mut self, end: Location) -> &'s str {
        let sql = self.sql;
        let start = self.offset;
        let mut chars = sql[start..].char_indices();

        while (self.line, self.column) < (end.line, end.column) {
            let Some((i, ch)) = chars.next() else {
                break;
            };
            self.offset = start + i + ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }

        &sql[start..self.offset]
    }
}

/// `BEGIN` (not `BEGIN TRAN` and friends) or `CASE` at `pos`.
pub fn opens_block(tokens: &[TokenWithSpan], pos: usize) -> bool {
    let token = &tokens[pos].token;
    if is_keyword_ci(token, "CASE") {
        return true;
    }
    is_keyword_ci(token, "BEGIN") && !TokenParser::new(tokens, pos).next_keyword_is(NON_BLOCK_BEGIN)
}

/// `END` (not `END CONVERSATION`) at `pos`.
pub fn closes_block(tokens: &[TokenWithSpan], pos: usize) -> bool {
    is_keyword_ci(&tokens[pos].token, "END")
        && !TokenParser::new(tokens, pos).next_keyword_is(NON_BLOCK_END)
}

/// Render a token slice back into SQL text.
pub fn render_tokens(tokens: &[TokenWithSpan]) -> String {
    tokens.iter().map(|t| format_token_sql(&t.token)).collect()
}

/// True for spaces, tabs and line breaks (not comments).
#[inline]
pub fn is_layout(token: &Token) -> bool {
    matches!(
        token,
        Token::Whitespace(Whitespace::Space | Whitespace::Tab | Whitespace::Newline)
    )
}

/// True for anything the engine ignores: layout and comments.
#[inline]
pub fn is_trivia(token: &Token) -> bool {
    matches!(token, Token::Whitespace(_))
}

/// True for an unquoted word matching `word` case-insensitively.
#[inline]
pub fn is_keyword_ci(token: &Token, word: &str) -> bool {
    matches!(token, Token::Word(w) if w.quote_style.is_none() && w.value.eq_ignore_ascii_case(word))
}

/// Collapse every run of two or more blank lines down to a single blank line.
///
/// Indentation after the run is preserved; trailing spaces before it are not.
pub fn collapse_blank_lines(tokens: Vec<TokenWithSpan>) -> Vec<TokenWithSpan> {
    let mut result = Vec::with_capacity(tokens.len());
    let mut run: Vec<TokenWithSpan> = Vec::new();

    for token in tokens {
        if is_layout(&token.token) {
            run.push(token);
            continue;
        }
        flush_layout_run(&mut result, &mut run);
        result.push(token);
    }
    flush_layout_run(&mut result, &mut run);

    result
}

fn flush_layout_run(result: &mut Vec<TokenWithSpan>, run: &mut Vec<TokenWithSpan>) {
    let newlines = run
        .iter()
        .filter(|t| matches!(t.token, Token::Whitespace(Whitespace::Newline)))
        .count();

    if newlines < 2 {
        result.append(run);
        return;
    }

    let last_newline = run
        .iter()
        .rposition(|t| matches!(t.token, Token::Whitespace(Whitespace::Newline)))
        .unwrap_or(0);
    let span = run[last_newline].span;
    result.push(newline_token(span));
    result.push(newline_token(span));
    result.extend(run.drain(..).skip(last_newline + 1));
}

/// A synthetic line break carrying the span of the token it replaces.
pub fn newline_token(span: Span) -> TokenWithSpan {
    TokenWithSpan {
        token: Token::Whitespace(Whitespace::Newline),
        span,
    }
}

/// Re-tokenize `sql` and collapse blank-line runs.
pub fn normalize_blank_lines(sql: &str) -> Result<String, SyncScriptError> {
    Ok(render_tokens(&collapse_blank_lines(tokenize(sql)?)))
}

/// Base token parser with common helper methods for T-SQL scanning.
///
/// This struct encapsulates the token stream and position, providing
/// the navigation and checking methods used by the routine, drop and
/// statement scanners.
pub struct TokenParser<'a> {
    tokens: &'a [TokenWithSpan],
    pos: usize,
}

impl<'a> TokenParser<'a> {
    /// Create a parser over an existing token slice, starting at `pos`.
    pub fn new(tokens: &'a [TokenWithSpan], pos: usize) -> Self {
        Self { tokens, pos }
    }

    // ========================================================================
    // Position and state
    // ========================================================================

    /// Check if at end of tokens.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Get current position in token stream.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Set current position in token stream.
    #[inline]
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    // ========================================================================
    // Token access
    // ========================================================================

    /// Get current token without consuming.
    #[inline]
    pub fn current_token(&self) -> Option<&'a TokenWithSpan> {
        self.tokens.get(self.pos)
    }

    /// Advance to next token.
    #[inline]
    pub fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    // ========================================================================
    // Whitespace handling
    // ========================================================================

    /// Skip whitespace and comment tokens.
    pub fn skip_whitespace(&mut self) {
        while let Some(token) = self.current_token() {
            if !is_trivia(&token.token) {
                break;
            }
            self.advance();
        }
    }

    /// True when only whitespace and comments remain.
    pub fn only_trivia_remains(&self) -> bool {
        self.tokens[self.pos.min(self.tokens.len())..]
            .iter()
            .all(|t| is_trivia(&t.token))
    }

    // ========================================================================
    // Token type checks
    // ========================================================================

    /// Check if current token is an unquoted word matching (case-insensitive).
    ///
    /// Bracketed identifiers such as `[Begin]` never match.
    #[inline]
    pub fn check_keyword_ci(&self, word: &str) -> bool {
        self.current_token()
            .is_some_and(|t| is_keyword_ci(&t.token, word))
    }

    /// Check if the next significant token after the current one is the given word.
    pub fn next_keyword_is(&self, words: &[&str]) -> bool {
        self.tokens[(self.pos + 1).min(self.tokens.len())..]
            .iter()
            .find(|t| !is_trivia(&t.token))
            .is_some_and(|t| words.iter().any(|w| is_keyword_ci(&t.token, w)))
    }

    /// Check if current token matches a specific token type (by discriminant).
    #[inline]
    pub fn check_token(&self, expected: &Token) -> bool {
        self.current_token().is_some_and(|t| {
            std::mem::discriminant(&t.token) == std::mem::discriminant(expected)
        })
    }

    // ========================================================================
    // Expect methods (check and advance)
    // ========================================================================

    /// Expect an unquoted word (case-insensitive), advancing if found.
    pub fn expect_keyword_ci(&mut self, word: &str) -> Option<()> {
        if self.check_keyword_ci(word) {
            self.advance();
            Some(())
        } else {
            None
        }
    }

    /// Expect a specific token type, advancing if found.
    pub fn expect_token(&mut self, expected: &Token) -> Option<()> {
        if self.check_token(expected) {
            self.advance();
            Some(())
        } else {
            None
        }
    }

    // ========================================================================
    // Identifier parsing
    // ========================================================================

    /// Parse a possibly qualified name: `[schema].[name]`, `schema.name`, `[name]` or `name`.
    ///
    /// Up to three dot-separated parts are accepted. The raw text keeps the
    /// bracket style exactly as written.
    pub fn parse_qualified_name(&mut self) -> Option<QualifiedName> {
        let start = self.pos;
        let mut parts = Vec::new();

        loop {
            match self.current_token().map(|t| &t.token) {
                Some(Token::Word(w)) => parts.push(w.value.clone()),
                _ => {
                    self.pos = start;
                    return None;
                }
            }
            self.advance();

            if parts.len() < 3 && self.check_token(&Token::Period) {
                self.advance();
                continue;
            }
            break;
        }

        Some(QualifiedName {
            raw: render_tokens(&self.tokens[start..self.pos]),
            parts,
        })
    }
}
