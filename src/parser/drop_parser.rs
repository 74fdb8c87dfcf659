//! Token-based parsing of explicit drop batches
//!
//! Recognizes batches whose only statement is a drop of procedures,
//! functions or tables, optionally preceded by the announcement `PRINT`
//! SqlPackage writes before each drop:
//!
//! ```sql
//! PRINT N'Dropping Procedure [dbo].[OldProc]...';
//! DROP PROCEDURE [dbo].[OldProc];
//! DROP FUNCTION IF EXISTS dbo.Fn1, dbo.Fn2
//! DROP PROC OldProc
//! DROP TABLE [dbo].[Staging];
//! ```

use sqlparser::tokenizer::{Token, TokenWithSpan};

use super::identifier_utils::QualifiedName;
use super::token_parser_base::TokenParser;
use crate::model::DropKind;

/// Result of parsing a drop batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenParsedDrop {
    pub kind: DropKind,
    pub names: Vec<QualifiedName>,
    /// Whether the source already used `IF EXISTS`
    pub if_exists: bool,
}

/// Token-based drop batch parser
pub struct DropTokenParser<'a> {
    base: TokenParser<'a>,
}

impl<'a> DropTokenParser<'a> {
    pub fn new(tokens: &'a [TokenWithSpan]) -> Self {
        Self {
            base: TokenParser::new(tokens, 0),
        }
    }

    /// Parse the whole batch as `[PRINT '...' [;]] DROP <kind> [IF EXISTS] name[, name...] [;]`.
    ///
    /// Returns `None` if anything else appears in the batch.
    pub fn parse_drop_batch(&mut self) -> Option<TokenParsedDrop> {
        self.base.skip_whitespace();
        self.skip_announcement();

        self.base.expect_keyword_ci("DROP")?;
        self.base.skip_whitespace();

        let kind = self.parse_kind()?;
        self.base.skip_whitespace();

        let if_exists = self.parse_if_exists();

        let mut names = Vec::new();
        loop {
            names.push(self.base.parse_qualified_name()?);
            self.base.skip_whitespace();
            if self.base.expect_token(&Token::Comma).is_none() {
                break;
            }
            self.base.skip_whitespace();
        }

        let _ = self.base.expect_token(&Token::SemiColon);
        if !self.base.only_trivia_remains() {
            return None;
        }

        Some(TokenParsedDrop {
            kind,
            names,
            if_exists,
        })
    }

    /// Skip a leading `PRINT N'Dropping ...'` statement, if present.
    fn skip_announcement(&mut self) {
        if !self.base.check_keyword_ci("PRINT") {
            return;
        }
        let start = self.base.pos();
        self.base.advance();
        self.base.skip_whitespace();

        let is_string = matches!(
            self.base.current_token().map(|t| &t.token),
            Some(Token::NationalStringLiteral(_) | Token::SingleQuotedString(_))
        );
        if !is_string {
            self.base.set_pos(start);
            return;
        }
        self.base.advance();
        self.base.skip_whitespace();
        let _ = self.base.expect_token(&Token::SemiColon);
        self.base.skip_whitespace();
    }

    fn parse_kind(&mut self) -> Option<DropKind> {
        if self.base.expect_keyword_ci("PROCEDURE").is_some()
            || self.base.expect_keyword_ci("PROC").is_some()
        {
            Some(DropKind::Procedure)
        } else if self.base.expect_keyword_ci("FUNCTION").is_some() {
            Some(DropKind::Function)
        } else if self.base.expect_keyword_ci("TABLE").is_some() {
            Some(DropKind::Table)
        } else {
            None
        }
    }

    fn parse_if_exists(&mut self) -> bool {
        if !self.base.check_keyword_ci("IF") || !self.base.next_keyword_is(&["EXISTS"]) {
            return false;
        }
        self.base.advance();
        self.base.skip_whitespace();
        self.base.advance();
        self.base.skip_whitespace();
        true
    }
}

/// Try to parse a batch as an explicit drop.
pub fn parse_drop_batch(tokens: &[TokenWithSpan]) -> Option<TokenParsedDrop> {
    DropTokenParser::new(tokens).parse_drop_batch()
}
