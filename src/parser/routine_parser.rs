//! Token-based routine header parsing for T-SQL
//!
//! Recognizes the head of a function or procedure definition and reports
//! where its action words and name sit in the token stream, so callers can
//! rewrite the action in place without touching anything else.
//!
//! ## Supported Syntax
//!
//! ```sql
//! CREATE PROCEDURE [schema].[name] ...
//! CREATE PROC schema.name ...
//! CREATE OR ALTER PROCEDURE name ...
//! ALTER PROCEDURE [schema].[name] ...
//! CREATE FUNCTION [schema].[name](...) ...
//! ALTER FUNCTION [schema].[name](...) ...
//! ```

use sqlparser::tokenizer::{Token, TokenWithSpan};

use super::identifier_utils::QualifiedName;
use super::token_parser_base::TokenParser;
use crate::model::{Action, ObjectKind};

/// Result of parsing a routine header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineHeader {
    pub action: Action,
    pub kind: ObjectKind,
    pub name: QualifiedName,
    /// Token index of the first action word
    pub start: usize,
    /// Token index just past the action words (`CREATE`, `ALTER` or `CREATE OR ALTER`)
    pub action_end: usize,
    /// Token index just past the object name
    pub end: usize,
}

/// Token-based routine header parser
pub struct RoutineTokenParser<'a> {
    base: TokenParser<'a>,
}

impl<'a> RoutineTokenParser<'a> {
    pub fn new(tokens: &'a [TokenWithSpan], pos: usize) -> Self {
        Self {
            base: TokenParser::new(tokens, pos),
        }
    }

    /// Parse `CREATE [OR ALTER] | ALTER` then `PROC[EDURE] | FUNCTION` then the name.
    pub fn parse_header(&mut self) -> Option<RoutineHeader> {
        let start = self.base.pos();
        let action = self.parse_action()?;
        let action_end = self.base.pos();
        self.base.skip_whitespace();

        let kind = self.parse_kind()?;
        self.base.skip_whitespace();

        let name = self.base.parse_qualified_name()?;

        Some(RoutineHeader {
            action,
            kind,
            name,
            start,
            action_end,
            end: self.base.pos(),
        })
    }

    fn parse_action(&mut self) -> Option<Action> {
        if self.base.expect_keyword_ci("ALTER").is_some() {
            return Some(Action::Alter);
        }

        self.base.expect_keyword_ci("CREATE")?;
        let after_create = self.base.pos();
        self.base.skip_whitespace();

        if self.base.expect_keyword_ci("OR").is_some() {
            self.base.skip_whitespace();
            self.base.expect_keyword_ci("ALTER")?;
            return Some(Action::Alter);
        }

        self.base.set_pos(after_create);
        Some(Action::Create)
    }

    fn parse_kind(&mut self) -> Option<ObjectKind> {
        if self.base.expect_keyword_ci("PROCEDURE").is_some()
            || self.base.expect_keyword_ci("PROC").is_some()
        {
            Some(ObjectKind::Procedure)
        } else if self.base.expect_keyword_ci("FUNCTION").is_some() {
            Some(ObjectKind::Function)
        } else {
            None
        }
    }
}

/// Try to parse a routine header starting exactly at `pos`.
pub fn parse_routine_header(tokens: &[TokenWithSpan], pos: usize) -> Option<RoutineHeader> {
    match tokens.get(pos).map(|t| &t.token) {
        Some(Token::Word(_)) => RoutineTokenParser::new(tokens, pos).parse_header(),
        _ => None,
    }
}
