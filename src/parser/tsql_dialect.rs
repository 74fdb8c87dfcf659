//! T-SQL tokenizer dialect for generated deployment scripts
//!
//! `MsSqlDialect` ends a block comment at the first `*/`. SQL Server nests
//! block comments, so `/* a /* b */ c */` is one comment and `/* /* */`
//! never closes. This dialect delegates everything else to `MsSqlDialect`.

use std::any::TypeId;

use sqlparser::dialect::{Dialect, MsSqlDialect};

/// `MsSqlDialect` with nested block comments.
#[derive(Debug)]
pub struct TsqlScriptDialect {
    base: MsSqlDialect,
}

impl Default for TsqlScriptDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl TsqlScriptDialect {
    pub fn new() -> Self {
        Self {
            base: MsSqlDialect {},
        }
    }
}

impl Dialect for TsqlScriptDialect {
    // Report as MsSqlDialect so dialect_of!() checks behave the same
    fn dialect(&self) -> TypeId {
        TypeId::of::<MsSqlDialect>()
    }

    fn is_identifier_start(&self, ch: char) -> bool {
        self.base.is_identifier_start(ch)
    }

    fn is_identifier_part(&self, ch: char) -> bool {
        self.base.is_identifier_part(ch)
    }

    fn is_delimited_identifier_start(&self, ch: char) -> bool {
        self.base.is_delimited_identifier_start(ch)
    }

    fn supports_string_literal_backslash_escape(&self) -> bool {
        self.base.supports_string_literal_backslash_escape()
    }

    fn supports_nested_comments(&self) -> bool {
        true
    }
}
