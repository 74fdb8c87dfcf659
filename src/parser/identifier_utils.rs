//! Centralized identifier handling utilities for T-SQL scanning.
//!
//! Object names are carried in two forms: the raw text exactly as the diff
//! tool wrote it (`[dbo].[Foo]`, `dbo.Foo`, `Foo`), which is the only form
//! ever written to output, and an [`ObjectKey`] used for identity checks.
//!
//! # Examples
//!
//! ```ignore
//! use crate::parser::identifier_utils::*;
//!
//! assert_eq!(normalize_identifier("[MyTable]"), "MyTable");
//! assert_eq!(quote_string_literal("O'Brien"), "'O''Brien'");
//! ```

use std::fmt;

use sqlparser::tokenizer::{Token, Word};

/// Schema assumed for unqualified object names.
pub const DEFAULT_SCHEMA: &str = "dbo";

/// Strips brackets `[]` and double quotes `""` from an identifier.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_identifier("[MyTable]"), "MyTable");
/// assert_eq!(normalize_identifier("\"MyColumn\""), "MyColumn");
/// assert_eq!(normalize_identifier("  [Trimmed]  "), "Trimmed");
/// ```
pub fn normalize_identifier(ident: &str) -> String {
    ident
        .trim()
        .trim_matches(|c| c == '[' || c == ']' || c == '"')
        .to_string()
}

/// Converts a sqlparser-rs Word token back to its quoted source form.
///
/// - `Some('[')` -> `[identifier]` (a `]` inside is doubled again)
/// - `Some('"')` -> `"identifier"`
/// - `None` -> `identifier` (unquoted)
pub fn format_word(word: &Word) -> String {
    match word.quote_style {
        Some('[') => format!("[{}]", word.value.replace(']', "]]")),
        Some('"') => format!("\"{}\"", word.value.replace('"', "\"\"")),
        _ => word.value.clone(),
    }
}

/// Converts a sqlparser-rs Token back to SQL text.
///
/// String literals are re-escaped by doubling single quotes and identifiers
/// keep their original quote style. Binary literals come back as `0x..`.
/// Everything else uses the tokenizer's own display form.
pub fn format_token_sql(token: &Token) -> String {
    match token {
        Token::Word(w) => format_word(w),
        Token::SingleQuotedString(s) => quote_string_literal(s),
        Token::NationalStringLiteral(s) => format!("N{}", quote_string_literal(s)),
        Token::HexStringLiteral(s) => format!("0x{}", s),
        Token::EOF => String::new(),
        _ => token.to_string(),
    }
}

/// Wrap text in a T-SQL string literal, doubling embedded single quotes.
pub fn quote_string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// A possibly schema-qualified object name as written in the script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    /// Source text of the name, brackets and all (e.g. `[dbo].[Foo]`)
    pub raw: String,
    /// Unquoted name parts, outermost first (e.g. `["dbo", "Foo"]`)
    pub parts: Vec<String>,
}

impl QualifiedName {
    /// Derive the identity key: schema + name, case-insensitive, brackets stripped.
    pub fn key(&self) -> ObjectKey {
        let name = self.parts.last().map(String::as_str).unwrap_or_default();
        let schema = if self.parts.len() >= 2 {
            self.parts[self.parts.len() - 2].as_str()
        } else {
            DEFAULT_SCHEMA
        };
        ObjectKey::new(schema, name)
    }
}

/// Normalized comparison key for an object name. Never written to output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub schema: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(schema: &str, name: &str) -> Self {
        Self {
            schema: normalize_identifier(schema).to_lowercase(),
            name: normalize_identifier(name).to_lowercase(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}
