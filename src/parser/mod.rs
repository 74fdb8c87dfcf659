//! T-SQL script scanning

mod batch_parser;
mod drop_parser;
mod identifier_utils;
mod preprocess_parser;
mod routine_parser;
mod statement_parser;
mod token_parser_base;
mod tsql_dialect;

pub use batch_parser::{split_batches, split_sql_batches, terminate, Batch, BATCH_TERMINATOR};
pub use drop_parser::{parse_drop_batch, TokenParsedDrop};
pub use identifier_utils::{
    format_token_sql, normalize_identifier, quote_string_literal, ObjectKey, QualifiedName,
    DEFAULT_SCHEMA,
};
pub use preprocess_parser::strip_noise;
pub use routine_parser::{parse_routine_header, RoutineHeader};
pub use statement_parser::{classify_script, scan_definitions, scan_drops};
pub use token_parser_base::{
    collapse_blank_lines, is_keyword_ci, is_layout, is_trivia, normalize_blank_lines,
    render_tokens, tokenize, TokenParser,
};
pub use tsql_dialect::TsqlScriptDialect;
