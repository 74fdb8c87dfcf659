//! Script model element types

use std::fmt;

use crate::parser::ObjectKey;

/// Kind of a stored routine definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Function,
    Procedure,
}

impl ObjectKind {
    /// Keyword used in generated DROP statements and verification probes
    pub fn keyword(self) -> &'static str {
        match self {
            ObjectKind::Function => "FUNCTION",
            ObjectKind::Procedure => "PROCEDURE",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Action word at the head of a definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `CREATE`
    Create,
    /// `ALTER` or `CREATE OR ALTER`
    Alter,
}

/// Kind of object removed by an explicit drop batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropKind {
    Procedure,
    Function,
    Table,
}

impl DropKind {
    pub fn keyword(self) -> &'static str {
        match self {
            DropKind::Procedure => "PROCEDURE",
            DropKind::Function => "FUNCTION",
            DropKind::Table => "TABLE",
        }
    }
}

impl From<ObjectKind> for DropKind {
    fn from(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Function => DropKind::Function,
            ObjectKind::Procedure => DropKind::Procedure,
        }
    }
}

/// A function or procedure definition recognized in the script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlObject {
    pub kind: ObjectKind,
    pub action: Action,
    /// Name exactly as written, e.g. `[dbo].[Foo]`, `dbo.Foo` or `Foo`
    pub qualified_name: String,
    /// Identity used for deduplication only
    pub key: ObjectKey,
    /// Full definition text from the header to the end of its batch
    pub body: String,
}

/// An explicit drop found in the script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropStatement {
    pub kind: DropKind,
    /// Name exactly as written
    pub name: String,
    pub key: ObjectKey,
}

impl DropStatement {
    /// The conditional form emitted in place of the original drop.
    pub fn body(&self) -> String {
        format!("DROP {} IF EXISTS {};", self.kind.keyword(), self.name)
    }
}

/// Output of the batch classifier: three lists in textual order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedScript {
    pub functions: Vec<SqlObject>,
    pub procedures: Vec<SqlObject>,
    pub drops: Vec<DropStatement>,
}

impl ClassifiedScript {
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.procedures.is_empty() && self.drops.is_empty()
    }
}
