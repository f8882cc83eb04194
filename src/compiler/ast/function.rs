use crate::compiler::source::{SourceIr, Span};

use super::statement::Block;
use super::ty::{DataType, PassMode, ScalarKind};

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: DataType,
    pub mode: PassMode,
    pub span: Span,
    /// Index of this parameter's slot in the function's frame record.
    pub offset: Option<usize>,
}

impl Parameter {
    pub fn new(name: String, ty: DataType, mode: PassMode, span: Span) -> Parameter {
        Parameter {
            name,
            ty,
            mode,
            span,
            offset: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub ty: DataType,
    pub span: Span,
    /// Index of this variable's slot in the owning function's frame record.
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncHeader {
    pub name: String,
    pub params: Vec<Parameter>,
    pub ret: ScalarKind,
    pub span: Span,
}

impl SourceIr for FuncHeader {
    fn span(&self) -> Span {
        self.span
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocalDef {
    Var(VarDef),
    /// A function declaration: a header with the body to follow later in
    /// the same scope.
    Decl(FuncHeader),
    Func(FunctionDef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub header: FuncHeader,
    pub locals: Vec<LocalDef>,
    pub body: Block,
    /// Enclosing function ids, outermost first.  Empty for the program
    /// function.
    pub parent_path: Option<Vec<String>>,
}

impl FunctionDef {
    /// The unique lowered symbol for this function.
    pub fn qualified_name(&self) -> String {
        match self.parent_path.as_deref() {
            Some([]) | None => self.header.name.clone(),
            Some(path) => format!("{}.{}", path.join("."), self.header.name),
        }
    }

    pub fn is_program(&self) -> bool {
        matches!(self.parent_path.as_deref(), Some([]) | None)
    }
}

impl SourceIr for FunctionDef {
    fn span(&self) -> Span {
        self.header.span
    }
}

/// A whole compilation unit: exactly one top-level function with no
/// parameters and return type `nothing`.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub main: FunctionDef,
}
