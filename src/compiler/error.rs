use super::lexer::LexerError;
use super::llvm::CodegenError;
use super::parser::error::ParserError;
use super::semantics::error::SemanticError;
use super::semantics::symbol_table::SymbolTableError;
use super::source::Span;

/// The closed set of failure categories a compilation can end with.  Each
/// stage raises its own error type; this enum is the single shape the driver
/// sees.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    Lexer(LexerError),
    Parser(ParserError),
    Semantic(SemanticError),
    SymbolTable(SymbolTableError),
    Codegen(CodegenError),
    /// An invariant violation inside the compiler itself.  Never reachable
    /// from well-formed or ill-formed source; carries no location.
    Internal(String),
}

impl ErrorKind {
    fn label(&self) -> &'static str {
        match self {
            ErrorKind::Lexer(_) => "Lexing error",
            ErrorKind::Parser(_) => "Parser error",
            ErrorKind::Semantic(_) => "Semantic error",
            ErrorKind::SymbolTable(_) => "Symbol-table error",
            ErrorKind::Codegen(_) => "Codegen error",
            ErrorKind::Internal(_) => "Internal compiler error",
        }
    }

    fn message(&self) -> String {
        match self {
            ErrorKind::Lexer(e) => format!("{}", e),
            ErrorKind::Parser(e) => format!("{}", e),
            ErrorKind::Semantic(e) => format!("{}", e),
            ErrorKind::SymbolTable(e) => format!("{}", e),
            ErrorKind::Codegen(e) => format!("{}", e),
            ErrorKind::Internal(msg) => msg.clone(),
        }
    }
}

/// An aborted compilation: one error kind plus the source position it was
/// raised at.  Internal errors have no position.
#[derive(Debug, PartialEq)]
pub struct CompileError {
    pub span: Option<Span>,
    pub kind: ErrorKind,
}

impl CompileError {
    pub fn new(span: Span, kind: ErrorKind) -> CompileError {
        CompileError {
            span: Some(span),
            kind,
        }
    }

    pub fn internal<S: Into<String>>(msg: S) -> CompileError {
        CompileError {
            span: None,
            kind: ErrorKind::Internal(msg.into()),
        }
    }

    /// Render the single diagnostic line for this error against the file the
    /// compilation was reading.
    pub fn format(&self, file: &str) -> String {
        match self.span {
            Some(span) => format!(
                "{} at file: {}, line: {}, column: {}: {}",
                self.kind.label(),
                file,
                span.start.line,
                span.start.column,
                self.kind.message()
            ),
            None => format!("{}: {}", self.kind.label(), self.kind.message()),
        }
    }
}

/// A non-fatal diagnostic.  Warnings are collected during codegen and
/// written to the diagnostic stream without aborting the compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub span: Span,
    pub message: String,
}

impl Warning {
    pub fn format(&self, file: &str) -> String {
        format!(
            "Warning at file: {}, line: {}, column: {}: {}",
            file, self.span.start.line, self.span.start.column, self.message
        )
    }
}
