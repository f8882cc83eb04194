use crate::compiler::source::{SourceIr, Span};

use super::ty::{DataType, PassMode, ScalarKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Plus => f.write_str("+"),
            UnaryOp::Minus => f.write_str("-"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOp::Add => f.write_str("+"),
            BinaryOp::Sub => f.write_str("-"),
            BinaryOp::Mul => f.write_str("*"),
            BinaryOp::Div => f.write_str("div"),
            BinaryOp::Mod => f.write_str("mod"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareOp::Eq => f.write_str("="),
            CompareOp::Neq => f.write_str("#"),
            CompareOp::Lt => f.write_str("<"),
            CompareOp::Gt => f.write_str(">"),
            CompareOp::Le => f.write_str("<="),
            CompareOp::Ge => f.write_str(">="),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

impl std::fmt::Display for LogicOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogicOp::And => f.write_str("and"),
            LogicOp::Or => f.write_str("or"),
        }
    }
}

/// Where a resolved identifier lives: which frame slot, how many static
/// links away, and how the slot is to be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRef {
    /// Index of the slot within the defining function's frame record.
    pub offset: usize,
    /// Static-link dereferences from the use site to the defining frame.
    pub hops: usize,
    /// The slot holds a pointer to the storage (reference parameters)
    /// rather than the storage itself.
    pub indirect: bool,
    /// The slot holds a pointer to the element type with the leading array
    /// dimension stripped (reference parameter with unspecified leading
    /// dimension).
    pub decayed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LValueKind {
    Ident(String),
    /// Escape sequences already decoded; the trailing NUL is not stored but
    /// is counted in the l-value's array type.
    StringLit(Vec<u8>),
    Index {
        base: Box<LValue>,
        indices: Vec<Expression>,
    },
}

/// An expression denoting a storage location.  `ty` and `storage` are
/// written by semantic analysis; `storage` stays `None` for string
/// literals and indexed accesses (their base carries it).
#[derive(Debug, Clone, PartialEq)]
pub struct LValue {
    pub kind: LValueKind,
    pub span: Span,
    pub ty: Option<DataType>,
    pub storage: Option<StorageRef>,
}

impl LValue {
    pub fn new(kind: LValueKind, span: Span) -> LValue {
        LValue {
            kind,
            span,
            ty: None,
            storage: None,
        }
    }
}

impl SourceIr for LValue {
    fn span(&self) -> Span {
        self.span
    }
}

/// How one argument is to be handed to its parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgPass {
    pub mode: PassMode,
    /// The parameter's leading array dimension is unspecified, so the
    /// argument pointer decays to a first-element pointer.
    pub decay: bool,
}

/// Resolution results for a call site, written by semantic analysis and
/// read by codegen to compute the static link and the flattened callee
/// symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct CallInfo {
    /// Enclosing function ids of the callee, outermost first.
    pub callee_parent: Vec<String>,
    /// Enclosing function ids of the call site, outermost first, including
    /// the function the call appears in.
    pub caller_path: Vec<String>,
    pub args: Vec<ArgPass>,
    pub ret: ScalarKind,
    /// Callee is part of the runtime library: plain symbol, no static link.
    pub runtime: bool,
}

impl CallInfo {
    /// The unique lowered symbol of the callee.
    pub fn qualified_name(&self, name: &str) -> String {
        if self.callee_parent.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.callee_parent.join("."), name)
        }
    }

    /// Static-link dereferences needed to produce the callee's link
    /// argument, starting from the caller's own frame.
    pub fn link_hops(&self) -> usize {
        self.caller_path.len() - self.callee_parent.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expression>,
    pub span: Span,
    pub resolved: Option<CallInfo>,
}

impl FunctionCall {
    pub fn new(name: String, args: Vec<Expression>, span: Span) -> FunctionCall {
        FunctionCall {
            name,
            args,
            span,
            resolved: None,
        }
    }
}

impl SourceIr for FunctionCall {
    fn span(&self) -> Span {
        self.span
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    IntLit(i64, Span),
    CharLit(u8, Span),
    LValue(Box<LValue>),
    Call(FunctionCall),
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
        span: Span,
    },
}

impl SourceIr for Expression {
    fn span(&self) -> Span {
        match self {
            Expression::IntLit(_, span) | Expression::CharLit(_, span) => *span,
            Expression::LValue(lv) => lv.span,
            Expression::Call(call) => call.span,
            Expression::Unary { span, .. } | Expression::Binary { span, .. } => *span,
        }
    }
}

/// Conditions are a syntactic category of their own: comparisons over
/// scalars, combined with short-circuiting connectives.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        op: CompareOp,
        left: Expression,
        right: Expression,
        span: Span,
    },
    Logic {
        op: LogicOp,
        left: Box<Condition>,
        right: Box<Condition>,
        span: Span,
    },
    Not {
        operand: Box<Condition>,
        span: Span,
    },
}

impl SourceIr for Condition {
    fn span(&self) -> Span {
        match self {
            Condition::Compare { span, .. }
            | Condition::Logic { span, .. }
            | Condition::Not { span, .. } => *span,
        }
    }
}
