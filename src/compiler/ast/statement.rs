use crate::compiler::source::{SourceIr, Span};

use super::expression::{Condition, Expression, FunctionCall, LValue};

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl SourceIr for Block {
    fn span(&self) -> Span {
        self.span
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Empty(Span),
    Assign {
        target: LValue,
        value: Expression,
        span: Span,
    },
    Block(Block),
    Call(FunctionCall),
    If {
        cond: Condition,
        then_stmt: Box<Statement>,
        else_stmt: Option<Box<Statement>>,
        span: Span,
    },
    While {
        cond: Condition,
        body: Box<Statement>,
        span: Span,
    },
    Return {
        value: Option<Expression>,
        span: Span,
    },
}

impl SourceIr for Statement {
    fn span(&self) -> Span {
        match self {
            Statement::Empty(span) => *span,
            Statement::Assign { span, .. } => *span,
            Statement::Block(b) => b.span,
            Statement::Call(c) => c.span,
            Statement::If { span, .. } => *span,
            Statement::While { span, .. } => *span,
            Statement::Return { span, .. } => *span,
        }
    }
}
