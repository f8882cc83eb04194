/*!
The frontend wrapper layer.

The parser builds every AST node through these constructors, which shape
the node, run the semantic analyzer on it against the current lexical
scopes, and hand the annotated node back.  Scope open/close is anchored
here: a function's scope opens as its header finishes parsing and closes
when its body ends, so every check downstream of the header sees the right
scope chain.

`BuildMode::AstOnly` skips every semantic side effect; it exists for AST
dump debugging and the pretty-printer round trip.
*/
use log::debug;

use crate::compiler::ast::{
    BinaryOp, Block, CompareOp, Condition, Expression, FuncHeader, FunctionCall, FunctionDef,
    LValue, LValueKind, LocalDef, LogicOp, Program, Statement, UnaryOp, VarDef,
};
use crate::compiler::ast::{DataType, ScalarKind};
use crate::compiler::error::{CompileError, ErrorKind};
use crate::compiler::source::Span;

use super::analyzer;
use super::error::SemanticError;
use super::symbol_table::{DefStatus, Entry, SymbolTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Build the tree only; no symbol table, no checks, no annotations.
    AstOnly,
    Full,
}

pub struct AstBuilder {
    table: SymbolTable,
    mode: BuildMode,
}

impl AstBuilder {
    pub fn new(mode: BuildMode) -> AstBuilder {
        AstBuilder {
            table: SymbolTable::new(),
            mode,
        }
    }

    fn full(&self) -> bool {
        self.mode == BuildMode::Full
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    /// Record a function declaration (a header with no body yet).  The
    /// definition must appear before the enclosing scope closes.
    pub fn declare_function(&mut self, header: &FuncHeader) -> Result<(), CompileError> {
        if !self.full() {
            return Ok(());
        }
        for p in &header.params {
            analyzer::check_param(p)?;
        }
        let params = header
            .params
            .iter()
            .map(|p| (p.name.clone(), p.ty.clone(), p.mode))
            .collect();
        self.table.insert_function(
            header.span,
            &header.name,
            params,
            header.ret,
            DefStatus::Declared,
        )
    }

    /// Enter a function definition: merge with a prior declaration or
    /// insert a fresh entity, then open the function's scope and insert its
    /// parameters, assigning each its frame slot.  Returns the function's
    /// parent path annotation.
    pub fn begin_function(
        &mut self,
        header: &mut FuncHeader,
    ) -> Result<Vec<String>, CompileError> {
        if !self.full() {
            return Ok(vec![]);
        }
        debug!("begin function {}", header.name);
        for p in &header.params {
            analyzer::check_param(p)?;
        }

        match self.table.lookup(&header.name).cloned() {
            Some(Entry::Function(fe)) if !fe.runtime && fe.status == DefStatus::Declared => {
                analyzer::check_header_match(&fe, header)?;
                self.table.mark_defined(header.span, &header.name)?;
            }
            Some(_) => {
                return Err(CompileError::new(
                    header.span,
                    ErrorKind::Semantic(SemanticError::Redefinition(header.name.clone())),
                ))
            }
            None => {
                let params = header
                    .params
                    .iter()
                    .map(|p| (p.name.clone(), p.ty.clone(), p.mode))
                    .collect();
                self.table.insert_function(
                    header.span,
                    &header.name,
                    params,
                    header.ret,
                    DefStatus::Defined,
                )?;
            }
        }

        let parent_path = self.table.path().to_vec();
        self.table.open_scope(&header.name, header.ret);
        for p in header.params.iter_mut() {
            let offset = self
                .table
                .insert_param(p.span, &p.name, p.ty.clone(), p.mode)?;
            p.offset = Some(offset);
        }
        Ok(parent_path)
    }

    /// Leave a function definition: close its scope (validating that every
    /// nested declaration was defined) and assemble the node.
    pub fn end_function(
        &mut self,
        header: FuncHeader,
        locals: Vec<LocalDef>,
        body: Block,
        parent_path: Vec<String>,
    ) -> Result<FunctionDef, CompileError> {
        if self.full() {
            self.table.close_scope(body.span)?;
        }
        Ok(FunctionDef {
            header,
            locals,
            body,
            parent_path: Some(parent_path),
        })
    }

    /// A single variable out of a `var a, b, c : t;` definition.
    pub fn var_def(
        &mut self,
        name: String,
        ty: DataType,
        span: Span,
    ) -> Result<VarDef, CompileError> {
        let offset = if self.full() {
            analyzer::check_var_type(&name, &ty, span)?;
            Some(self.table.insert_var(span, &name, ty.clone())?)
        } else {
            None
        };
        Ok(VarDef {
            name,
            ty,
            span,
            offset,
        })
    }

    pub fn lvalue(&mut self, kind: LValueKind, span: Span) -> Result<LValue, CompileError> {
        let mut lv = LValue::new(kind, span);
        if self.full() {
            analyzer::analyze_lvalue(&self.table, &mut lv)?;
        }
        Ok(lv)
    }

    pub fn call(
        &mut self,
        name: String,
        args: Vec<Expression>,
        span: Span,
    ) -> Result<FunctionCall, CompileError> {
        let mut call = FunctionCall::new(name, args, span);
        if self.full() {
            analyzer::analyze_call(&self.table, &mut call)?;
        }
        Ok(call)
    }

    pub fn unary(
        &mut self,
        op: UnaryOp,
        operand: Expression,
        span: Span,
    ) -> Result<Expression, CompileError> {
        if self.full() {
            analyzer::check_arith(&[&operand])?;
        }
        Ok(Expression::Unary {
            op,
            operand: Box::new(operand),
            span,
        })
    }

    pub fn binary(
        &mut self,
        op: BinaryOp,
        left: Expression,
        right: Expression,
        span: Span,
    ) -> Result<Expression, CompileError> {
        if self.full() {
            analyzer::check_arith(&[&left, &right])?;
        }
        Ok(Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        })
    }

    pub fn compare(
        &mut self,
        op: CompareOp,
        left: Expression,
        right: Expression,
        span: Span,
    ) -> Result<Condition, CompileError> {
        if self.full() {
            analyzer::check_compare(&left, &right)?;
        }
        Ok(Condition::Compare {
            op,
            left,
            right,
            span,
        })
    }

    pub fn logic(
        &mut self,
        op: LogicOp,
        left: Condition,
        right: Condition,
        span: Span,
    ) -> Result<Condition, CompileError> {
        Ok(Condition::Logic {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        })
    }

    pub fn not(&mut self, operand: Condition, span: Span) -> Result<Condition, CompileError> {
        Ok(Condition::Not {
            operand: Box::new(operand),
            span,
        })
    }

    pub fn assign(
        &mut self,
        target: LValue,
        value: Expression,
        span: Span,
    ) -> Result<Statement, CompileError> {
        if self.full() {
            analyzer::analyze_assign(&target, &value, span)?;
        }
        Ok(Statement::Assign {
            target,
            value,
            span,
        })
    }

    pub fn ret(
        &mut self,
        value: Option<Expression>,
        span: Span,
    ) -> Result<Statement, CompileError> {
        if self.full() {
            analyzer::analyze_return(&self.table, &value, span)?;
        }
        Ok(Statement::Return { value, span })
    }

    /// Wrap up the compilation unit: the program function must take no
    /// parameters and return nothing, and nothing but the runtime library
    /// and the program function may remain in the global scope.
    pub fn finish_program(&mut self, main: FunctionDef) -> Result<Program, CompileError> {
        if self.full() {
            if !main.header.params.is_empty() {
                return Err(CompileError::new(
                    main.header.span,
                    ErrorKind::Semantic(SemanticError::MainHasParams(main.header.name.clone())),
                ));
            }
            if main.header.ret != ScalarKind::Nothing {
                return Err(CompileError::new(
                    main.header.span,
                    ErrorKind::Semantic(SemanticError::MainBadReturnType(
                        main.header.name.clone(),
                        main.header.ret,
                    )),
                ));
            }
            self.table.finalize(main.header.span)?;
        }
        Ok(Program { main })
    }
}
