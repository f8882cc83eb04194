/*!
Recursive-descent parser over a [`TokenStream`].

Every node is constructed through the [`AstBuilder`] wrapper, which runs
the semantic analyzer against the scopes that are open at that point in
the parse.  The dangling `else` binds to the innermost open `if` simply by
the shape of the descent.
*/
use log::debug;

use crate::compiler::ast::{
    BinaryOp, Block, CompareOp, Condition, DataType, Dim, Expression, FuncHeader, FunctionCall,
    FunctionDef, LValue, LValueKind, LocalDef, LogicOp, Parameter, PassMode, Program, ScalarKind,
    Statement, UnaryOp, VarDef,
};
use crate::compiler::error::CompileError;
use crate::compiler::lexer::tokens::{Lex, Primitive};
use crate::compiler::semantics::AstBuilder;
use crate::compiler::source::{SourceIr, Span};

use super::error::ParserError;
use super::tokenstream::TokenStream;

pub struct Parser<'a> {
    builder: &'a mut AstBuilder,
}

impl<'a> Parser<'a> {
    pub fn new(builder: &'a mut AstBuilder) -> Parser<'a> {
        Parser { builder }
    }

    /// Program = one function definition, then end of input.
    pub fn program(&mut self, ts: &mut TokenStream) -> Result<Program, CompileError> {
        debug!("parse program");
        let main = self.function_def(ts)?;
        if let Some(t) = ts.peek() {
            return Err(ts.parser_err(ParserError::ExtraTokens(t.sym.clone())));
        }
        self.builder.finish_program(main)
    }

    fn function_def(&mut self, ts: &mut TokenStream) -> Result<FunctionDef, CompileError> {
        let header = self.header(ts)?;
        self.function_rest(ts, header)
    }

    /// Locals and body of a function whose header has been parsed.  The
    /// function's scope opens here and closes when the body block ends.
    fn function_rest(
        &mut self,
        ts: &mut TokenStream,
        mut header: FuncHeader,
    ) -> Result<FunctionDef, CompileError> {
        let parent_path = self.builder.begin_function(&mut header)?;

        let mut locals = vec![];
        loop {
            if ts.test_if(&Lex::Fun) {
                let nested = self.header(ts)?;
                if ts.next_if(&Lex::Semicolon).is_some() {
                    self.builder.declare_function(&nested)?;
                    locals.push(LocalDef::Decl(nested));
                } else {
                    locals.push(LocalDef::Func(self.function_rest(ts, nested)?));
                }
            } else if ts.test_if(&Lex::Var) {
                for v in self.var_defs(ts)? {
                    locals.push(LocalDef::Var(v));
                }
            } else {
                break;
            }
        }

        let body = self.block(ts)?;
        self.builder.end_function(header, locals, body, parent_path)
    }

    fn header(&mut self, ts: &mut TokenStream) -> Result<FuncHeader, CompileError> {
        let fun = ts.expect(&Lex::Fun)?;
        let (name, _) = ts.expect_identifier()?;
        debug!("parse header of {}", name);
        ts.expect(&Lex::LParen)?;

        let mut params = vec![];
        if !ts.test_if(&Lex::RParen) {
            loop {
                params.extend(self.param_group(ts)?);
                if ts.next_if(&Lex::Semicolon).is_none() {
                    break;
                }
            }
        }
        ts.expect(&Lex::RParen)?;
        ts.expect(&Lex::Colon)?;
        let (ret, ret_span) = self.ret_type(ts)?;

        Ok(FuncHeader {
            name,
            params,
            ret,
            span: fun.span.to(ret_span),
        })
    }

    /// One `ref? a, b, c : type` group of the parameter list.
    fn param_group(&mut self, ts: &mut TokenStream) -> Result<Vec<Parameter>, CompileError> {
        let mode = if ts.next_if(&Lex::Ref).is_some() {
            PassMode::ByReference
        } else {
            PassMode::ByValue
        };

        let mut names = vec![ts.expect_identifier()?];
        while ts.next_if(&Lex::Comma).is_some() {
            names.push(ts.expect_identifier()?);
        }
        ts.expect(&Lex::Colon)?;
        let ty = self.fpar_type(ts)?;

        Ok(names
            .into_iter()
            .map(|(name, span)| Parameter::new(name, ty.clone(), mode, span))
            .collect())
    }

    fn scalar(&mut self, ts: &mut TokenStream) -> Result<(ScalarKind, Span), CompileError> {
        match ts.peek().map(|t| t.sym.clone()) {
            Some(Lex::Primitive(Primitive::Int)) => {
                let t = ts.next().expect("peeked token must exist");
                Ok((ScalarKind::Int, t.span))
            }
            Some(Lex::Primitive(Primitive::Char)) => {
                let t = ts.next().expect("peeked token must exist");
                Ok((ScalarKind::Char, t.span))
            }
            _ => Err(ts.parser_err(ParserError::ExpectedType(ts.found()))),
        }
    }

    fn ret_type(&mut self, ts: &mut TokenStream) -> Result<(ScalarKind, Span), CompileError> {
        if let Some(t) = ts.next_if(&Lex::Primitive(Primitive::Nothing)) {
            return Ok((ScalarKind::Nothing, t.span));
        }
        self.scalar(ts)
    }

    /// Parameter types may leave the leading dimension empty: `char[]`.
    fn fpar_type(&mut self, ts: &mut TokenStream) -> Result<DataType, CompileError> {
        let (elem, _) = self.scalar(ts)?;
        let mut dims = vec![];
        if ts.next_if(&Lex::LBracket).is_some() {
            if ts.next_if(&Lex::RBracket).is_some() {
                dims.push(Dim::Unspecified);
            } else {
                let (n, _) = ts.expect_int_literal()?;
                ts.expect(&Lex::RBracket)?;
                dims.push(Dim::Fixed(n));
            }
        }
        while ts.next_if(&Lex::LBracket).is_some() {
            let (n, _) = ts.expect_int_literal()?;
            ts.expect(&Lex::RBracket)?;
            dims.push(Dim::Fixed(n));
        }
        Ok(Self::make_type(elem, dims))
    }

    fn var_type(&mut self, ts: &mut TokenStream) -> Result<DataType, CompileError> {
        let (elem, _) = self.scalar(ts)?;
        let mut dims = vec![];
        while ts.next_if(&Lex::LBracket).is_some() {
            let (n, _) = ts.expect_int_literal()?;
            ts.expect(&Lex::RBracket)?;
            dims.push(Dim::Fixed(n));
        }
        Ok(Self::make_type(elem, dims))
    }

    fn make_type(elem: ScalarKind, dims: Vec<Dim>) -> DataType {
        if dims.is_empty() {
            DataType::Scalar(elem)
        } else {
            DataType::Array { elem, dims }
        }
    }

    /// `var a, b : int[3];` becomes one [`VarDef`] per name.
    fn var_defs(&mut self, ts: &mut TokenStream) -> Result<Vec<VarDef>, CompileError> {
        ts.expect(&Lex::Var)?;
        let mut names = vec![ts.expect_identifier()?];
        while ts.next_if(&Lex::Comma).is_some() {
            names.push(ts.expect_identifier()?);
        }
        ts.expect(&Lex::Colon)?;
        let ty = self.var_type(ts)?;
        ts.expect(&Lex::Semicolon)?;

        let mut defs = vec![];
        for (name, span) in names {
            defs.push(self.builder.var_def(name, ty.clone(), span)?);
        }
        Ok(defs)
    }

    fn block(&mut self, ts: &mut TokenStream) -> Result<Block, CompileError> {
        let lb = ts.expect(&Lex::LBrace)?;
        let mut statements = vec![];
        while !ts.test_if(&Lex::RBrace) {
            statements.push(self.statement(ts)?);
        }
        let rb = ts.expect(&Lex::RBrace)?;
        Ok(Block {
            statements,
            span: lb.span.to(rb.span),
        })
    }

    fn statement(&mut self, ts: &mut TokenStream) -> Result<Statement, CompileError> {
        match ts.peek().map(|t| t.sym.clone()) {
            Some(Lex::Semicolon) => {
                let t = ts.next().expect("peeked token must exist");
                Ok(Statement::Empty(t.span))
            }
            Some(Lex::LBrace) => Ok(Statement::Block(self.block(ts)?)),
            Some(Lex::If) => self.if_statement(ts),
            Some(Lex::While) => self.while_statement(ts),
            Some(Lex::Return) => self.return_statement(ts),
            Some(Lex::Identifier(_)) => {
                if matches!(ts.peek_at(1), Some(t) if t.sym == Lex::LParen) {
                    let call = self.function_call(ts)?;
                    ts.expect(&Lex::Semicolon)?;
                    Ok(Statement::Call(call))
                } else {
                    self.assignment(ts)
                }
            }
            Some(Lex::StringLit(_)) => self.assignment(ts),
            found => Err(ts.parser_err(ParserError::ExpectedStatement(found))),
        }
    }

    fn if_statement(&mut self, ts: &mut TokenStream) -> Result<Statement, CompileError> {
        let start = ts.expect(&Lex::If)?;
        let cond = self.condition(ts)?;
        ts.expect(&Lex::Then)?;
        let then_stmt = self.statement(ts)?;
        let (else_stmt, end_span) = if ts.next_if(&Lex::Else).is_some() {
            let els = self.statement(ts)?;
            let span = els.span();
            (Some(Box::new(els)), span)
        } else {
            (None, then_stmt.span())
        };
        Ok(Statement::If {
            cond,
            then_stmt: Box::new(then_stmt),
            else_stmt,
            span: start.span.to(end_span),
        })
    }

    fn while_statement(&mut self, ts: &mut TokenStream) -> Result<Statement, CompileError> {
        let start = ts.expect(&Lex::While)?;
        let cond = self.condition(ts)?;
        ts.expect(&Lex::Do)?;
        let body = self.statement(ts)?;
        let span = start.span.to(body.span());
        Ok(Statement::While {
            cond,
            body: Box::new(body),
            span,
        })
    }

    fn return_statement(&mut self, ts: &mut TokenStream) -> Result<Statement, CompileError> {
        let start = ts.expect(&Lex::Return)?;
        let value = if ts.test_if(&Lex::Semicolon) {
            None
        } else {
            Some(self.expression(ts)?)
        };
        let sc = ts.expect(&Lex::Semicolon)?;
        self.builder.ret(value, start.span.to(sc.span))
    }

    fn assignment(&mut self, ts: &mut TokenStream) -> Result<Statement, CompileError> {
        let target = self.lvalue(ts)?;
        ts.expect(&Lex::Assign)?;
        let value = self.expression(ts)?;
        let sc = ts.expect(&Lex::Semicolon)?;
        let span = target.span.to(sc.span);
        self.builder.assign(target, value, span)
    }

    /// l-value = identifier or string literal, with any number of index
    /// brackets applied.
    fn lvalue(&mut self, ts: &mut TokenStream) -> Result<LValue, CompileError> {
        let (base_kind, base_span) = match ts.peek().map(|t| t.sym.clone()) {
            Some(Lex::Identifier(_)) => {
                let (id, span) = ts.expect_identifier()?;
                (LValueKind::Ident(id), span)
            }
            Some(Lex::StringLit(bytes)) => {
                let t = ts.next().expect("peeked token must exist");
                (LValueKind::StringLit(bytes), t.span)
            }
            found => return Err(ts.parser_err(ParserError::ExpectedLValue(found))),
        };

        let mut indices = vec![];
        let mut end_span = base_span;
        while ts.next_if(&Lex::LBracket).is_some() {
            let ix = self.expression(ts)?;
            let rb = ts.expect(&Lex::RBracket)?;
            end_span = rb.span;
            indices.push(ix);
        }

        let span = base_span.to(end_span);
        let kind = if indices.is_empty() {
            base_kind
        } else {
            LValueKind::Index {
                base: Box::new(LValue::new(base_kind, base_span)),
                indices,
            }
        };
        self.builder.lvalue(kind, span)
    }

    fn function_call(&mut self, ts: &mut TokenStream) -> Result<FunctionCall, CompileError> {
        let (name, name_span) = ts.expect_identifier()?;
        ts.expect(&Lex::LParen)?;
        let mut args = vec![];
        if !ts.test_if(&Lex::RParen) {
            loop {
                args.push(self.expression(ts)?);
                if ts.next_if(&Lex::Comma).is_none() {
                    break;
                }
            }
        }
        let rp = ts.expect(&Lex::RParen)?;
        self.builder.call(name, args, name_span.to(rp.span))
    }

    fn expression(&mut self, ts: &mut TokenStream) -> Result<Expression, CompileError> {
        let mut left = self.term(ts)?;
        loop {
            let op = match ts.peek().map(|t| &t.sym) {
                Some(Lex::Add) => BinaryOp::Add,
                Some(Lex::Minus) => BinaryOp::Sub,
                _ => break,
            };
            ts.next();
            let right = self.term(ts)?;
            let span = left.span().to(right.span());
            left = self.builder.binary(op, left, right, span)?;
        }
        Ok(left)
    }

    fn term(&mut self, ts: &mut TokenStream) -> Result<Expression, CompileError> {
        let mut left = self.factor(ts)?;
        loop {
            let op = match ts.peek().map(|t| &t.sym) {
                Some(Lex::Mul) => BinaryOp::Mul,
                Some(Lex::Div) => BinaryOp::Div,
                Some(Lex::Mod) => BinaryOp::Mod,
                _ => break,
            };
            ts.next();
            let right = self.factor(ts)?;
            let span = left.span().to(right.span());
            left = self.builder.binary(op, left, right, span)?;
        }
        Ok(left)
    }

    fn factor(&mut self, ts: &mut TokenStream) -> Result<Expression, CompileError> {
        match ts.peek().map(|t| t.sym.clone()) {
            Some(Lex::Add) | Some(Lex::Minus) => {
                let t = ts.next().expect("peeked token must exist");
                let op = match t.sym {
                    Lex::Add => UnaryOp::Plus,
                    _ => UnaryOp::Minus,
                };
                let operand = self.factor(ts)?;
                let span = t.span.to(operand.span());
                self.builder.unary(op, operand, span)
            }
            Some(Lex::IntLit(v)) => {
                let t = ts.next().expect("peeked token must exist");
                Ok(Expression::IntLit(v, t.span))
            }
            Some(Lex::CharLit(c)) => {
                let t = ts.next().expect("peeked token must exist");
                Ok(Expression::CharLit(c, t.span))
            }
            Some(Lex::LParen) => {
                ts.next();
                let e = self.expression(ts)?;
                ts.expect(&Lex::RParen)?;
                Ok(e)
            }
            Some(Lex::Identifier(_)) => {
                if matches!(ts.peek_at(1), Some(t) if t.sym == Lex::LParen) {
                    Ok(Expression::Call(self.function_call(ts)?))
                } else {
                    Ok(Expression::LValue(Box::new(self.lvalue(ts)?)))
                }
            }
            Some(Lex::StringLit(_)) => Ok(Expression::LValue(Box::new(self.lvalue(ts)?))),
            found => Err(ts.parser_err(ParserError::ExpectedExpression(found))),
        }
    }

    fn condition(&mut self, ts: &mut TokenStream) -> Result<Condition, CompileError> {
        self.cond_or(ts)
    }

    fn cond_or(&mut self, ts: &mut TokenStream) -> Result<Condition, CompileError> {
        let mut left = self.cond_and(ts)?;
        while ts.next_if(&Lex::Or).is_some() {
            let right = self.cond_and(ts)?;
            let span = left.span().to(right.span());
            left = self.builder.logic(LogicOp::Or, left, right, span)?;
        }
        Ok(left)
    }

    fn cond_and(&mut self, ts: &mut TokenStream) -> Result<Condition, CompileError> {
        let mut left = self.cond_not(ts)?;
        while ts.next_if(&Lex::And).is_some() {
            let right = self.cond_not(ts)?;
            let span = left.span().to(right.span());
            left = self.builder.logic(LogicOp::And, left, right, span)?;
        }
        Ok(left)
    }

    fn cond_not(&mut self, ts: &mut TokenStream) -> Result<Condition, CompileError> {
        if let Some(t) = ts.next_if(&Lex::Not) {
            let operand = self.cond_not(ts)?;
            let span = t.span.to(operand.span());
            return self.builder.not(operand, span);
        }
        self.cond_atom(ts)
    }

    /// A `(` can open either a parenthesized condition or a parenthesized
    /// expression on the left of a comparison.  Try the condition reading
    /// first and fall back on the comparison; the attempt has no semantic
    /// side effects (expressions and conditions never insert symbols).
    fn cond_atom(&mut self, ts: &mut TokenStream) -> Result<Condition, CompileError> {
        if ts.test_if(&Lex::LParen) {
            let save = ts.index();
            ts.next();
            match self.condition(ts) {
                Ok(c) => {
                    if ts.next_if(&Lex::RParen).is_some() {
                        return Ok(c);
                    }
                    ts.set_index(save);
                }
                Err(_) => ts.set_index(save),
            }
        }

        let left = self.expression(ts)?;
        let op = match ts.peek().map(|t| &t.sym) {
            Some(Lex::Eq) => CompareOp::Eq,
            Some(Lex::NEq) => CompareOp::Neq,
            Some(Lex::Ls) => CompareOp::Lt,
            Some(Lex::Gr) => CompareOp::Gt,
            Some(Lex::LsEq) => CompareOp::Le,
            Some(Lex::GrEq) => CompareOp::Ge,
            _ => return Err(ts.parser_err(ParserError::ExpectedCondition(ts.found()))),
        };
        ts.next();
        let right = self.expression(ts)?;
        let span = left.span().to(right.span());
        self.builder.compare(op, left, right, span)
    }
}
