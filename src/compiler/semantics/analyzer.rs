/*!
Per-node semantic checks and annotations.

The frontend wrapper calls one function here for each node it constructs,
so every check runs against the lexical scopes that are open at that point
in the parse.  Child nodes are always analyzed before their parent, which
lets `expr_type` read annotations instead of re-resolving.
*/
use crate::compiler::ast::{
    ArgPass, CallInfo, DataType, Dim, Expression, FuncHeader, FunctionCall, LValue, LValueKind,
    Parameter, PassMode, ScalarKind, StorageRef,
};
use crate::compiler::error::{CompileError, ErrorKind};
use crate::compiler::source::{SourceIr, Span};

use super::error::SemanticError;
use super::symbol_table::{Entry, FunctionEntry, SymbolTable};

fn sem_err(span: Span, e: SemanticError) -> CompileError {
    CompileError::new(span, ErrorKind::Semantic(e))
}

/// Variable types must have every dimension present and positive.
pub fn check_var_type(name: &str, ty: &DataType, span: Span) -> Result<(), CompileError> {
    for d in ty.dims() {
        match d {
            Dim::Unspecified => {
                return Err(sem_err(
                    span,
                    SemanticError::UnspecifiedDimension(name.to_string()),
                ))
            }
            Dim::Fixed(n) if *n <= 0 => {
                return Err(sem_err(
                    span,
                    SemanticError::DimensionNotPositive(name.to_string()),
                ))
            }
            Dim::Fixed(_) => (),
        }
    }
    Ok(())
}

/// Parameters may leave only the leading dimension unspecified, and array
/// parameters must be by-reference.
pub fn check_param(p: &Parameter) -> Result<(), CompileError> {
    if p.ty.is_array() && p.mode != PassMode::ByReference {
        return Err(sem_err(
            p.span,
            SemanticError::ArrayParamByValue(p.name.clone()),
        ));
    }
    for (i, d) in p.ty.dims().iter().enumerate() {
        match d {
            Dim::Unspecified if i != 0 => {
                return Err(sem_err(
                    p.span,
                    SemanticError::UnspecifiedDimension(p.name.clone()),
                ))
            }
            Dim::Fixed(n) if *n <= 0 => {
                return Err(sem_err(
                    p.span,
                    SemanticError::DimensionNotPositive(p.name.clone()),
                ))
            }
            _ => (),
        }
    }
    Ok(())
}

/// Resolve an l-value against the scope chain and annotate it with its type
/// and storage reference.  Index bases are resolved recursively; index
/// expressions must already be analyzed.
pub fn analyze_lvalue(table: &SymbolTable, lv: &mut LValue) -> Result<(), CompileError> {
    let span = lv.span;
    match &mut lv.kind {
        LValueKind::Ident(id) => {
            let entry = table
                .lookup_all(id)
                .ok_or_else(|| sem_err(span, SemanticError::UndefinedIdentifier(id.clone())))?;
            match entry {
                Entry::Variable(v) => {
                    lv.storage = Some(StorageRef {
                        offset: v.offset,
                        hops: table.depth() - v.parent_path.len(),
                        indirect: false,
                        decayed: false,
                    });
                    lv.ty = Some(v.ty.clone());
                }
                Entry::Parameter(p) => {
                    lv.storage = Some(StorageRef {
                        offset: p.offset,
                        hops: table.depth() - p.parent_path.len(),
                        indirect: p.mode == PassMode::ByReference,
                        decayed: p.ty.has_unspecified_dim(),
                    });
                    lv.ty = Some(p.ty.clone());
                }
                Entry::Function(_) => {
                    return Err(sem_err(span, SemanticError::NotAVariable(id.clone())))
                }
            }
        }
        LValueKind::StringLit(bytes) => {
            lv.ty = Some(DataType::Array {
                elem: ScalarKind::Char,
                dims: vec![Dim::Fixed(bytes.len() as i64 + 1)],
            });
        }
        LValueKind::Index { base, indices } => {
            analyze_lvalue(table, base)?;
            for ix in indices.iter() {
                if expr_type(ix)? != DataType::Scalar(ScalarKind::Int) {
                    return Err(sem_err(ix.span(), SemanticError::IndexNotInt));
                }
            }
            let base_ty = base
                .ty
                .clone()
                .ok_or_else(|| CompileError::internal("l-value base missing type annotation"))?;
            if !base_ty.is_array() {
                return Err(sem_err(span, SemanticError::IndexedNonArray(base_ty)));
            }
            if indices.len() > base_ty.dims().len() {
                return Err(sem_err(
                    span,
                    SemanticError::TooManyIndices {
                        have: indices.len(),
                        max: base_ty.dims().len(),
                    },
                ));
            }
            lv.ty = Some(base_ty.index_by(indices.len()));
        }
    }
    Ok(())
}

/// The type of an already-analyzed expression.
pub fn expr_type(e: &Expression) -> Result<DataType, CompileError> {
    match e {
        Expression::IntLit(..) => Ok(DataType::Scalar(ScalarKind::Int)),
        Expression::CharLit(..) => Ok(DataType::Scalar(ScalarKind::Char)),
        Expression::LValue(lv) => lv
            .ty
            .clone()
            .ok_or_else(|| CompileError::internal("l-value missing type annotation")),
        Expression::Call(call) => call
            .resolved
            .as_ref()
            .map(|r| DataType::Scalar(r.ret))
            .ok_or_else(|| CompileError::internal("call missing resolution annotation")),
        Expression::Unary { .. } | Expression::Binary { .. } => {
            Ok(DataType::Scalar(ScalarKind::Int))
        }
    }
}

/// Arithmetic is integer-only.
pub fn check_arith(operands: &[&Expression]) -> Result<(), CompileError> {
    for e in operands {
        let t = expr_type(e)?;
        if t != DataType::Scalar(ScalarKind::Int) {
            return Err(sem_err(e.span(), SemanticError::ArithmeticOnNonInt(t)));
        }
    }
    Ok(())
}

/// Comparison operands must both be int or both be char.
pub fn check_compare(left: &Expression, right: &Expression) -> Result<(), CompileError> {
    let lt = expr_type(left)?;
    let rt = expr_type(right)?;
    let scalar = matches!(
        lt,
        DataType::Scalar(ScalarKind::Int) | DataType::Scalar(ScalarKind::Char)
    );
    if !scalar || lt != rt {
        return Err(sem_err(
            right.span(),
            SemanticError::CompareOperandMismatch(lt, rt),
        ));
    }
    Ok(())
}

/// Variable/parameter compatibility for call arguments: scalar types must
/// match exactly; array arguments must match element type and dimension
/// count, and each dimension, unless the parameter's leading dimension is
/// unspecified in which case only the trailing dimensions must agree.
fn compatible(param: &DataType, arg: &DataType) -> bool {
    match (param, arg) {
        (DataType::Scalar(p), DataType::Scalar(a)) => p == a,
        (
            DataType::Array {
                elem: pe,
                dims: pd,
            },
            DataType::Array {
                elem: ae,
                dims: ad,
            },
        ) => {
            pe == ae
                && pd.len() == ad.len()
                && (pd == ad
                    || (matches!(pd.first(), Some(Dim::Unspecified)) && pd[1..] == ad[1..]))
        }
        _ => false,
    }
}

/// Resolve a call site: arity, reference arguments must be l-values, types
/// compatible.  Annotates the node with the callee's parent path, the
/// caller's path, and the per-argument pass modes.
pub fn analyze_call(table: &SymbolTable, call: &mut FunctionCall) -> Result<(), CompileError> {
    let fe: FunctionEntry = match table.lookup_all(&call.name) {
        Some(Entry::Function(fe)) => fe.clone(),
        Some(_) => {
            return Err(sem_err(
                call.span,
                SemanticError::NotAFunction(call.name.clone()),
            ))
        }
        None => {
            return Err(sem_err(
                call.span,
                SemanticError::UndefinedIdentifier(call.name.clone()),
            ))
        }
    };

    if fe.params.len() != call.args.len() {
        return Err(sem_err(
            call.span,
            SemanticError::WrongArgCount {
                name: call.name.clone(),
                expected: fe.params.len(),
                found: call.args.len(),
            },
        ));
    }

    let mut passes = vec![];
    for (i, (arg, (_, pty, pmode))) in call.args.iter().zip(fe.params.iter()).enumerate() {
        let aty = expr_type(arg)?;
        if *pmode == PassMode::ByReference && !matches!(arg, Expression::LValue(_)) {
            return Err(sem_err(
                arg.span(),
                SemanticError::RefArgNotLValue {
                    name: call.name.clone(),
                    index: i,
                },
            ));
        }
        if !compatible(pty, &aty) {
            return Err(sem_err(
                arg.span(),
                SemanticError::ArgTypeMismatch {
                    name: call.name.clone(),
                    index: i,
                    expected: pty.clone(),
                    found: aty,
                },
            ));
        }
        passes.push(ArgPass {
            mode: *pmode,
            decay: pty.has_unspecified_dim(),
        });
    }

    call.resolved = Some(CallInfo {
        callee_parent: fe.parent_path,
        caller_path: table.path().to_vec(),
        args: passes,
        ret: fe.ret,
        runtime: fe.runtime,
    });
    Ok(())
}

fn string_backed(lv: &LValue) -> bool {
    match &lv.kind {
        LValueKind::StringLit(_) => true,
        LValueKind::Index { base, .. } => string_backed(base),
        LValueKind::Ident(_) => false,
    }
}

/// Assignment target and value must agree on a scalar type; string
/// literals are read-only and whole arrays cannot be assigned.
pub fn analyze_assign(
    target: &LValue,
    value: &Expression,
    span: Span,
) -> Result<(), CompileError> {
    if string_backed(target) {
        return Err(sem_err(target.span, SemanticError::AssignToStringLiteral));
    }
    let tty = target
        .ty
        .clone()
        .ok_or_else(|| CompileError::internal("assignment target missing type annotation"))?;
    if tty.is_array() {
        return Err(sem_err(span, SemanticError::AssignToArray));
    }
    let vty = expr_type(value)?;
    if tty != vty {
        return Err(sem_err(span, SemanticError::AssignTypeMismatch(tty, vty)));
    }
    Ok(())
}

/// The returned value's scalar type must equal the enclosing function's
/// return type.  A bare `return` requires a `nothing` function; a call to
/// a `nothing` function is a legal return payload (the call is emitted for
/// effect).
pub fn analyze_return(
    table: &SymbolTable,
    value: &Option<Expression>,
    span: Span,
) -> Result<(), CompileError> {
    let expected = table.current_return()?;
    match value {
        None => {
            if expected != ScalarKind::Nothing {
                return Err(sem_err(span, SemanticError::ReturnMissingValue(expected)));
            }
            Ok(())
        }
        Some(e) => {
            let t = expr_type(e)?;
            if t != DataType::Scalar(expected) {
                return Err(sem_err(e.span(), SemanticError::ReturnTypeMismatch(expected, t)));
            }
            Ok(())
        }
    }
}

/// Declaration/definition heads must match exactly on return type,
/// parameter count, parameter types, and pass modes.
pub fn check_header_match(entry: &FunctionEntry, header: &FuncHeader) -> Result<(), CompileError> {
    let mismatch = |detail: String| {
        sem_err(
            header.span,
            SemanticError::HeaderMismatch {
                name: header.name.clone(),
                detail,
            },
        )
    };

    if entry.ret != header.ret {
        return Err(mismatch(format!(
            "return type declared {} but defined {}",
            entry.ret, header.ret
        )));
    }
    if entry.params.len() != header.params.len() {
        return Err(mismatch(format!(
            "declared with {} parameters but defined with {}",
            entry.params.len(),
            header.params.len()
        )));
    }
    for ((_, dty, dmode), p) in entry.params.iter().zip(header.params.iter()) {
        if *dty != p.ty {
            return Err(mismatch(format!(
                "parameter {} declared {} but defined {}",
                p.name, dty, p.ty
            )));
        }
        if *dmode != p.mode {
            return Err(mismatch(format!(
                "parameter {} declared {} but defined {}",
                p.name, dmode, p.mode
            )));
        }
    }
    Ok(())
}
