use crate::compiler::ast::{DataType, ScalarKind};

/// Errors generated while checking declarations, names, types, and call
/// sites against the symbol table.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticError {
    UndefinedIdentifier(String),
    Redefinition(String),
    NotAVariable(String),
    NotAFunction(String),
    DimensionNotPositive(String),
    UnspecifiedDimension(String),
    ArrayParamByValue(String),
    IndexNotInt,
    IndexedNonArray(DataType),
    TooManyIndices { have: usize, max: usize },
    AssignToStringLiteral,
    AssignToArray,
    AssignTypeMismatch(DataType, DataType),
    ArithmeticOnNonInt(DataType),
    CompareOperandMismatch(DataType, DataType),
    ReturnTypeMismatch(ScalarKind, DataType),
    ReturnMissingValue(ScalarKind),
    WrongArgCount { name: String, expected: usize, found: usize },
    RefArgNotLValue { name: String, index: usize },
    ArgTypeMismatch { name: String, index: usize, expected: DataType, found: DataType },
    HeaderMismatch { name: String, detail: String },
    DeclaredNotDefined(String),
    MainHasParams(String),
    MainBadReturnType(String, ScalarKind),
}

impl std::fmt::Display for SemanticError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use SemanticError::*;
        match self {
            UndefinedIdentifier(id) => write!(f, "undefined identifier {}", id),
            Redefinition(id) => write!(f, "{} is already defined in this scope", id),
            NotAVariable(id) => write!(f, "{} is not a variable or parameter", id),
            NotAFunction(id) => write!(f, "{} is not a function", id),
            DimensionNotPositive(id) => {
                write!(f, "array dimension of {} must be a positive integer", id)
            }
            UnspecifiedDimension(id) => write!(
                f,
                "only the leading dimension of an array parameter may be left unspecified ({})",
                id
            ),
            ArrayParamByValue(id) => {
                write!(f, "array parameter {} must be passed by reference", id)
            }
            IndexNotInt => f.write_str("array index must have type int"),
            IndexedNonArray(ty) => write!(f, "indexed access into non-array type {}", ty),
            TooManyIndices { have, max } => write!(
                f,
                "array access with {} indices but the array has {} dimensions",
                have, max
            ),
            AssignToStringLiteral => f.write_str("cannot assign to a string literal"),
            AssignToArray => f.write_str("cannot assign to a whole array"),
            AssignTypeMismatch(lhs, rhs) => {
                write!(f, "cannot assign {} to l-value of type {}", rhs, lhs)
            }
            ArithmeticOnNonInt(ty) => {
                write!(f, "arithmetic operand must have type int, found {}", ty)
            }
            CompareOperandMismatch(l, r) => write!(
                f,
                "comparison operands must share a scalar type, found {} and {}",
                l, r
            ),
            ReturnTypeMismatch(expected, found) => write!(
                f,
                "return type mismatch: function returns {} but expression has type {}",
                expected, found
            ),
            ReturnMissingValue(expected) => write!(
                f,
                "function returning {} must return a value",
                expected
            ),
            WrongArgCount {
                name,
                expected,
                found,
            } => write!(
                f,
                "call to {} passes {} arguments but {} are expected",
                name, found, expected
            ),
            RefArgNotLValue { name, index } => write!(
                f,
                "argument {} of call to {} is passed by reference and must be an l-value",
                index + 1,
                name
            ),
            ArgTypeMismatch {
                name,
                index,
                expected,
                found,
            } => write!(
                f,
                "argument {} of call to {} has type {} but {} is expected",
                index + 1,
                name,
                found,
                expected
            ),
            HeaderMismatch { name, detail } => {
                write!(f, "definition of {} does not match its declaration: {}", name, detail)
            }
            DeclaredNotDefined(id) => write!(f, "function {} declared but not defined", id),
            MainHasParams(id) => {
                write!(f, "top-level function {} must take no parameters", id)
            }
            MainBadReturnType(id, ret) => write!(
                f,
                "top-level function {} must return nothing, not {}",
                id, ret
            ),
        }
    }
}
