/*!
The typed tree the parser produces and the semantic analyzer annotates.

Annotation fields start out as `None` and are written exactly once during
semantic analysis; code generation treats them as read-only.
*/
mod expression;
mod function;
mod statement;
mod ty;

pub mod pretty;

pub use expression::{
    ArgPass, BinaryOp, CallInfo, CompareOp, Condition, Expression, FunctionCall, LValue,
    LValueKind, LogicOp, StorageRef, UnaryOp,
};
pub use function::{FuncHeader, FunctionDef, LocalDef, Parameter, Program, VarDef};
pub use statement::{Block, Statement};
pub use ty::{DataType, Dim, PassMode, ScalarKind};
