/*!
Lower the annotated AST into an LLVM module.

Nested functions become flat functions communicating through explicit
frame records: each source function gets a named record type holding its
static link (when nested), its parameters, and its locals, and every
non-local access walks the static-link chain.
*/
pub mod irgen;
pub mod stringpool;

#[cfg(test)]
mod tests;

pub use irgen::IrGen;

/// Errors raised while lowering a checked AST.
#[derive(Debug, Clone, PartialEq)]
pub enum CodegenError {
    MissingReturn(String),
}

impl std::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodegenError::MissingReturn(name) => write!(
                f,
                "non-nothing function {} does not return a value",
                name
            ),
        }
    }
}
