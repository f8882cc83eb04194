pub mod cli;
pub mod compiler;

pub use compiler::error::CompileError;
pub use compiler::{parse_and_analyze, BuildMode};
