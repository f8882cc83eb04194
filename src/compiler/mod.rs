pub mod ast;
pub mod error;
pub mod lexer;
pub mod llvm;
pub mod parser;
pub mod runtime;
pub mod semantics;
pub mod source;

pub use error::CompileError;
pub use lexer::Lexer;
pub use semantics::{AstBuilder, BuildMode};

use parser::tokenstream::TokenStream;
use parser::Parser;

/// Front half of the pipeline: source text to a fully annotated AST.
/// Semantic analysis runs during the parse through the wrapper layer, so a
/// returned `Program` has passed every semantic and symbol-table check.
pub fn parse_and_analyze(text: &str, mode: BuildMode) -> Result<ast::Program, CompileError> {
    let tokens = Lexer::new(text).tokenize()?;
    let mut builder = AstBuilder::new(mode);
    let mut stream = TokenStream::new(&tokens);
    let mut parser = Parser::new(&mut builder);
    parser.program(&mut stream)
}
