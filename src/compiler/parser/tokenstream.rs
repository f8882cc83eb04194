use crate::compiler::error::{CompileError, ErrorKind};
use crate::compiler::lexer::tokens::{Lex, Token};
use crate::compiler::source::{Position, Span};

use super::error::ParserError;

/// A cursor over the lexer's token sequence.  The index can be saved and
/// restored, which the parser uses to disambiguate parenthesized
/// conditions from parenthesized expressions.
pub struct TokenStream<'a> {
    tokens: &'a [Token],
    index: usize,
}

impl<'a> TokenStream<'a> {
    pub fn new(tokens: &'a [Token]) -> TokenStream<'a> {
        TokenStream { tokens, index: 0 }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    pub fn peek_at(&self, i: usize) -> Option<&Token> {
        self.tokens.get(self.index + i)
    }

    pub fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.index).cloned();
        if t.is_some() {
            self.index += 1;
        }
        t
    }

    /// Consume and return the next token if it matches `test` exactly.
    pub fn next_if(&mut self, test: &Lex) -> Option<Token> {
        match self.peek() {
            Some(t) if t.sym == *test => self.next(),
            _ => None,
        }
    }

    pub fn test_if(&self, test: &Lex) -> bool {
        matches!(self.peek(), Some(t) if t.sym == *test)
    }

    /// The span errors should point at when the stream is exhausted.
    pub fn eof_span(&self) -> Span {
        match self.tokens.last() {
            Some(t) => t.span,
            None => Span::new(Position::new(1, 1), Position::new(1, 1)),
        }
    }

    fn error_at(&self, e: ParserError) -> CompileError {
        let span = self.peek().map(|t| t.span).unwrap_or_else(|| self.eof_span());
        CompileError::new(span, ErrorKind::Parser(e))
    }

    pub fn found(&self) -> Option<Lex> {
        self.peek().map(|t| t.sym.clone())
    }

    pub fn expect(&mut self, expected: &Lex) -> Result<Token, CompileError> {
        match self.next_if(expected) {
            Some(t) => Ok(t),
            None => Err(self.error_at(ParserError::ExpectedButFound(
                vec![expected.clone()],
                self.found(),
            ))),
        }
    }

    pub fn expect_identifier(&mut self) -> Result<(String, Span), CompileError> {
        match self.peek() {
            Some(Token {
                sym: Lex::Identifier(_),
                ..
            }) => {
                let t = self.next().expect("peeked token must exist");
                match t.sym {
                    Lex::Identifier(id) => Ok((id, t.span)),
                    _ => unreachable!(),
                }
            }
            _ => Err(self.error_at(ParserError::ExpectedIdentifier(self.found()))),
        }
    }

    pub fn expect_int_literal(&mut self) -> Result<(i64, Span), CompileError> {
        match self.peek() {
            Some(Token {
                sym: Lex::IntLit(_),
                ..
            }) => {
                let t = self.next().expect("peeked token must exist");
                match t.sym {
                    Lex::IntLit(v) => Ok((v, t.span)),
                    _ => unreachable!(),
                }
            }
            _ => Err(self.error_at(ParserError::ExpectedIntLiteral(self.found()))),
        }
    }

    pub fn parser_err(&self, e: ParserError) -> CompileError {
        self.error_at(e)
    }
}
