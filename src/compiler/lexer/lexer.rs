use crate::compiler::error::{CompileError, ErrorKind};
use crate::compiler::source::{Position, Span};

use super::tokens::{Lex, Primitive, Token};
use super::LexerError;

fn lex_err(start: Position, end: Position, kind: LexerError) -> CompileError {
    CompileError::new(Span::new(start, end), ErrorKind::Lexer(kind))
}

/// A speculative cursor over the lexer's character buffer.  Characters are
/// consumed on the branch and only committed back to the lexer with
/// `merge`; `cut` extracts the text consumed so far without committing.
struct LexerBranch<'a> {
    lexer: &'a mut Lexer,
    index: usize,
    line: u32,
    column: u32,
}

impl<'a> LexerBranch<'a> {
    fn from(l: &mut Lexer) -> LexerBranch {
        LexerBranch {
            index: l.index,
            line: l.line,
            column: l.column,
            lexer: l,
        }
    }

    fn merge(&mut self) -> String {
        let s = self.cut();

        self.lexer.index = self.index;
        self.lexer.line = self.line;
        self.lexer.column = self.column;

        s
    }

    fn cut(&self) -> String {
        self.lexer.chars[self.lexer.index..self.index]
            .iter()
            .collect()
    }

    fn next(&mut self) -> Option<char> {
        if self.index < self.lexer.chars.len() {
            let c = self.lexer.chars[self.index];
            self.index += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(c)
        } else {
            None
        }
    }

    fn next_if(&mut self, t: char) -> bool {
        match self.peek() {
            Some(c) if c == t => self.next().is_some(),
            _ => false,
        }
    }

    fn next_ifn(&mut self, t: &str) -> bool {
        if self.peek_ifn(t) {
            for _ in t.chars() {
                self.next();
            }
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.lexer.chars.get(self.index).copied()
    }

    fn peek_ifn(&self, t: &str) -> bool {
        let tc: Vec<char> = t.chars().collect();
        self.lexer.chars[self.index..].starts_with(&tc)
    }

    fn pos(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// Converts Grace source text into a token sequence, aborting at the first
/// lexing error.
pub struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    pub fn new(text: &str) -> Lexer {
        Lexer {
            chars: text.chars().collect(),
            index: 0,
            line: 1,
            column: 1,
        }
    }

    fn pos(&self) -> Position {
        Position::new(self.line, self.column)
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = vec![];

        loop {
            self.consume_insignificant()?;
            if self.index >= self.chars.len() {
                break;
            }
            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    /// Skip whitespace, `$` line comments, and `$$ … $$` block comments
    /// until significant input is reached.
    fn consume_insignificant(&mut self) -> Result<(), CompileError> {
        loop {
            let before = self.index;
            self.consume_whitespace();
            self.consume_block_comment()?;
            self.consume_line_comment();
            if self.index == before {
                return Ok(());
            }
        }
    }

    fn consume_whitespace(&mut self) {
        let mut branch = LexerBranch::from(self);
        while branch.peek().map_or(false, |c| c.is_whitespace()) {
            branch.next();
        }
        branch.merge();
    }

    fn consume_line_comment(&mut self) {
        let mut branch = LexerBranch::from(self);
        // A lone `$`; `$$` opens a block comment instead.
        if branch.peek_ifn("$$") || !branch.next_if('$') {
            return;
        }
        while let Some(c) = branch.next() {
            if c == '\n' {
                break;
            }
        }
        branch.merge();
    }

    fn consume_block_comment(&mut self) -> Result<(), CompileError> {
        let start = self.pos();
        let mut branch = LexerBranch::from(self);
        if branch.next_ifn("$$") {
            loop {
                if branch.next_ifn("$$") {
                    break;
                }
                if branch.next().is_none() {
                    return Err(lex_err(start, branch.pos(), LexerError::UnterminatedComment));
                }
            }
            branch.merge();
        }
        Ok(())
    }

    fn next_token(&mut self) -> Result<Token, CompileError> {
        let c = self.chars[self.index];
        if c.is_ascii_digit() {
            self.consume_integer()
        } else if c.is_alphabetic() || c == '_' {
            Ok(self.consume_identifier())
        } else if c == '\'' {
            self.consume_char_literal()
        } else if c == '"' {
            self.consume_string_literal()
        } else {
            self.consume_operator()
        }
    }

    fn consume_integer(&mut self) -> Result<Token, CompileError> {
        let start = self.pos();
        let mut branch = LexerBranch::from(self);
        while branch.peek().map_or(false, |c| c.is_ascii_digit()) {
            branch.next();
        }

        // A trailing identifier character means a malformed literal rather
        // than two adjacent tokens.
        if branch
            .peek()
            .map_or(false, |c| c.is_alphanumeric() || c == '_')
        {
            return Err(lex_err(start, branch.pos(), LexerError::InvalidInteger));
        }

        let end = branch.pos();
        let text = branch.merge();
        let value: i64 = text
            .parse()
            .map_err(|_| lex_err(start, end, LexerError::InvalidInteger))?;
        Ok(Token::new(Lex::IntLit(value), Span::new(start, end)))
    }

    fn consume_identifier(&mut self) -> Token {
        let start = self.pos();
        let mut branch = LexerBranch::from(self);
        while branch
            .peek()
            .map_or(false, |c| c.is_alphanumeric() || c == '_')
        {
            branch.next();
        }
        let end = branch.pos();
        let id = branch.merge();
        Token::new(Self::keyword_map(id), Span::new(start, end))
    }

    fn keyword_map(id: String) -> Lex {
        match id.as_str() {
            "and" => Lex::And,
            "or" => Lex::Or,
            "not" => Lex::Not,
            "div" => Lex::Div,
            "mod" => Lex::Mod,
            "var" => Lex::Var,
            "fun" => Lex::Fun,
            "ref" => Lex::Ref,
            "return" => Lex::Return,
            "if" => Lex::If,
            "then" => Lex::Then,
            "else" => Lex::Else,
            "while" => Lex::While,
            "do" => Lex::Do,
            "int" => Lex::Primitive(Primitive::Int),
            "char" => Lex::Primitive(Primitive::Char),
            "nothing" => Lex::Primitive(Primitive::Nothing),
            _ => Lex::Identifier(id),
        }
    }

    fn consume_char_literal(&mut self) -> Result<Token, CompileError> {
        let start = self.pos();
        let mut branch = LexerBranch::from(self);
        branch.next(); // opening quote

        let value = match branch.next() {
            Some('\\') => {
                let end = branch.pos();
                Self::decode_escape(&mut branch).map_err(|kind| lex_err(start, end, kind))?
            }
            Some(c) if c != '\'' && c.is_ascii() && !c.is_ascii_control() => c as u8,
            _ => return Err(lex_err(start, branch.pos(), LexerError::ImproperCharLiteral)),
        };

        if !branch.next_if('\'') {
            return Err(lex_err(start, branch.pos(), LexerError::ImproperCharLiteral));
        }
        let end = branch.pos();
        branch.merge();
        Ok(Token::new(Lex::CharLit(value), Span::new(start, end)))
    }

    fn consume_string_literal(&mut self) -> Result<Token, CompileError> {
        let start = self.pos();
        let mut branch = LexerBranch::from(self);
        branch.next(); // opening quote

        let mut bytes = vec![];
        loop {
            match branch.next() {
                Some('"') => break,
                Some('\n') | None => {
                    return Err(lex_err(start, branch.pos(), LexerError::UnterminatedString))
                }
                Some('\\') => {
                    let end = branch.pos();
                    bytes.push(
                        Self::decode_escape(&mut branch).map_err(|kind| lex_err(start, end, kind))?,
                    )
                }
                Some(c) if c.is_ascii() => bytes.push(c as u8),
                Some(c) => return Err(lex_err(start, branch.pos(), LexerError::BadCharacter(c))),
            }
        }
        let end = branch.pos();
        branch.merge();
        Ok(Token::new(Lex::StringLit(bytes), Span::new(start, end)))
    }

    /// Decode the character after a consumed backslash.
    fn decode_escape(branch: &mut LexerBranch) -> Result<u8, LexerError> {
        match branch.next() {
            Some('n') => Ok(b'\n'),
            Some('t') => Ok(b'\t'),
            Some('r') => Ok(b'\r'),
            Some('0') => Ok(0),
            Some('\\') => Ok(b'\\'),
            Some('\'') => Ok(b'\''),
            Some('"') => Ok(b'"'),
            Some('x') => {
                let hi = branch.next().and_then(|c| c.to_digit(16));
                let lo = branch.next().and_then(|c| c.to_digit(16));
                match (hi, lo) {
                    (Some(hi), Some(lo)) => Ok((hi * 16 + lo) as u8),
                    _ => Err(LexerError::InvalidEscape('x')),
                }
            }
            Some(c) => Err(LexerError::InvalidEscape(c)),
            None => Err(LexerError::ExpectedEscapeCharacter),
        }
    }

    fn consume_operator(&mut self) -> Result<Token, CompileError> {
        let start = self.pos();
        let mut branch = LexerBranch::from(self);
        let operators = [
            ("<-", Lex::Assign),
            ("<=", Lex::LsEq),
            (">=", Lex::GrEq),
            ("=", Lex::Eq),
            ("#", Lex::NEq),
            ("<", Lex::Ls),
            (">", Lex::Gr),
            ("+", Lex::Add),
            ("-", Lex::Minus),
            ("*", Lex::Mul),
            ("(", Lex::LParen),
            (")", Lex::RParen),
            ("[", Lex::LBracket),
            ("]", Lex::RBracket),
            ("{", Lex::LBrace),
            ("}", Lex::RBrace),
            (",", Lex::Comma),
            (":", Lex::Colon),
            (";", Lex::Semicolon),
        ];

        for (op, sym) in operators.iter() {
            if branch.next_ifn(op) {
                let end = branch.pos();
                branch.merge();
                return Ok(Token::new(sym.clone(), Span::new(start, end)));
            }
        }

        let c = branch.peek().unwrap_or('\0');
        Err(lex_err(start, branch.pos(), LexerError::BadCharacter(c)))
    }
}
