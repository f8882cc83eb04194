use crate::compiler::lexer::tokens::Lex;

/// Compiler errors that happen within the parser stage of compilation.
#[derive(Clone, Debug, PartialEq)]
pub enum ParserError {
    ExpectedButFound(Vec<Lex>, Option<Lex>),
    ExpectedIdentifier(Option<Lex>),
    ExpectedType(Option<Lex>),
    ExpectedIntLiteral(Option<Lex>),
    ExpectedStatement(Option<Lex>),
    ExpectedExpression(Option<Lex>),
    ExpectedCondition(Option<Lex>),
    ExpectedLValue(Option<Lex>),
    ExtraTokens(Lex),
}

fn found(lex: &Option<Lex>) -> String {
    match lex {
        Some(l) => format!("{}", l),
        None => "end of input".into(),
    }
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ParserError::*;
        match self {
            ExpectedButFound(expected, actual) => {
                let set: Vec<String> = expected.iter().map(|l| format!("{}", l)).collect();
                write!(f, "expected {}, but found {}", set.join(" or "), found(actual))
            }
            ExpectedIdentifier(l) => write!(f, "expected identifier, but found {}", found(l)),
            ExpectedType(l) => write!(f, "expected type, but found {}", found(l)),
            ExpectedIntLiteral(l) => {
                write!(f, "expected integer literal, but found {}", found(l))
            }
            ExpectedStatement(l) => write!(f, "expected statement, but found {}", found(l)),
            ExpectedExpression(l) => write!(f, "expected expression, but found {}", found(l)),
            ExpectedCondition(l) => write!(f, "expected condition, but found {}", found(l)),
            ExpectedLValue(l) => write!(f, "expected l-value, but found {}", found(l)),
            ExtraTokens(l) => write!(
                f,
                "unexpected {} after the top-level function definition",
                l
            ),
        }
    }
}
