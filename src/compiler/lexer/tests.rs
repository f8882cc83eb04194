use super::lexer::Lexer;
use super::tokens::{Lex, Primitive};
use super::LexerError;
use crate::compiler::error::ErrorKind;

fn lex(text: &str) -> Vec<Lex> {
    Lexer::new(text)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.sym)
        .collect()
}

fn lex_err(text: &str) -> LexerError {
    match Lexer::new(text).tokenize().unwrap_err().kind {
        ErrorKind::Lexer(e) => e,
        k => panic!("expected lexer error, got {:?}", k),
    }
}

#[test]
fn tokenize_operators() {
    assert_eq!(
        lex("= # < > <= >= + - * <-"),
        vec![
            Lex::Eq,
            Lex::NEq,
            Lex::Ls,
            Lex::Gr,
            Lex::LsEq,
            Lex::GrEq,
            Lex::Add,
            Lex::Minus,
            Lex::Mul,
            Lex::Assign,
        ]
    );
}

#[test]
fn tokenize_structural() {
    assert_eq!(
        lex("( ) [ ] { } , : ;"),
        vec![
            Lex::LParen,
            Lex::RParen,
            Lex::LBracket,
            Lex::RBracket,
            Lex::LBrace,
            Lex::RBrace,
            Lex::Comma,
            Lex::Colon,
            Lex::Semicolon,
        ]
    );
}

#[test]
fn tokenize_keywords_and_identifiers() {
    assert_eq!(
        lex("fun f1(): nothing"),
        vec![
            Lex::Fun,
            Lex::Identifier("f1".into()),
            Lex::LParen,
            Lex::RParen,
            Lex::Colon,
            Lex::Primitive(Primitive::Nothing),
        ]
    );
    assert_eq!(lex("refx"), vec![Lex::Identifier("refx".into())]);
    assert_eq!(lex("_x9"), vec![Lex::Identifier("_x9".into())]);
}

#[test]
fn tokenize_integer_literals() {
    assert_eq!(lex("0 42 1234567"), vec![
        Lex::IntLit(0),
        Lex::IntLit(42),
        Lex::IntLit(1234567),
    ]);
    assert_eq!(lex_err("12ab"), LexerError::InvalidInteger);
}

#[test]
fn tokenize_char_literals() {
    assert_eq!(lex("'a'"), vec![Lex::CharLit(b'a')]);
    assert_eq!(lex("'\\n'"), vec![Lex::CharLit(b'\n')]);
    assert_eq!(lex("'\\0'"), vec![Lex::CharLit(0)]);
    assert_eq!(lex("'\\x41'"), vec![Lex::CharLit(0x41)]);
    assert_eq!(lex_err("'ab'"), LexerError::ImproperCharLiteral);
    assert_eq!(lex_err("''"), LexerError::ImproperCharLiteral);
    assert_eq!(lex_err("'\\q'"), LexerError::InvalidEscape('q'));
}

#[test]
fn tokenize_string_literals() {
    assert_eq!(
        lex("\"hello\""),
        vec![Lex::StringLit(b"hello".to_vec())]
    );
    assert_eq!(
        lex("\"a\\tb\\x00c\""),
        vec![Lex::StringLit(vec![b'a', b'\t', b'b', 0, b'c'])]
    );
    assert_eq!(lex_err("\"open"), LexerError::UnterminatedString);
    assert_eq!(lex_err("\"line\nbreak\""), LexerError::UnterminatedString);
}

#[test]
fn line_comments_are_skipped() {
    assert_eq!(
        lex("x $ this is ignored\ny"),
        vec![Lex::Identifier("x".into()), Lex::Identifier("y".into())]
    );
}

#[test]
fn block_comments_are_skipped_and_do_not_nest() {
    assert_eq!(
        lex("a $$ comment $$ b"),
        vec![Lex::Identifier("a".into()), Lex::Identifier("b".into())]
    );
    // The first closer ends the comment even after a second opener.
    assert_eq!(
        lex("a $$ x $$ $$ y $$ b"),
        vec![Lex::Identifier("a".into()), Lex::Identifier("b".into())]
    );
    assert_eq!(lex_err("a $$ open"), LexerError::UnterminatedComment);
}

#[test]
fn bad_character_is_an_error() {
    assert_eq!(lex_err("x @ y"), LexerError::BadCharacter('@'));
}

#[test]
fn spans_track_lines_and_columns() {
    let tokens = Lexer::new("x\n  y").tokenize().unwrap();
    assert_eq!(tokens[0].span.start.line, 1);
    assert_eq!(tokens[0].span.start.column, 1);
    assert_eq!(tokens[1].span.start.line, 2);
    assert_eq!(tokens[1].span.start.column, 3);
}
