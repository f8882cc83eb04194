use crate::compiler::ast::pretty::program_to_source;
use crate::compiler::ast::{
    BinaryOp, Dim, Expression, LValueKind, LocalDef, PassMode, Program, ScalarKind, Statement,
};
use crate::compiler::error::ErrorKind;
use crate::compiler::{parse_and_analyze, BuildMode};

fn ast(src: &str) -> Program {
    parse_and_analyze(src, BuildMode::AstOnly).unwrap()
}

fn main_body(src: &str) -> Vec<Statement> {
    ast(src).main.body.statements
}

#[test]
fn parse_minimal_program() {
    let p = ast("fun main() : nothing {}");
    assert_eq!(p.main.header.name, "main");
    assert!(p.main.header.params.is_empty());
    assert_eq!(p.main.header.ret, ScalarKind::Nothing);
    assert!(p.main.body.statements.is_empty());
}

#[test]
fn parse_parameter_groups() {
    let p = ast("fun f(a, b : int; ref s : char[]) : nothing {}");
    let params = &p.main.header.params;
    assert_eq!(params.len(), 3);
    assert_eq!(params[0].name, "a");
    assert_eq!(params[0].mode, PassMode::ByValue);
    assert_eq!(params[1].name, "b");
    assert_eq!(params[2].name, "s");
    assert_eq!(params[2].mode, PassMode::ByReference);
    assert_eq!(params[2].ty.dims(), &[Dim::Unspecified]);
}

#[test]
fn parse_locals_in_order() {
    let p = ast(
        "fun main() : nothing \
         var x : int; \
         fun f() : int; \
         fun f() : int { return 1; } \
         var y : char[4]; \
         {}",
    );
    assert!(matches!(&p.main.locals[0], LocalDef::Var(v) if v.name == "x"));
    assert!(matches!(&p.main.locals[1], LocalDef::Decl(h) if h.name == "f"));
    assert!(matches!(&p.main.locals[2], LocalDef::Func(d) if d.header.name == "f"));
    assert!(matches!(&p.main.locals[3], LocalDef::Var(v) if v.name == "y"));
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let stmts = main_body("fun main() : nothing { x <- 1 + 2 * 3; }");
    let value = match &stmts[0] {
        Statement::Assign { value, .. } => value,
        s => panic!("expected assignment, got {:?}", s),
    };
    match value {
        Expression::Binary {
            op: BinaryOp::Add,
            right,
            ..
        } => {
            assert!(matches!(
                right.as_ref(),
                Expression::Binary {
                    op: BinaryOp::Mul,
                    ..
                }
            ));
        }
        e => panic!("expected addition at the top, got {:?}", e),
    }
}

#[test]
fn dangling_else_binds_to_innermost_if() {
    let stmts = main_body("fun main() : nothing { if 1 = 1 then if 2 = 2 then ; else ; }");
    match &stmts[0] {
        Statement::If {
            then_stmt,
            else_stmt,
            ..
        } => {
            assert!(else_stmt.is_none(), "outer if must have no else");
            assert!(matches!(
                then_stmt.as_ref(),
                Statement::If {
                    else_stmt: Some(_),
                    ..
                }
            ));
        }
        s => panic!("expected if, got {:?}", s),
    }
}

#[test]
fn indexed_lvalue_collects_all_brackets() {
    let stmts = main_body("fun main() : nothing { a[1][2] <- 3; }");
    match &stmts[0] {
        Statement::Assign { target, .. } => match &target.kind {
            LValueKind::Index { base, indices } => {
                assert_eq!(indices.len(), 2);
                assert!(matches!(&base.kind, LValueKind::Ident(id) if id == "a"));
            }
            k => panic!("expected indexed l-value, got {:?}", k),
        },
        s => panic!("expected assignment, got {:?}", s),
    }
}

#[test]
fn string_literal_is_an_lvalue() {
    let stmts = main_body("fun main() : nothing { s <- \"ab\"[0]; }");
    match &stmts[0] {
        Statement::Assign { value, .. } => match value {
            Expression::LValue(lv) => {
                assert!(matches!(&lv.kind, LValueKind::Index { base, .. }
                    if matches!(&base.kind, LValueKind::StringLit(b) if b == b"ab")));
            }
            e => panic!("expected l-value expression, got {:?}", e),
        },
        s => panic!("expected assignment, got {:?}", s),
    }
}

#[test]
fn parenthesized_expression_on_comparison_lhs() {
    // `(` may open a condition or an expression; both must parse.
    main_body("fun main() : nothing { if (1 + 2) = 3 then ; }");
    main_body("fun main() : nothing { if (1 = 2) and (3 = 4) or not (5 = 6) then ; }");
    main_body("fun main() : nothing { while ((1) = (2)) do ; }");
}

#[test]
fn missing_semicolon_is_a_parser_error() {
    let err = parse_and_analyze("fun main() : nothing { return }", BuildMode::AstOnly)
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Parser(_)));
}

#[test]
fn trailing_tokens_are_a_parser_error() {
    let err =
        parse_and_analyze("fun main() : nothing {} extra", BuildMode::AstOnly).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Parser(_)));
}

#[test]
fn pretty_print_is_a_parse_fixed_point() {
    let src = "fun main() : nothing \
               var x, y : int; \
               var board : char[3][3]; \
               fun helper(n : int; ref s : char[]) : int; \
               fun helper(n : int; ref s : char[]) : int { \
                   if n <= 0 or n >= 10 then return 0; \
                   else return n + strlen(s); \
               } \
               { \
                   x <- 1; \
                   y <- (x + 2) * 3 - x div 2 mod 2; \
                   board[0][0] <- 'x'; \
                   while not (x = 10) and y # 0 do { x <- x + -1; } \
                   if x < y then writeString(\"less\\n\"); else writeChar('\\t'); \
                   helper(x, \"abc\"); \
                   return; \
               }";
    let printed = program_to_source(&ast(src));
    let reprinted = program_to_source(&ast(&printed));
    assert_eq!(printed, reprinted);
}
