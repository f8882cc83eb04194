use crate::compiler::ast::{
    DataType, Dim, LocalDef, PassMode, Program, ScalarKind, Statement,
};
use crate::compiler::error::ErrorKind;
use crate::compiler::{parse_and_analyze, BuildMode};

use super::error::SemanticError;
use super::symbol_table::{Entry, SymbolTable, SymbolTableError};

fn ok(src: &str) -> Program {
    parse_and_analyze(src, BuildMode::Full).unwrap()
}

fn sem_err(src: &str) -> SemanticError {
    match parse_and_analyze(src, BuildMode::Full).unwrap_err().kind {
        ErrorKind::Semantic(e) => e,
        k => panic!("expected semantic error, got {:?}", k),
    }
}

fn nested<'a>(p: &'a Program, path: &[usize]) -> &'a crate::compiler::ast::FunctionDef {
    let mut f = &p.main;
    for i in path {
        f = match &f.locals[*i] {
            LocalDef::Func(def) => def,
            l => panic!("expected nested function at {}, got {:?}", i, l),
        };
    }
    f
}

#[test]
fn runtime_calls_resolve() {
    let p = ok("fun main() : nothing { writeInteger(1 + 2); }");
    match &p.main.body.statements[0] {
        Statement::Call(call) => {
            let info = call.resolved.as_ref().unwrap();
            assert!(info.runtime);
            assert_eq!(info.ret, ScalarKind::Nothing);
            assert_eq!(info.args.len(), 1);
            assert_eq!(info.args[0].mode, PassMode::ByValue);
        }
        s => panic!("expected call, got {:?}", s),
    }
}

#[test]
fn frame_offsets_follow_declaration_order() {
    let p = ok(
        "fun main() : nothing \
         var a : int; \
         fun g(x : int; ref y : int) : nothing var v : int; {} \
         var b : char; \
         { g(a, a); }",
    );
    // Program-function frame has no static link: locals start at 0.
    assert!(matches!(&p.main.locals[0], LocalDef::Var(v) if v.offset == Some(0)));
    assert!(matches!(&p.main.locals[2], LocalDef::Var(v) if v.offset == Some(1)));

    // Nested frames reserve slot 0 for the static link.
    let g = nested(&p, &[1]);
    assert_eq!(g.header.params[0].offset, Some(1));
    assert_eq!(g.header.params[1].offset, Some(2));
    assert!(matches!(&g.locals[0], LocalDef::Var(v) if v.offset == Some(3)));
    assert_eq!(g.parent_path.as_deref(), Some(&["main".to_string()][..]));
}

#[test]
fn non_local_access_counts_static_link_hops() {
    let p = ok(
        "fun f() : nothing \
         var c : char; \
         fun g() : nothing \
         fun h() : nothing { c <- 'a'; } \
         { h(); } \
         { g(); }",
    );
    let h = nested(&p, &[1, 0]);
    match &h.body.statements[0] {
        Statement::Assign { target, .. } => {
            let st = target.storage.as_ref().unwrap();
            assert_eq!(st.hops, 2);
            assert_eq!(st.offset, 0);
            assert!(!st.indirect);
        }
        s => panic!("expected assignment, got {:?}", s),
    }
}

#[test]
fn call_annotations_carry_both_paths() {
    let p = ok(
        "fun main() : nothing \
         fun helper() : nothing {} \
         fun outer() : nothing \
         fun inner() : nothing { inner(); outer(); helper(); } \
         { inner(); } \
         { outer(); }",
    );
    let inner = nested(&p, &[1, 0]);
    let hops: Vec<usize> = inner
        .body
        .statements
        .iter()
        .map(|s| match s {
            Statement::Call(c) => c.resolved.as_ref().unwrap().link_hops(),
            s => panic!("expected call, got {:?}", s),
        })
        .collect();
    // inner -> itself: 1 hop; inner -> outer, helper (children of main): 2.
    assert_eq!(hops, vec![1, 2, 2]);

    match &p.main.body.statements[0] {
        Statement::Call(c) => assert_eq!(c.resolved.as_ref().unwrap().link_hops(), 0),
        s => panic!("expected call, got {:?}", s),
    }
}

#[test]
fn shadowed_nested_functions_get_distinct_paths() {
    let p = ok("fun f() : nothing fun f() : nothing fun f() : nothing {} {} {}");
    let second = nested(&p, &[0]);
    let third = nested(&p, &[0, 0]);
    assert_eq!(p.main.qualified_name(), "f");
    assert_eq!(second.qualified_name(), "f.f");
    assert_eq!(third.qualified_name(), "f.f.f");
}

#[test]
fn unspecified_leading_dimension_accepts_matching_trailing_dims() {
    ok(
        "fun main() : nothing \
         var b : char[3][4]; \
         fun f(ref s : char[][4]) : nothing {} \
         { f(b); }",
    );
    ok(
        "fun main() : nothing \
         var s : char[10]; \
         { writeString(s); }",
    );
}

#[test]
fn unspecified_leading_dimension_rejects_mismatched_trailing_dims() {
    let e = sem_err(
        "fun main() : nothing \
         var b : char[3][4]; \
         fun f(ref s : char[][5]) : nothing {} \
         { f(b); }",
    );
    assert!(matches!(e, SemanticError::ArgTypeMismatch { .. }));
}

#[test]
fn fixed_dimensions_must_match_exactly() {
    let e = sem_err(
        "fun main() : nothing \
         var b : char[3] ; \
         fun f(ref s : char[4]) : nothing {} \
         { f(b); }",
    );
    assert!(matches!(e, SemanticError::ArgTypeMismatch { .. }));
}

#[test]
fn reference_argument_must_be_lvalue() {
    let e = sem_err(
        "fun main() : nothing \
         fun f(ref x : int) : nothing {} \
         { f(1 + 2); }",
    );
    assert!(matches!(e, SemanticError::RefArgNotLValue { .. }));
}

#[test]
fn assignment_restrictions() {
    assert!(matches!(
        sem_err("fun main() : nothing { \"abc\" <- 'x'; }"),
        SemanticError::AssignToStringLiteral
    ));
    assert!(matches!(
        sem_err("fun main() : nothing { \"abc\"[0] <- 'x'; }"),
        SemanticError::AssignToStringLiteral
    ));
    assert!(matches!(
        sem_err("fun main() : nothing var a : int[3]; var b : int[3]; { a <- b; }"),
        SemanticError::AssignToArray
    ));
    assert!(matches!(
        sem_err("fun main() : nothing var x : int; { x <- 'a'; }"),
        SemanticError::AssignTypeMismatch(..)
    ));
}

#[test]
fn arrays_cannot_be_passed_by_value() {
    let e = sem_err("fun main() : nothing fun f(a : int[3]) : nothing {} {}");
    assert!(matches!(e, SemanticError::ArrayParamByValue(_)));
}

#[test]
fn variable_dimensions_must_be_positive_and_specified() {
    assert!(matches!(
        sem_err("fun main() : nothing var a : int[0]; {}"),
        SemanticError::DimensionNotPositive(_)
    ));
    assert!(matches!(
        sem_err("fun main() : nothing fun f(ref a : int[3][]) : nothing {} {}"),
        SemanticError::UnspecifiedDimension(_)
    ));
}

#[test]
fn declaration_definition_header_mismatch() {
    // Differing return types between declaration and definition.
    let e = sem_err(
        "fun main() : nothing \
         fun f() : int; \
         fun f() : char { return 'a'; } \
         {}",
    );
    match e {
        SemanticError::HeaderMismatch { name, detail } => {
            assert_eq!(name, "f");
            assert!(detail.contains("return type"));
        }
        e => panic!("expected header mismatch, got {:?}", e),
    }

    let e = sem_err(
        "fun main() : nothing \
         fun f(x : int) : nothing; \
         fun f(ref x : int) : nothing {} \
         {}",
    );
    assert!(matches!(e, SemanticError::HeaderMismatch { .. }));
}

#[test]
fn declared_but_not_defined_fails_at_scope_close() {
    let e = sem_err("fun main() : nothing fun f() : int; {}");
    assert!(matches!(e, SemanticError::DeclaredNotDefined(name) if name == "f"));
}

#[test]
fn redefinition_in_same_scope_is_rejected() {
    let e = sem_err(
        "fun main() : nothing \
         fun f() : nothing {} \
         fun f() : nothing {} \
         {}",
    );
    assert!(matches!(e, SemanticError::Redefinition(name) if name == "f"));

    let e = sem_err("fun main() : nothing var x : int; var x : char; {}");
    assert!(matches!(e, SemanticError::Redefinition(name) if name == "x"));
}

#[test]
fn name_resolution_errors() {
    assert!(matches!(
        sem_err("fun main() : nothing { x <- 1; }"),
        SemanticError::UndefinedIdentifier(name) if name == "x"
    ));
    assert!(matches!(
        sem_err("fun main() : nothing var x : int; { x(); }"),
        SemanticError::NotAFunction(name) if name == "x"
    ));
    assert!(matches!(
        sem_err("fun main() : nothing fun f() : nothing {} { f <- 1; }"),
        SemanticError::NotAVariable(name) if name == "f"
    ));
}

#[test]
fn condition_and_arithmetic_typing() {
    assert!(matches!(
        sem_err("fun main() : nothing var x : int; { if x = 'a' then ; }"),
        SemanticError::CompareOperandMismatch(..)
    ));
    assert!(matches!(
        sem_err("fun main() : nothing var c : char; { writeInteger(c + 1); }"),
        SemanticError::ArithmeticOnNonInt(_)
    ));
    // char with char comparison is fine
    ok("fun main() : nothing var c : char; { if c = 'a' then ; }");
}

#[test]
fn array_index_typing() {
    assert!(matches!(
        sem_err("fun main() : nothing var a : int[3]; { a['c'] <- 1; }"),
        SemanticError::IndexNotInt
    ));
    assert!(matches!(
        sem_err("fun main() : nothing var a : int[3]; { a[0][0] <- 1; }"),
        SemanticError::TooManyIndices { .. }
    ));
    assert!(matches!(
        sem_err("fun main() : nothing var x : int; { x[0] <- 1; }"),
        SemanticError::IndexedNonArray(_)
    ));
}

#[test]
fn return_discipline() {
    assert!(matches!(
        sem_err("fun main() : nothing fun f() : int { return; } {}"),
        SemanticError::ReturnMissingValue(ScalarKind::Int)
    ));
    assert!(matches!(
        sem_err("fun main() : nothing fun f() : int { return 'a'; } {}"),
        SemanticError::ReturnTypeMismatch(ScalarKind::Int, _)
    ));
    assert!(matches!(
        sem_err("fun main() : nothing { return 1; }"),
        SemanticError::ReturnTypeMismatch(ScalarKind::Nothing, _)
    ));
    // A nothing-returning call is a legal bare-return payload.
    ok("fun main() : nothing fun p() : nothing {} { return p(); }");
}

#[test]
fn wrong_argument_count() {
    let e = sem_err("fun main() : nothing { writeInteger(1, 2); }");
    assert!(matches!(
        e,
        SemanticError::WrongArgCount {
            expected: 1,
            found: 2,
            ..
        }
    ));
}

#[test]
fn main_constraints() {
    assert!(matches!(
        sem_err("fun main(a : int) : nothing {}"),
        SemanticError::MainHasParams(_)
    ));
    assert!(matches!(
        sem_err("fun main() : int { return 1; }"),
        SemanticError::MainBadReturnType(..)
    ));
}

#[test]
fn runtime_names_cannot_be_redefined_at_top_level() {
    let e = sem_err("fun writeInteger() : nothing {}");
    assert!(matches!(e, SemanticError::Redefinition(name) if name == "writeInteger"));
}

#[test]
fn nested_functions_may_shadow_runtime_names() {
    ok(
        "fun main() : nothing \
         fun writeInteger(n : int) : nothing {} \
         { writeInteger(1); }",
    );
}

#[test]
fn dangling_else_program_analyzes() {
    // Seed scenario: reference parameter, while, dangling else.
    ok(
        "fun f() : nothing \
         var i : int; \
         fun input(ref i : int) : nothing { i <- readInteger(); } \
         { \
             input(i); \
             while i # 0 do { \
                 if i < 5 then writeString(\"Less\"); \
                 else if i # 5 then writeString(\"More\"); \
                 else writeString(\"Equal\"); \
                 writeChar('\\n'); \
                 input(i); \
             } \
         }",
    );
}

#[test]
fn symbol_table_scope_discipline() {
    use crate::compiler::source::{Position, Span};
    let span = Span::new(Position::new(1, 1), Position::new(1, 2));

    let mut t = SymbolTable::new();
    assert!(t.lookup_all("writeInteger").is_some());
    assert!(t.lookup("nonsense").is_none());

    t.open_scope("main", ScalarKind::Nothing);
    let off = t.insert_var(span, "x", DataType::Scalar(ScalarKind::Int)).unwrap();
    assert_eq!(off, 0);

    t.open_scope("g", ScalarKind::Int);
    let off = t
        .insert_param(span, "p", DataType::Scalar(ScalarKind::Int), PassMode::ByValue)
        .unwrap();
    assert_eq!(off, 1); // slot 0 is the static link

    // `x` resolves through the chain; `p` only in the inner scope.
    assert!(matches!(t.lookup_all("x"), Some(Entry::Variable(_))));
    assert!(t.lookup("x").is_none());
    assert_eq!(t.depth(), 2);
    assert_eq!(t.path(), &["main".to_string(), "g".to_string()][..]);

    t.close_scope(span).unwrap();
    assert!(t.lookup_all("p").is_none());
    t.close_scope(span).unwrap();

    // Closing past the global scope is a symbol-table error.
    let err = t.close_scope(span).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::SymbolTable(SymbolTableError::CloseOnEmpty)
    ));
}

#[test]
fn finalize_flags_lingering_entries() {
    use crate::compiler::source::{Position, Span};
    let span = Span::new(Position::new(1, 1), Position::new(1, 2));

    let mut t = SymbolTable::new();
    t.insert_function(span, "f", vec![], ScalarKind::Int, super::symbol_table::DefStatus::Declared)
        .unwrap();
    let err = t.finalize(span).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::SymbolTable(SymbolTableError::LingeringEntries(names)) if names.contains('f')
    ));
}

#[test]
fn array_dims_display_in_errors() {
    // Exercise the Dim formatting path through a mismatch message.
    let e = sem_err(
        "fun main() : nothing \
         var b : int[2][2]; \
         fun f(ref s : int[][3]) : nothing {} \
         { f(b); }",
    );
    match e {
        SemanticError::ArgTypeMismatch { expected, found, .. } => {
            assert_eq!(format!("{}", expected), "int[][3]");
            assert_eq!(format!("{}", found), "int[2][2]");
            assert_eq!(expected.dims()[0], Dim::Unspecified);
        }
        e => panic!("expected arg type mismatch, got {:?}", e),
    }
}
