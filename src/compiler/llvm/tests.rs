use inkwell::context::Context;

use crate::compiler::error::ErrorKind;
use crate::compiler::{parse_and_analyze, BuildMode};

use super::{CodegenError, IrGen};

fn lower(src: &str) -> (String, Vec<String>) {
    let program = parse_and_analyze(src, BuildMode::Full).unwrap();
    let context = Context::create();
    let mut llvm = IrGen::new(&context, "test").unwrap();
    llvm.ingest(&program).unwrap();
    llvm.verify().unwrap();
    let mut buf = vec![];
    llvm.write_ir(&mut buf).unwrap();
    let warnings = llvm.warnings().iter().map(|w| w.message.clone()).collect();
    (String::from_utf8(buf).unwrap(), warnings)
}

fn lower_err(src: &str) -> CodegenError {
    let program = parse_and_analyze(src, BuildMode::Full).unwrap();
    let context = Context::create();
    let mut llvm = IrGen::new(&context, "test").unwrap();
    match llvm.ingest(&program).unwrap_err().kind {
        ErrorKind::Codegen(e) => e,
        k => panic!("expected codegen error, got {:?}", k),
    }
}

#[test]
fn minimal_program_lowers_to_entry_main() {
    let (ir, _) = lower("fun main() : nothing { writeInteger(1 + 2); }");
    assert!(ir.contains("define i32 @main()"));
    assert!(ir.contains("declare void @writeInteger(i64)"));
    assert!(ir.contains("ret i32 0"));
}

#[test]
fn frame_records_hold_link_params_and_locals() {
    let (ir, _) = lower(
        "fun main() : nothing \
         var a : int; \
         fun g(x : int; ref y : int) : int var v : char; { return x; } \
         { a <- g(1, a); }",
    );
    // main's frame: no static link, one local.
    assert!(ir.contains("%frame.main = type { i64 }"));
    // g's frame: static link, by-value int, by-reference int, local char.
    assert!(ir.contains("%frame.main.g = type { %frame.main*, i64, i64*, i8 }"));
    assert!(ir.contains("define i64 @main.g(%frame.main* %0, i64 %1, i64* %2)"));
}

#[test]
fn pass_by_reference_through_three_nesting_levels() {
    // Each level forwards the outer variable by reference and adds one.
    let (ir, _) = lower(
        "fun main() : nothing \
         var x : int; \
         fun f1(ref a : int) : nothing \
         fun f2(ref b : int) : nothing \
         fun f3(ref c : int) : nothing { c <- c + 1; } \
         { f3(b); b <- b + 1; } \
         { f2(a); a <- a + 1; } \
         { x <- 0; f1(x); writeInteger(x); }",
    );
    assert!(ir.contains("define void @main.f1"));
    assert!(ir.contains("define void @main.f1.f2"));
    assert!(ir.contains("define void @main.f1.f2.f3"));
}

#[test]
fn two_hop_access_into_outer_frame() {
    let (ir, _) = lower(
        "fun f() : nothing \
         var c : char; \
         fun g() : nothing \
         fun h() : nothing { c <- 'a'; } \
         { h(); } \
         { g(); }",
    );
    // h reaches f's frame by loading two static links.
    assert!(ir.contains("%frame.f.g.h = type { %frame.f.g* }"));
    assert!(ir.contains("define void @f.g.h(%frame.f.g* %0)"));
}

#[test]
fn shadowed_nested_functions_lower_to_distinct_symbols() {
    let (ir, _) = lower("fun f() : nothing fun f() : nothing fun f() : nothing {} {} {}");
    assert!(ir.contains("define i32 @main()"));
    assert!(ir.contains("define void @f.f("));
    assert!(ir.contains("define void @f.f.f("));
}

#[test]
fn both_arms_returning_produces_a_valid_module() {
    let (ir, warnings) = lower(
        "fun main() : nothing \
         fun f() : int { if 1 = 1 then return 1; else return 2; } \
         { writeInteger(f()); }",
    );
    assert!(ir.contains("define i64 @main.f"));
    assert!(warnings.is_empty());
}

#[test]
fn dead_code_does_not_change_the_module() {
    let live = "fun main() : nothing \
                fun f() : int { if 1 = 1 then return 1; else return 2; } \
                { writeInteger(f()); }";
    let dead = "fun main() : nothing \
                fun f() : int { if 1 = 1 then return 1; else return 2; writeInteger(9); } \
                { writeInteger(f()); }";
    let (ir_live, w_live) = lower(live);
    let (ir_dead, w_dead) = lower(dead);
    assert_eq!(ir_live, ir_dead);
    assert!(w_live.is_empty());
    assert_eq!(w_dead, vec!["unreachable code".to_string()]);
}

#[test]
fn unreachable_code_warns_exactly_once() {
    let (_, warnings) = lower(
        "fun main() : nothing { return; writeInteger(1); writeInteger(2); }",
    );
    assert_eq!(warnings, vec!["unreachable code".to_string()]);
}

#[test]
fn missing_return_is_a_codegen_error() {
    let e = lower_err("fun main() : nothing fun f() : int { writeInteger(1); } {}");
    assert_eq!(e, CodegenError::MissingReturn("f".into()));
}

#[test]
fn missing_return_on_one_path_is_a_codegen_error() {
    let e = lower_err(
        "fun main() : nothing \
         fun f() : int { if 1 = 1 then return 1; } \
         {}",
    );
    assert_eq!(e, CodegenError::MissingReturn("f".into()));
}

#[test]
fn string_literals_become_pooled_globals() {
    let (ir, _) = lower(
        "fun main() : nothing { writeString(\"hi\\n\"); writeString(\"hi\\n\"); writeString(\"yo\"); }",
    );
    assert!(ir.contains("@str.0"));
    assert!(ir.contains("@str.1"));
    assert!(!ir.contains("@str.2"));
}

#[test]
fn short_circuit_connectives_use_phis() {
    let (ir, _) = lower(
        "fun main() : nothing \
         var x : int; \
         { x <- 0; if x = 0 and not (x = 1) or x = 2 then writeInteger(x); }",
    );
    assert!(ir.contains("phi i1"));
}

#[test]
fn while_loop_shape() {
    let (ir, _) = lower(
        "fun main() : nothing \
         var i : int; \
         { i <- 0; while i < 10 do i <- i + 1; }",
    );
    assert!(ir.contains("while_cond"));
    assert!(ir.contains("while_body"));
    assert!(ir.contains("while_end"));
}

#[test]
fn array_and_slice_arguments_lower() {
    let (ir, _) = lower(
        "fun main() : nothing \
         var grid : char[3][4]; \
         var line : char[4]; \
         fun row(ref r : char[]) : nothing {} \
         fun full(ref g : char[3][4]) : nothing {} \
         { row(grid[0]); row(line); full(grid); writeString(\"ok\"); }",
    );
    assert!(ir.contains("[3 x [4 x i8]]"));
    assert!(ir.contains("define void @main.row(%frame.main* %0, i8* %1)"));
    assert!(ir.contains("define void @main.full(%frame.main* %0, [3 x [4 x i8]]* %1)"));
}

#[test]
fn indexing_a_decayed_parameter_skips_the_leading_zero() {
    // `s` arrives as a first-element pointer ([4 x i8]*); its first index
    // is the inter-row arithmetic, so a[1][2] is a two-index GEP.
    let (ir, _) = lower(
        "fun main() : nothing \
         var grid : char[3][4]; \
         fun f(ref s : char[][4]) : nothing { s[1][2] <- 'x'; } \
         { f(grid); }",
    );
    assert!(ir.contains("define void @main.f(%frame.main* %0, [4 x i8]* %1)"));
}

#[test]
fn forwarding_a_decayed_parameter_does_not_redecay() {
    let (ir, _) = lower(
        "fun main() : nothing \
         var grid : char[3][4]; \
         fun g(ref s : char[][4]) : nothing { s[0][0] <- 'y'; } \
         fun f(ref s : char[][4]) : nothing { g(s); } \
         { f(grid); }",
    );
    // Both take [4 x i8]*; f hands its pointer straight through, and only
    // the call on the whole array in main decays.
    assert!(ir.contains("define void @main.g(%frame.main* %0, [4 x i8]* %1)"));
    assert!(ir.contains("define void @main.f(%frame.main* %0, [4 x i8]* %1)"));
    assert!(ir.contains("%decay = getelementptr"));
    assert!(!ir.contains("%decay1 = getelementptr"));
}

#[test]
fn indexing_a_decayed_one_dimensional_parameter() {
    let (ir, _) = lower(
        "fun main() : nothing \
         var line : char[8]; \
         fun set(ref s : char[]) : nothing { s[3] <- 'z'; } \
         { set(line); }",
    );
    assert!(ir.contains("define void @main.set(%frame.main* %0, i8* %1)"));
}

#[test]
fn optimized_module_still_verifies() {
    let program = parse_and_analyze(
        "fun main() : nothing \
         var i : int; \
         { i <- 0; while i < 100 do { writeInteger(i * i); i <- i + 1; } }",
        BuildMode::Full,
    )
    .unwrap();
    let context = Context::create();
    let mut llvm = IrGen::new(&context, "test").unwrap();
    llvm.ingest(&program).unwrap();
    llvm.optimize();
    llvm.verify().unwrap();
}

#[test]
fn fresh_context_per_compilation() {
    // The session lifecycle allows many compilations in one process.
    for _ in 0..3 {
        let program =
            parse_and_analyze("fun main() : nothing { writeInteger(1); }", BuildMode::Full)
                .unwrap();
        let context = Context::create();
        let mut llvm = IrGen::new(&context, "test").unwrap();
        llvm.ingest(&program).unwrap();
        llvm.verify().unwrap();
    }
}
