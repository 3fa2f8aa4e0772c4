//! LLVM backend: shape of the emitted textual IR.

use crate::utils::{count_occurrences, llvm_codegen};

#[test]
fn functions_define_with_integer_types() {
    let ir = llvm_codegen("fn add(a: i32, b: i32) -> i32 { a + b }\nfn main() -> i32 { add(1, 2) }");
    assert!(ir.contains("define i32 @add(i32"));
    assert!(ir.contains("define i32 @main()"));
    assert!(ir.contains("add i32"));
}

#[test]
fn sign_lives_in_the_instruction_choice() {
    let ir = llvm_codegen(
        "fn s(a: i32, b: i32) -> i32 { a / b }\nfn u(a: u32, b: u32) -> u32 { a / b }\nfn main() -> i32 { 0 }",
    );
    assert!(ir.contains("sdiv i32"));
    assert!(ir.contains("udiv i32"));
}

#[test]
fn mutable_locals_use_alloca_store_load() {
    let ir = llvm_codegen("fn main() -> i32 { let mut x = 1\n x = 2\n x }");
    assert!(ir.contains("%x.addr = alloca i32"));
    assert!(ir.contains("store i32"));
    assert!(ir.contains("load i32, ptr %x.addr"));
}

#[test]
fn enums_are_tag_plus_32_byte_buffer() {
    let ir = llvm_codegen(
        "type R = enum { Ok(i32), Err(i32) }\nfn main() -> i32 { let r = Ok(1); 0 }",
    );
    assert!(ir.contains("%R = type { i32, [32 x i8] }"));
    assert!(ir.contains("define %R @R_Ok(i32"));
    assert!(ir.contains("define %R @R_Err(i32"));
}

#[test]
fn oversized_enum_payload_is_rejected() {
    let source = "type Big = struct {\n    a: i64\n    b: i64\n    c: i64\n    d: i64\n    e: i64\n}\ntype Holder = enum { Wrap(Big) }\nfn main() -> i32 { 0 }";
    let err = paw::compile_source(source, paw::Backend::Llvm).unwrap_err();
    assert!(err.to_string().contains("exceeds 32 bytes"));
}

#[test]
fn string_literals_are_private_constants() {
    let ir = llvm_codegen(r#"fn main() -> i32 { let s = "hello"; 0 }"#);
    assert!(ir.contains("private unnamed_addr constant"));
    assert!(ir.contains("hello"));
}

#[test]
fn if_expression_merges_with_phi() {
    let ir = llvm_codegen("fn main() -> i32 { if 1 < 2 { 40 } else { 2 } }");
    assert!(ir.contains("br i1"));
    assert!(ir.contains("phi i32"));
}

#[test]
fn loops_get_header_body_exit_blocks() {
    let ir = llvm_codegen(
        "fn main() -> i32 {\n    let mut sum = 0\n    loop sum < 42 { sum = sum + 6 }\n    sum\n}",
    );
    assert!(ir.contains("loop.header"));
    assert!(ir.contains("loop.body"));
    assert!(ir.contains("loop.exit"));
}

#[test]
fn pattern_match_compares_tags() {
    let ir = llvm_codegen(
        "type R = enum { Ok(i32), Err(i32) }\nfn f() -> R { Ok(1) }\nfn main() -> i32 { f() is { Ok(v) -> v, Err(_) -> 0 } }",
    );
    assert!(ir.contains("icmp eq i32"));
    assert!(ir.contains("match.arm"));
    assert!(ir.contains("match.merge"));
}

#[test]
fn try_branches_to_early_return() {
    let ir = llvm_codegen(
        "type R = enum { Ok(i32), Err(i32) }\nfn f() -> R { Ok(1) }\nfn g() -> R {\n    let x = f()?\n    Ok(x)\n}\nfn main() -> i32 { 0 }",
    );
    assert!(ir.contains("try.err"));
    assert!(ir.contains("try.ok"));
    assert!(ir.contains("ret %R"));
}

#[test]
fn generic_instances_emit_mangled_defines() {
    let ir = llvm_codegen(
        "fn add<T>(a: T, b: T) -> T { a + b }\nfn main() -> i32 { add(17, 25) }",
    );
    assert_eq!(count_occurrences(&ir, "define i32 @add_i32("), 1);
    assert!(!ir.contains("define i32 @add("));
}

#[test]
fn bool_is_i8_in_signatures_and_i1_in_branches() {
    let ir = llvm_codegen(
        "fn flag(x: bool) -> bool { !x }\nfn main() -> i32 { if flag(true) { 1 } else { 0 } }",
    );
    assert!(ir.contains("define i8 @flag(i8"));
    assert!(ir.contains("br i1"));
}
