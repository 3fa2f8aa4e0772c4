//! Front-to-back pipeline behavior: diagnostics surface from the right
//! phase and carry locations.

use crate::utils::{c_codegen, try_check};

#[test]
fn lex_error_carries_location() {
    let err = try_check("fn main() -> i32 {\n    let s = \"unterminated\n}").unwrap_err();
    assert!(err.to_string().contains("unterminated string literal"));
}

#[test]
fn parse_error_names_expected_token() {
    let err = try_check("fn main( -> i32 { 0 }").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("expected"), "unexpected message: {message}");
    assert!(message.contains("main.paw:1:"));
}

#[test]
fn type_error_points_at_offending_line() {
    let err = try_check("fn main() -> i32 {\n    let x: bool = 1\n    0\n}").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("type mismatch"));
    assert!(message.contains(":2:"), "unexpected message: {message}");
}

#[test]
fn arity_and_unknowns_are_reported() {
    let err = try_check("fn f(a: i32) -> i32 { a }\nfn main() -> i32 { f() }").unwrap_err();
    assert!(err.to_string().contains("expects 1 arguments, but 0 provided"));

    let err = try_check("fn main() -> i32 { ghost() }").unwrap_err();
    assert!(err.to_string().contains("undefined function `ghost`"));
}

#[test]
fn trait_and_impl_are_rejected_not_ignored() {
    let err = try_check("type Show = trait { fn show(self) }\nfn main() -> i32 { 0 }").unwrap_err();
    assert!(err.to_string().contains("`trait` declarations are not supported"));

    let err = try_check("impl Foo { fn f(self) -> i32 { 0 } }\nfn main() -> i32 { 0 }").unwrap_err();
    assert!(err.to_string().contains("`impl` declarations are not supported"));
}

#[test]
fn guards_and_wildcards_type_check() {
    let source = "fn classify(x: i32) -> i32 {\n    x is {\n        n if n > 100 -> 3,\n        n if n > 10 -> 2,\n        0 -> 0,\n        _ -> 1\n    }\n}\nfn main() -> i32 { classify(50) }";
    let unit = c_codegen(source);
    assert!(unit.contains("n > 100"));
    assert!(unit.contains("n > 10"));
}

#[test]
fn single_expression_functions_compile() {
    let unit = c_codegen("fn double(x: i32) -> i32 = x * 2\nfn main() -> i32 { double(21) }");
    assert!(unit.contains("int32_t double(int32_t x)"));
    assert!(unit.contains("return (x * 2);"));
}

#[test]
fn string_interpolation_checks_segments() {
    let err = try_check(
        "type P = struct { x: i32 }\nfn main() -> i32 { let p = P { x: 1 }\n let s = \"${p}\"\n 0 }",
    )
    .unwrap_err();
    assert!(err.to_string().contains("type mismatch"));
}

#[test]
fn alias_types_resolve_transitively() {
    let source = "type Meters = f64\nfn dist(m: Meters) -> Meters { m }\nfn main() -> i32 { let d: Meters = 1.5\n 0 }";
    let unit = c_codegen(source);
    assert!(unit.contains("double dist(double m)"));
}

#[test]
fn references_are_aliases() {
    let source = "fn read(x: &i32) -> i32 { x + 1 }\nfn main() -> i32 { let v = 41\n read(&v) }";
    assert!(try_check(source).is_ok());
}
