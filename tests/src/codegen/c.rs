//! C backend: shape of the emitted translation unit.

use crate::utils::{c_codegen, count_occurrences};

#[test]
fn header_includes_are_present() {
    let unit = c_codegen("fn main() -> i32 { 0 }");
    for header in [
        "#include <stdio.h>",
        "#include <stdlib.h>",
        "#include <stdint.h>",
        "#include <stdbool.h>",
        "#include <string.h>",
    ] {
        assert!(unit.contains(header), "missing {header}");
    }
}

#[test]
fn primitive_types_map_to_stdint() {
    let unit = c_codegen(
        "fn f(a: i8, b: u16, c: i64, d: f32, e: bool, g: string) -> f64 { 1.5 }\nfn main() -> i32 { 0 }",
    );
    assert!(unit.contains("int8_t a"));
    assert!(unit.contains("uint16_t b"));
    assert!(unit.contains("int64_t c"));
    assert!(unit.contains("float d"));
    assert!(unit.contains("bool e"));
    assert!(unit.contains("char* g"));
    assert!(unit.contains("double f("));
}

#[test]
fn enum_lowering_produces_tag_union_and_constructors() {
    let unit = c_codegen(
        "type Shape = enum { Point, Circle(f64), Rect(f64, f64) }\nfn main() -> i32 { let s = Circle(1.5); 0 }",
    );
    assert!(unit.contains("typedef enum { Shape_TAG_Point, Shape_TAG_Circle, Shape_TAG_Rect } Shape_Tag;"));
    assert!(unit.contains("Shape_Tag tag;"));
    assert!(unit.contains("union {"));
    assert!(unit.contains("double Circle_value;"));
    assert!(unit.contains("double field0;"));
    assert!(unit.contains("double field1;"));
    assert!(unit.contains("Shape Shape_Point(void)"));
    assert!(unit.contains("Shape Shape_Circle(double v0)"));
    assert!(unit.contains("Shape Shape_Rect(double v0, double v1)"));
}

#[test]
fn methods_take_self_as_pointer() {
    let unit = c_codegen(
        "type Counter = struct {\n    count: i32\n    fn bump(mut self) -> i32 { self.count }\n}\nfn main() -> i32 { 0 }",
    );
    assert!(unit.contains("int32_t Counter_bump(Counter* self)"));
    assert!(unit.contains("self->count"));
}

#[test]
fn loop_forms_lower_to_c_loops() {
    let unit = c_codegen(
        "fn main() -> i32 {\n    let mut sum = 0\n    loop { break }\n    loop sum < 10 { sum = sum + 1 }\n    loop i in 0..4 { sum = sum + i }\n    loop j in 1..=4 { sum = sum + j }\n    sum\n}",
    );
    assert!(unit.contains("for (;;) {"));
    assert!(unit.contains("while ((sum < 10)) {"));
    assert!(unit.contains("for (int32_t i = 0; i < 4; i++) {"));
    assert!(unit.contains("for (int32_t j = 1; j <= 4; j++) {"));
}

#[test]
fn array_iteration_uses_sizeof_bound() {
    let unit = c_codegen(
        "fn main() -> i32 {\n    let xs = [1, 2, 3]\n    let mut sum = 0\n    loop x in xs { sum = sum + x }\n    sum\n}",
    );
    assert!(unit.contains("int32_t xs[3] = { 1, 2, 3 };"));
    assert!(unit.contains("sizeof(xs) / sizeof(xs[0])"));
}

#[test]
fn string_interpolation_uses_static_buffer() {
    let unit = c_codegen(
        r#"fn main() -> i32 { let s = "x = ${40 + 2}!"; 0 }"#,
    );
    assert!(unit.contains("static char __buf1[1024];"));
    assert!(unit.contains("strcat(__buf1, \"x = \");"));
    assert!(unit.contains("sprintf("));
    assert!(unit.contains("strcat(__buf1, \"!\");"));
}

#[test]
fn generic_instances_get_distinct_typedefs() {
    let unit = c_codegen(
        "type Box<T> = struct {\n    value: T\n}\nfn main() -> i32 {\n    let a = Box { value: 7 }\n    let b = Box { value: 1.5 }\n    0\n}",
    );
    assert!(unit.contains("typedef struct Box_i32 Box_i32;"));
    assert!(unit.contains("typedef struct Box_f64 Box_f64;"));
    assert!(unit.contains("int32_t value;"));
    assert!(unit.contains("double value;"));
}

#[test]
fn is_expression_lowers_to_statement_expression() {
    let unit = c_codegen(
        "type R = enum { A(i32), B(i32) }\nfn f() -> R { A(1) }\nfn main() -> i32 {\n    f() is { A(v) -> v, B(x) -> x + 1 }\n}",
    );
    assert!(unit.contains("__match_value"));
    assert!(unit.contains(".tag == R_TAG_A"));
    assert!(unit.contains("int32_t v = "));
    assert!(unit.contains(".data.A_value"));
}

#[test]
fn cast_emits_c_cast() {
    let unit = c_codegen("fn main() -> i32 { let x = 3.5 as i32; x }");
    assert!(unit.contains("((int32_t)(3.5))"));
}

#[test]
fn compound_assignment_is_preserved() {
    let unit = c_codegen("fn main() -> i32 { let mut x = 1\n x += 2\n x *= 3\n x }");
    assert!(unit.contains("x += 2;"));
    assert!(unit.contains("x *= 3;"));
}

#[test]
fn i128_uses_extension_type_behind_guard() {
    let unit = c_codegen("fn big(x: i128) -> i128 { x }\nfn main() -> i32 { 0 }");
    assert!(unit.contains("#if !defined(__SIZEOF_INT128__)"));
    assert!(unit.contains("__int128_t x"));
}

#[test]
fn each_function_has_exactly_one_definition() {
    let unit = c_codegen(
        "fn helper() -> i32 { 1 }\nfn main() -> i32 { helper() + helper() + helper() }",
    );
    // One prototype, one definition.
    assert_eq!(count_occurrences(&unit, "int32_t helper(void)"), 2);
}
