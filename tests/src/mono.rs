//! Monomorphization collector integration tests: which instances the
//! fixed-point walk discovers.

use crate::utils::collect;

#[test]
fn one_instance_per_distinct_argument_list() {
    let source = "fn add<T>(a: T, b: T) -> T { a + b }\nfn main() -> i32 {\n    add(1, 2)\n    add(3, 4)\n    let f = add(1.5, 2.5)\n    add(5, 6)\n}";
    let (_, db) = collect(source);
    let mangled: Vec<_> = db
        .function_instances()
        .iter()
        .map(|i| i.mangled.as_str())
        .collect();
    assert_eq!(mangled, vec!["add_i32", "add_f64"]);
}

#[test]
fn struct_literal_contributes_all_methods() {
    let source = "type Box<T> = struct {\n    value: T\n    fn get(self) -> T { self.value }\n    fn replace(mut self, v: T) -> T { self.value }\n}\nfn main() -> i32 {\n    let b = Box { value: 7 }\n    b.get()\n}";
    let (_, db) = collect(source);
    let structs: Vec<_> = db
        .struct_instances()
        .iter()
        .map(|i| i.mangled.as_str())
        .collect();
    assert_eq!(structs, vec!["Box_i32"]);
    // Both methods are instantiated even though only `get` is called:
    // any method might be invoked later on a value of this concrete type.
    let methods: Vec<_> = db
        .method_instances()
        .iter()
        .map(|i| i.mangled.as_str())
        .collect();
    assert!(methods.contains(&"Box_i32_get"));
    assert!(methods.contains(&"Box_i32_replace"));
}

#[test]
fn static_method_calls_contribute_explicitly() {
    let source = "type Vec<T> = struct {\n    len: i32\n    fn new() -> i32 { 0 }\n}\nfn main() -> i32 { Vec<i32>::new() }";
    let (_, db) = collect(source);
    assert!(
        db.method_instances()
            .iter()
            .any(|m| m.mangled == "Vec_i32_new")
    );
}

#[test]
fn generic_function_calling_generic_function_converges() {
    let source = "fn id<T>(x: T) -> T { x }\nfn twice<T>(x: T) -> T { id(id(x)) }\nfn main() -> i32 { twice(21) * 2 }";
    let (_, db) = collect(source);
    let mangled: Vec<_> = db
        .function_instances()
        .iter()
        .map(|i| i.mangled.as_str())
        .collect();
    assert!(mangled.contains(&"twice_i32"));
    assert!(mangled.contains(&"id_i32"));
}

#[test]
fn nested_instance_types_are_registered() {
    let source = "type Pair<A, B> = struct {\n    first: A\n    second: B\n}\ntype Box<T> = struct {\n    value: T\n}\nfn main() -> i32 {\n    let b = Box { value: Pair { first: 1, second: 2.5 } }\n    0\n}";
    let (_, db) = collect(source);
    let structs: Vec<_> = db
        .struct_instances()
        .iter()
        .map(|i| i.mangled.as_str())
        .collect();
    assert!(structs.contains(&"Pair_i32_f64"));
    assert!(structs.contains(&"Box_Pair_i32_f64"));
}

#[test]
fn no_reachable_instance_carries_generics() {
    let source = "fn add<T>(a: T, b: T) -> T { a + b }\nfn main() -> i32 { add(17, 25) }";
    let (_, db) = collect(source);
    for instance in db.function_instances() {
        assert!(
            instance
                .type_args
                .iter()
                .all(|t| !t.has_generics()),
            "instance {} still carries a type parameter",
            instance.mangled
        );
    }
}
