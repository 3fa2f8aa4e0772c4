#![warn(clippy::pedantic)]
//! Type Checker Crate
//!
//! Type checking and local type inference for the PawLang compiler.
//! It validates the linked program and annotates every expression with a
//! [`type_info::TypeInfo`]:
//!
//! - literal defaults (integer → `i32`, float → `f64`) with suffix and
//!   annotation overrides
//! - `let` type inference and annotation checking
//! - call arity and argument validation
//! - generic parameter unification across call sites
//! - mutability checking for assignment targets
//! - rejection of parsed-but-unsupported declarations (trait, impl, async)
//!
//! ## Entry Point
//!
//! Use [`TypeCheckerBuilder`] to type-check a linked [`Program`]:
//!
//! ```ignore
//! let program = link(modules, arena)?;
//! let typed_context = TypeCheckerBuilder::build_typed_context(program)?.typed_context();
//! ```
//!
//! ## Modules
//!
//! - [`errors`] - structured error enum, one variant per diagnostic
//! - [`type_info`] - the semantic type representation
//! - [`symbol_table`] - function/struct/enum/method signatures
//! - [`typed_context`] - node-id → type mapping over the program

use std::marker::PhantomData;

use paw_ast::linker::Program;

use crate::errors::TypeCheckError;
use crate::{type_checker::TypeChecker, typed_context::TypedContext};

pub mod errors;
pub mod symbol_table;
mod type_checker;
pub mod type_info;
pub mod typed_context;

/// Marker state indicating builder has not yet been initialized.
pub struct TypeCheckerInitState;

/// Marker state indicating type checking is complete and context is ready.
pub struct TypeCheckerCompleteState;

/// Type alias for a completed type checker builder ready to yield its context.
pub type CompletedTypeCheckerBuilder = TypeCheckerBuilder<TypeCheckerCompleteState>;

/// Builder for running type checking on a linked program.
///
/// Uses the typestate pattern to ensure type checking completes before
/// accessing the typed context.
pub struct TypeCheckerBuilder<S> {
    typed_context: TypedContext,
    _state: PhantomData<S>,
}

impl TypeCheckerBuilder<TypeCheckerInitState> {
    /// Run type checking on the provided program and return a completed
    /// builder.
    ///
    /// # Errors
    ///
    /// Returns the first [`TypeCheckError`] encountered; the program is not
    /// usable for code generation after an error.
    #[must_use = "returns builder with typed context, extract with .typed_context()"]
    pub fn build_typed_context(
        program: Program,
    ) -> Result<TypeCheckerBuilder<TypeCheckerCompleteState>, TypeCheckError> {
        let mut ctx = TypedContext::new(program);
        let mut type_checker = TypeChecker::default();
        type_checker.check(&mut ctx)?;
        Ok(TypeCheckerBuilder {
            typed_context: ctx,
            _state: PhantomData,
        })
    }
}

impl TypeCheckerBuilder<TypeCheckerCompleteState> {
    /// Consume the builder and return the typed context.
    #[must_use = "consumes builder and returns the typed context"]
    pub fn typed_context(self) -> TypedContext {
        self.typed_context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paw_ast::arena::Arena;
    use paw_ast::parser::parse_module;
    use paw_ast::parser_context::ParserContext;

    fn check(source: &str) -> Result<TypedContext, TypeCheckError> {
        let mut parser_ctx = ParserContext::new();
        let mut arena = Arena::default();
        let module = parse_module(source, "test.paw", "main", &mut parser_ctx, &mut arena)
            .expect("parsing should succeed");
        let program = Program::from_single_module(module, arena).expect("link should succeed");
        Ok(TypeCheckerBuilder::build_typed_context(program)?.typed_context())
    }

    #[test]
    fn infers_let_from_literal() {
        let ctx = check("fn main() -> i32 { let x = 42; x }").expect("should type check");
        assert!(!ctx.functions().is_empty());
    }

    #[test]
    fn immutable_assignment_fails() {
        let err = check("fn main() -> i32 { let x = 1\n x = 2\n x }").unwrap_err();
        assert!(matches!(
            err,
            TypeCheckError::ImmutableAssignment { name, .. } if name == "x"
        ));
    }

    #[test]
    fn mutable_assignment_succeeds() {
        assert!(check("fn main() -> i32 { let mut x = 1\n x = 2\n x }").is_ok());
    }

    #[test]
    fn arity_mismatch_is_reported() {
        let source = "fn f(a: i32) -> i32 { a }\nfn main() -> i32 { f(1, 2) }";
        let err = check(source).unwrap_err();
        assert!(matches!(
            err,
            TypeCheckError::ArityMismatch { expected: 1, found: 2, .. }
        ));
    }

    #[test]
    fn generic_conflict_is_reported() {
        let source = "fn pair<T>(a: T, b: T) -> T { a }\nfn main() -> i32 { pair(1, true); 0 }";
        let err = check(source).unwrap_err();
        assert!(matches!(err, TypeCheckError::GenericConflict { param, .. } if param == "T"));
    }

    #[test]
    fn generic_call_unifies() {
        let source = "fn add<T>(a: T, b: T) -> T { a + b }\nfn main() -> i32 { add(17, 25) }";
        assert!(check(source).is_ok());
    }

    #[test]
    fn trait_declarations_are_rejected() {
        let err = check("type P = trait { fn show(self) }\nfn main() -> i32 { 0 }").unwrap_err();
        assert!(matches!(
            err,
            TypeCheckError::UnsupportedDeclaration { kind: "trait", .. }
        ));
    }

    #[test]
    fn async_functions_are_rejected() {
        let err = check("async fn job() -> i32 { 0 }\nfn main() -> i32 { 0 }").unwrap_err();
        assert!(matches!(
            err,
            TypeCheckError::UnsupportedDeclaration { kind: "async fn", .. }
        ));
    }

    #[test]
    fn int_literal_boundary() {
        assert!(check("fn main() -> i32 { 2147483647 }").is_ok());
        let err = check("fn main() -> i32 { let x = 2147483648; 0 }").unwrap_err();
        assert!(matches!(err, TypeCheckError::IntLiteralOutOfRange { .. }));
        assert!(check("fn main() -> i32 { let x: i64 = 2147483648; 0 }").is_ok());
        assert!(check("fn main() -> i32 { let x = 2147483648i64; 0 }").is_ok());
    }

    #[test]
    fn struct_literal_infers_type_params() {
        let source = "type Box<T> = struct {\n    value: T\n    fn get(self) -> T { self.value }\n}\nfn main() -> i32 {\n    let b = Box { value: 7 }\n    b.get() * 6\n}";
        let ctx = check(source).expect("should type check");
        let functions = ctx.functions();
        assert_eq!(functions.len(), 1);
    }

    #[test]
    fn enum_match_binds_payload() {
        let source = "type Result = enum { Ok(i32), Err(i32) }\nfn test() -> Result { Ok(100) }\nfn main() -> i32 {\n    test() is {\n        Ok(v) -> v - 58,\n        Err(_) -> -1\n    }\n}";
        assert!(check(source).is_ok());
    }

    #[test]
    fn try_operator_requires_result_like_enum() {
        let source = "fn main() -> i32 { let x = 1?; x }";
        let err = check(source).unwrap_err();
        assert!(matches!(err, TypeCheckError::InvalidTryOperand { .. }));
    }

    #[test]
    fn try_operator_propagates() {
        let source = "type Result = enum { Ok(i32), Err(i32) }\nfn divide(a: i32, b: i32) -> Result {\n    if b == 0 { Err(1) } else { Ok(a / b) }\n}\nfn run() -> Result {\n    let x = divide(84, 2)?\n    Ok(x)\n}\nfn main() -> i32 {\n    run() is { Ok(v) -> v, Err(_) -> 0 }\n}";
        assert!(check(source).is_ok());
    }

    #[test]
    fn return_type_mismatch_fails() {
        let err = check("fn main() -> i32 { true }").unwrap_err();
        assert!(matches!(err, TypeCheckError::TypeMismatch { .. }));
    }

    #[test]
    fn unknown_identifier_fails() {
        let err = check("fn main() -> i32 { missing }").unwrap_err();
        assert!(matches!(err, TypeCheckError::UnknownIdentifier { .. }));
    }

    #[test]
    fn loop_binder_gets_element_type() {
        let source = "fn main() -> i32 {\n    let mut sum = 0\n    loop i in 1..=8 { sum = sum + i }\n    loop sum < 42 { sum = sum + 6 }\n    sum\n}";
        assert!(check(source).is_ok());
    }

    #[test]
    fn static_call_with_explicit_args() {
        let source = "type Vec<T> = struct {\n    len: i32\n    fn new() -> i32 { 0 }\n}\nfn main() -> i32 { Vec<i32>::new() }";
        assert!(check(source).is_ok());
    }

    #[test]
    fn is_arms_must_unify() {
        let source = "type R = enum { A(i32), B(i32) }\nfn f() -> R { A(1) }\nfn main() -> i32 { f() is { A(v) -> v, B(_) -> true } }";
        let err = check(source).unwrap_err();
        assert!(matches!(err, TypeCheckError::TypeMismatch { .. }));
    }
}
