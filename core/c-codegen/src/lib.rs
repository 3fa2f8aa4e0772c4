#![warn(clippy::pedantic)]
//! C Backend Crate
//!
//! Emits a single self-contained C17 translation unit for a type-checked
//! program plus its monomorphization database. The unit depends only on
//! the standard headers (`stdio.h`, `stdlib.h`, `stdint.h`, `stdbool.h`,
//! `string.h`); pattern matching and block expressions lower to GCC/Clang
//! statement expressions.
//!
//! Declaration order inside the unit:
//!
//! 1. headers and the `__int128` guard
//! 2. struct/enum typedef forwards
//! 3. enum tag enums
//! 4. struct definitions (declaration order, instances after)
//! 5. enum tagged-union definitions
//! 6. prototypes for functions, methods and enum constructors
//! 7. enum constructor bodies
//! 8. function and method bodies, monomorphized copies last

pub mod expr;
pub mod generator;
pub mod stmt;
pub mod types;

use paw_ast::nodes::Location;
use paw_mono::MonoDatabase;
use paw_type_checker::typed_context::TypedContext;
use thiserror::Error;

/// Errors raised while lowering to C.
#[derive(Debug, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum CodegenError {
    /// The backend met an AST shape it does not lower.
    #[error("{location}: unsupported construct: {name}")]
    UnsupportedConstruct { name: String, location: Location },
}

/// Generates the C translation unit.
///
/// # Errors
///
/// Returns [`CodegenError::UnsupportedConstruct`] for AST shapes the C
/// backend does not lower.
pub fn codegen(ctx: &TypedContext, db: &MonoDatabase) -> Result<String, CodegenError> {
    let mut generator = generator::CGenerator::new(ctx, db);
    generator.emit_program()?;
    Ok(generator.finish())
}
