#![warn(clippy::pedantic)]
//! LLVM Backend Crate
//!
//! Emits textual LLVM IR for a type-checked program through inkwell, the
//! Rust binding over the LLVM C API (module/context/builder/basic-block/
//! value primitives). Output is compatible with `clang`/`llc` 19 or later
//! under the default C calling convention; struct-returning functions
//! return by value.
//!
//! Layout decisions (see the compiler module for details):
//! - integers of width N map to `iN`; sign lives in the instruction choice
//!   (`sdiv` vs `udiv`, `sext` vs `zext`)
//! - `bool` is `i1` in SSA but `i8` in aggregates and at ABI boundaries
//! - every enum is the fixed struct `{ i32, [32 x i8] }`: a tag plus a
//!   32-byte payload buffer; larger payloads are rejected
//! - mutable locals live in `alloca` slots accessed with `load`/`store`
//!
//! All temporary name strings and type caches are owned by the compiler
//! value and released together when it is dropped.

mod compiler;

use inkwell::context::Context;
use paw_ast::nodes::Location;
use paw_mono::MonoDatabase;
use paw_type_checker::typed_context::TypedContext;
use thiserror::Error;

use crate::compiler::Compiler;

/// Errors raised while lowering to LLVM IR.
#[derive(Debug, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum CodegenError {
    /// The backend met an AST shape it does not lower.
    #[error("{location}: unsupported construct: {name}")]
    UnsupportedConstruct { name: String, location: Location },
}

/// Generates textual LLVM IR for the program.
///
/// # Errors
///
/// Returns [`CodegenError::UnsupportedConstruct`] for AST shapes the LLVM
/// backend does not lower (trait methods, enum payloads over 32 bytes,
/// unsized array iteration).
pub fn codegen(ctx: &TypedContext, db: &MonoDatabase) -> Result<String, CodegenError> {
    let context = Context::create();
    let compiler = Compiler::new(&context, "paw_module", ctx, db);
    compiler.emit_program()?;
    Ok(compiler.print_ir())
}
