#![warn(clippy::pedantic)]
//! Core Orchestration Crate for the PawLang Compiler
//!
//! This crate provides the entry points for the compilation pipeline. Each
//! phase is exposed as a standalone function, and [`compile`] runs the
//! whole chain:
//!
//! ```text
//! .paw source → load → lex/parse → link → type check → collect instances
//!             → C translation unit | textual LLVM IR
//! ```
//!
//! The pipeline is single-threaded and strictly linear: diagnostics are
//! raised by whichever phase detects them and abort the run; no output is
//! produced after a failure.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paw::{Backend, compile};
//!
//! fn build(path: &std::path::Path) -> anyhow::Result<String> {
//!     compile(path, Backend::C)
//! }
//! ```
//!
//! Phases can also be driven individually, which is what the test suite
//! does:
//!
//! ```rust,no_run
//! use paw::{codegen_c, collect_instances, link_sources, load, parse_all};
//!
//! fn build(path: &std::path::Path) -> anyhow::Result<String> {
//!     let sources = load(path)?;
//!     let (modules, arena) = parse_all(&sources)?;
//!     let program = link_sources(modules, arena)?;
//!     let typed = paw::type_check(program)?;
//!     let db = collect_instances(&typed);
//!     codegen_c(&typed, &db)
//! }
//! ```

use std::path::Path;
use std::rc::Rc;

use paw_ast::arena::Arena;
use paw_ast::linker::Program;
use paw_ast::loader::ModuleSource;
use paw_ast::nodes::ModuleAst;
use paw_ast::parser_context::ParserContext;
use paw_mono::MonoDatabase;
use paw_type_checker::TypeCheckerBuilder;
use paw_type_checker::typed_context::TypedContext;

/// Which code generator to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    C,
    Llvm,
}

impl Backend {
    /// Default output file name for this backend.
    #[must_use]
    pub const fn default_output(&self) -> &'static str {
        match self {
            Backend::C => "output.c",
            Backend::Llvm => "output.ll",
        }
    }
}

/// Loads the root file and its transitive imports, leaves first.
///
/// # Errors
///
/// Propagates loader failures (missing files, cyclic imports, I/O).
pub fn load(root: &Path) -> anyhow::Result<Vec<ModuleSource>> {
    Ok(paw_ast::loader::load_modules(root)?)
}

/// Parses every loaded module into one shared arena.
///
/// # Errors
///
/// Returns the first lexical or syntactic error.
pub fn parse_all(sources: &[ModuleSource]) -> anyhow::Result<(Vec<Rc<ModuleAst>>, Arena)> {
    let mut ctx = ParserContext::new();
    let mut arena = Arena::default();
    let mut modules = Vec::new();
    for source in sources {
        let module = paw_ast::parser::parse_module(
            &source.text,
            &source.file.to_string_lossy(),
            &source.path,
            &mut ctx,
            &mut arena,
        )?;
        modules.push(module);
    }
    Ok((modules, arena))
}

/// Merges module ASTs into a single program, enforcing `pub` visibility at
/// import points.
///
/// # Errors
///
/// Returns `UnresolvedImport` / `NameConflict` linker failures.
pub fn link_sources(modules: Vec<Rc<ModuleAst>>, arena: Arena) -> anyhow::Result<Program> {
    Ok(paw_ast::linker::link(modules, arena)?)
}

/// Runs type inference and validation over the linked program.
///
/// # Errors
///
/// Returns the first semantic error.
pub fn type_check(program: Program) -> anyhow::Result<TypedContext> {
    Ok(TypeCheckerBuilder::build_typed_context(program)?.typed_context())
}

/// Collects every concrete generic instantiation reachable from the
/// program's non-generic roots.
#[must_use]
pub fn collect_instances(ctx: &TypedContext) -> MonoDatabase {
    paw_mono::collect_instances(ctx)
}

/// Emits the C translation unit.
///
/// # Errors
///
/// Returns `UnsupportedConstruct` for shapes the C backend does not lower.
pub fn codegen_c(ctx: &TypedContext, db: &MonoDatabase) -> anyhow::Result<String> {
    Ok(paw_c_codegen::codegen(ctx, db)?)
}

/// Emits textual LLVM IR.
///
/// # Errors
///
/// Returns `UnsupportedConstruct` for shapes the LLVM backend does not
/// lower (including enum payloads over 32 bytes).
pub fn codegen_llvm(ctx: &TypedContext, db: &MonoDatabase) -> anyhow::Result<String> {
    Ok(paw_llvm_codegen::codegen(ctx, db)?)
}

/// Runs the whole pipeline on a root source file and returns the emitted
/// artifact text for the selected backend.
///
/// # Errors
///
/// Propagates the first failure of any phase; nothing is written anywhere
/// on failure.
pub fn compile(root: &Path, backend: Backend) -> anyhow::Result<String> {
    let sources = load(root)?;
    let (modules, arena) = parse_all(&sources)?;
    let program = link_sources(modules, arena)?;
    let typed = type_check(program)?;
    let db = collect_instances(&typed);
    match backend {
        Backend::C => codegen_c(&typed, &db),
        Backend::Llvm => codegen_llvm(&typed, &db),
    }
}

/// Compiles source text already in memory (single module, no imports).
/// Used by tests and tooling.
///
/// # Errors
///
/// Propagates the first failure of any phase.
pub fn compile_source(source: &str, backend: Backend) -> anyhow::Result<String> {
    let typed = check_source(source)?;
    let db = collect_instances(&typed);
    match backend {
        Backend::C => codegen_c(&typed, &db),
        Backend::Llvm => codegen_llvm(&typed, &db),
    }
}

/// Parses, links and type-checks source text already in memory.
///
/// # Errors
///
/// Propagates the first failure of any phase.
pub fn check_source(source: &str) -> anyhow::Result<TypedContext> {
    let mut ctx = ParserContext::new();
    let mut arena = Arena::default();
    let module = paw_ast::parser::parse_module(source, "main.paw", "main", &mut ctx, &mut arena)?;
    let program = Program::from_single_module(module, arena)?;
    type_check(program)
}
