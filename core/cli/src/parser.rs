//! Command line argument parsing for the PawLang compiler.
//!
//! This module defines the CLI interface using `clap`. The `Cli` struct
//! captures all command line flags and arguments passed to the `pawc`
//! binary; the driver in `main.rs` interprets them.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Backend selection flag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum BackendArg {
    /// Emit a single self-contained C17 translation unit.
    C,
    /// Emit textual LLVM IR.
    Llvm,
}

/// Command line interface definition for the PawLang compiler.
///
/// ## Examples
///
/// Emit C (the default backend):
/// ```bash
/// pawc examples/hello.paw
/// ```
///
/// Emit LLVM IR to a chosen path:
/// ```bash
/// pawc examples/hello.paw --backend=llvm -o hello.ll
/// ```
///
/// Build and run a native binary through the downstream compiler:
/// ```bash
/// pawc examples/hello.paw --backend=c -O2 --run
/// ```
#[derive(Parser)]
#[command(
    name = "pawc",
    author,
    version,
    about = "PawLang ahead-of-time compiler (pawc)",
    long_about = "The 'pawc' command compiles a single .paw root file (plus its imports) to \
either a C translation unit or textual LLVM IR. With --compile the downstream C compiler or \
clang is invoked on the artifact; --run additionally executes the produced binary."
)]
pub(crate) struct Cli {
    /// Path to the root source file to compile.
    pub(crate) input: PathBuf,

    /// Output file path. Defaults to `output.c` or `output.ll` depending on
    /// the selected backend.
    #[clap(short = 'o', value_name = "PATH")]
    pub(crate) output: Option<PathBuf>,

    /// Code generator to use.
    #[clap(long = "backend", value_enum, default_value = "c")]
    pub(crate) backend: BackendArg,

    /// Optimization level hint passed through to the downstream compiler
    /// (`-O0` .. `-O3`). Has no effect on the emitted C or IR text itself.
    #[clap(short = 'O', value_name = "LEVEL", default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=3))]
    pub(crate) opt_level: u32,

    /// Additionally invoke the downstream compiler (`cc` for the C backend,
    /// `clang` for LLVM IR) on the emitted artifact.
    #[clap(long = "compile", action = clap::ArgAction::SetTrue)]
    pub(crate) compile: bool,

    /// Compile and then execute the produced binary. Implies `--compile`;
    /// the binary's exit code becomes pawc's exit code.
    #[clap(long = "run", action = clap::ArgAction::SetTrue)]
    pub(crate) run: bool,

    /// Verbose progress output on stderr, one line per phase.
    #[clap(short = 'v', action = clap::ArgAction::SetTrue)]
    pub(crate) verbose: bool,
}
