#![warn(clippy::pedantic)]

//! # PawLang Compiler CLI
//!
//! Thin front end over the `paw` orchestration crate. Responsibilities:
//!
//! * parse flags and validate the input path,
//! * run the pipeline for the selected backend,
//! * write the artifact only after every phase succeeded (no zero-byte or
//!   stale output on failure),
//! * optionally invoke the downstream compiler (`--compile`) and execute
//!   the produced binary (`--run`).
//!
//! ## Exit codes
//! * 0  – success.
//! * 1  – diagnostic-producing failure (lex/parse/link/type/codegen).
//! * 2  – I/O error (unreadable input, unwritable output, downstream
//!        compiler failures).
//! * 64 – CLI misuse.

mod parser;

use std::path::PathBuf;
use std::process::{self, Command};

use clap::Parser;
use clap::error::ErrorKind;
use paw::Backend;
use parser::{BackendArg, Cli};

fn main() {
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            process::exit(0);
        }
        Err(err) => {
            eprint!("{err}");
            process::exit(64);
        }
    };

    let backend = match args.backend {
        BackendArg::C => Backend::C,
        BackendArg::Llvm => Backend::Llvm,
    };

    if !args.input.exists() {
        eprintln!("error: input file not found: {}", args.input.display());
        process::exit(2);
    }

    if args.verbose {
        eprintln!("compiling {} ({backend:?} backend)", args.input.display());
    }

    let artifact = match paw::compile(&args.input, backend) {
        Ok(artifact) => artifact,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(diagnostic_exit_code(&err));
        }
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(backend.default_output()));
    if let Err(err) = std::fs::write(&output, &artifact) {
        eprintln!("error: failed to write {}: {err}", output.display());
        process::exit(2);
    }
    if args.verbose {
        eprintln!("wrote {}", output.display());
    }

    if !(args.compile || args.run) {
        process::exit(0);
    }

    let binary = output.with_extension("bin");
    let compiler = match backend {
        Backend::C => "cc",
        Backend::Llvm => "clang",
    };
    let status = Command::new(compiler)
        .arg(&output)
        .arg(format!("-O{}", args.opt_level))
        .arg("-o")
        .arg(&binary)
        .status();
    match status {
        Ok(status) if status.success() => {
            if args.verbose {
                eprintln!("compiled {}", binary.display());
            }
        }
        Ok(status) => {
            eprintln!("error: {compiler} failed with {status}");
            process::exit(2);
        }
        Err(err) => {
            eprintln!("error: failed to invoke {compiler}: {err}");
            process::exit(2);
        }
    }

    if args.run {
        match Command::new(&binary).status() {
            Ok(status) => process::exit(status.code().unwrap_or(1)),
            Err(err) => {
                eprintln!("error: failed to run {}: {err}", binary.display());
                process::exit(2);
            }
        }
    }
    process::exit(0);
}

/// Maps a pipeline error to the exit code contract: I/O-flavored loader
/// failures are 2, every diagnostic is 1.
fn diagnostic_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(load) = err.downcast_ref::<paw_ast::errors::LoadError>() {
        return match load {
            paw_ast::errors::LoadError::CyclicImport { .. } => 1,
            _ => 2,
        };
    }
    1
}
