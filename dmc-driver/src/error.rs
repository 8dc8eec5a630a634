//! Driver error types

use dmc_codegen::CodegenError;
use dmc_common::CompilerError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("imported module '{name}' not found at {}", .path.display())]
    ImportNotFound { name: String, path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} parse error(s) in {}:\n{}", .errors.len(), .path.display(), list(.errors))]
    Parse {
        path: PathBuf,
        errors: Vec<CompilerError>,
    },

    #[error("input path {} has no file name", .path.display())]
    InvalidInput { path: PathBuf },

    #[error(transparent)]
    Compiler(#[from] CompilerError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error("could not run linker '{linker}': {source}")]
    LinkerUnavailable {
        linker: String,
        #[source]
        source: io::Error,
    },

    #[error("linking failed:\n{stderr}")]
    LinkFailed { stderr: String },
}

fn list(errors: &[CompilerError]) -> String {
    errors
        .iter()
        .map(|e| format!("  {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}
