//! Compilation pipeline: resolve, parse, generate, concatenate, link

use crate::error::DriverError;
use crate::imports::{CompilationUnit, ImportResolver};
use crate::options::DriverOptions;
use dmc_backend::create_backend;
use dmc_codegen::LabelCounter;
use dmc_frontend::Frontend;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// File name of the whole-program assembly
pub const CONCAT_FILE_NAME: &str = "___concat.s";

/// Artifacts produced by one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutcome {
    /// Per-file assembly, in compilation order
    pub assembly_files: Vec<PathBuf>,
    pub concatenated: PathBuf,
    /// Linked executable, absent with `no_link`
    pub binary: Option<PathBuf>,
    /// Label counter after the last file
    pub labels: LabelCounter,
}

pub fn compile(options: &DriverOptions) -> Result<CompileOutcome, DriverError> {
    info!("compiling {} for {}", options.input.display(), options.target);

    let CompilationUnit { files, constants } =
        ImportResolver::new(options.base_dir(), &options.stdlib_dir).resolve(&options.input)?;

    let asm_dir = options.asm_dir();
    fs::create_dir_all(&asm_dir).map_err(|source| DriverError::Write {
        path: asm_dir.clone(),
        source,
    })?;

    let mut labels = LabelCounter::default();
    let mut assembly_files = Vec::with_capacity(files.len());

    for file in files {
        info!("compiling module '{}' ({})", file.name, file.path.display());

        let program = Frontend::parse_tokens(file.tokens).map_err(|errors| DriverError::Parse {
            path: file.path.clone(),
            errors,
        })?;

        if options.emit_ast {
            println!("{}", Frontend::program_to_json(&program)?);
        }

        let mut backend = create_backend(options.target);
        labels = backend.generate(&program, &constants, labels)?;

        let path = asm_dir.join(format!("{}.s", file.name));
        backend.write(&path)?;
        debug!("wrote {} (label counter now {labels})", path.display());
        assembly_files.push(path);
    }

    let concatenated = asm_dir.join(CONCAT_FILE_NAME);
    concatenate(&assembly_files, &concatenated)?;

    let binary = if options.no_link {
        None
    } else {
        let binary = options.binary_path()?;
        link(&options.linker, &concatenated, &binary)?;
        Some(binary)
    };

    Ok(CompileOutcome {
        assembly_files,
        concatenated,
        binary,
        labels,
    })
}

/// Join per-file assembly into one translation unit
pub fn concatenate(parts: &[PathBuf], output: &Path) -> Result<(), DriverError> {
    let mut text = String::new();
    for part in parts {
        let contents = fs::read_to_string(part).map_err(|source| DriverError::Read {
            path: part.clone(),
            source,
        })?;
        text.push_str(&contents);
    }

    fs::write(output, text).map_err(|source| DriverError::Write {
        path: output.to_path_buf(),
        source,
    })
}

/// Assemble and link with the system toolchain
pub fn link(linker: &str, assembly: &Path, binary: &Path) -> Result<(), DriverError> {
    info!("linking {} with {linker}", binary.display());

    let output = Command::new(linker)
        .arg("-o")
        .arg(binary)
        .arg(assembly)
        .output()
        .map_err(|source| DriverError::LinkerUnavailable {
            linker: linker.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(DriverError::LinkFailed {
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}
