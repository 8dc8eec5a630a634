//! Dormouse Compiler - Backend
//! 
//! Lowers a parsed `Program` into assembly text for one target. Both targets
//! implement the same `Backend` contract so the driver can pick one from a
//! single configuration value:
//! 
//! - `generate` lowers every function, threading the label counter through
//! - `write` stores the accumulated assembly (and pooled data) to a file

pub mod aarch64;
pub mod x86_64;

pub use aarch64::Aarch64Generator;
pub use x86_64::X86Generator;

use dmc_codegen::{CodegenError, LabelCounter};
use dmc_common::ConstantTable;
use dmc_frontend::Program;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Supported target architectures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Target {
    /// x86-64, AT&T syntax, System V calling convention
    #[default]
    X86_64,
    /// AArch64 for clang / Apple toolchains
    Aarch64,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::X86_64, Target::Aarch64];

    pub fn name(&self) -> &'static str {
        match self {
            Target::X86_64 => "x86_64",
            Target::Aarch64 => "aarch64",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown target '{0}' (expected x86_64 or aarch64)")]
pub struct UnknownTarget(pub String);

impl FromStr for Target {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86_64" | "x86-64" | "amd64" => Ok(Target::X86_64),
            "aarch64" | "arm64" => Ok(Target::Aarch64),
            other => Err(UnknownTarget(other.to_string())),
        }
    }
}

/// Shared contract of every architecture backend
pub trait Backend {
    fn target(&self) -> Target;

    /// Lower every function of `program`, starting label numbering at
    /// `counter`; returns the counter to hand to the next file.
    fn generate(
        &mut self,
        program: &Program,
        constants: &ConstantTable,
        counter: LabelCounter,
    ) -> Result<LabelCounter, CodegenError>;

    /// The complete assembly text produced so far
    fn assembly(&self) -> String;

    fn write(&self, path: &Path) -> Result<(), CodegenError> {
        std::fs::write(path, self.assembly()).map_err(|source| CodegenError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Create a fresh backend for `target`
pub fn create_backend(target: Target) -> Box<dyn Backend> {
    match target {
        Target::X86_64 => Box::new(X86Generator::new()),
        Target::Aarch64 => Box::new(Aarch64Generator::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmc_frontend::Frontend;

    #[test]
    fn test_target_parsing() {
        assert_eq!("x86_64".parse::<Target>(), Ok(Target::X86_64));
        assert_eq!("arm64".parse::<Target>(), Ok(Target::Aarch64));
        assert!("riscv".parse::<Target>().is_err());
        assert_eq!(Target::Aarch64.to_string(), "aarch64");
    }

    #[test]
    fn test_write_creates_file() {
        let program = Frontend::parse_source("int main() {\n    return 0\n}\n", "main.dor").unwrap();
        let dir = tempfile::tempdir().unwrap();

        for target in Target::ALL {
            let mut backend = create_backend(target);
            assert_eq!(backend.target(), target);
            backend
                .generate(&program, &ConstantTable::new(), LabelCounter::default())
                .unwrap();

            let path = dir.path().join(format!("main.{target}.s"));
            backend.write(&path).unwrap();
            let written = std::fs::read_to_string(&path).unwrap();
            assert_eq!(written, backend.assembly());
        }
    }

    #[test]
    fn test_write_failure_is_reported() {
        let backend = create_backend(Target::X86_64);
        let err = backend
            .write(Path::new("/nonexistent-dir/definitely/missing/out.s"))
            .unwrap_err();
        assert!(matches!(err, CodegenError::Io { .. }));
    }
}
