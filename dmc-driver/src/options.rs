//! Driver configuration

use crate::error::DriverError;
use dmc_backend::Target;
use std::path::{Path, PathBuf};

/// Everything one compiler invocation needs, independent of the CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverOptions {
    /// Entry `.dor` file
    pub input: PathBuf,
    pub target: Target,
    /// Name of the linked executable; defaults to the input stem
    pub output: Option<String>,
    pub out_dir: PathBuf,
    /// Directory holding the `dor.*` standard library modules
    pub stdlib_dir: PathBuf,
    /// Stop after writing the concatenated assembly
    pub no_link: bool,
    /// Print each parsed file as JSON
    pub emit_ast: bool,
    pub linker: String,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::from("main.dor"),
            target: Target::default(),
            output: None,
            out_dir: PathBuf::from("out"),
            stdlib_dir: PathBuf::from("builtin"),
            no_link: false,
            emit_ast: false,
            linker: "gcc".to_string(),
        }
    }
}

impl DriverOptions {
    /// Module name of the entry file
    pub fn entry_name(&self) -> Result<String, DriverError> {
        module_name(&self.input)
    }

    /// Directory that plain `@import`s are resolved against
    pub fn base_dir(&self) -> PathBuf {
        match self.input.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// `<out-dir>/<arch>`
    pub fn target_dir(&self) -> PathBuf {
        self.out_dir.join(self.target.name())
    }

    pub fn asm_dir(&self) -> PathBuf {
        self.target_dir().join("asm")
    }

    pub fn binary_path(&self) -> Result<PathBuf, DriverError> {
        let name = match &self.output {
            Some(name) => name.clone(),
            None => self.entry_name()?,
        };
        Ok(self.target_dir().join(name))
    }
}

/// File stem used as the module and assembly file name
pub fn module_name(path: &Path) -> Result<String, DriverError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| DriverError::InvalidInput {
            path: path.to_path_buf(),
        })
}
