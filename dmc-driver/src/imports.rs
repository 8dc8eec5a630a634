//! Import resolution and standard library loading
//!
//! Starting from the entry file every reachable module is lexed once, in
//! depth-first discovery order. `@define`s from all files land in a single
//! constant table shared by every backend invocation.

use crate::error::DriverError;
use crate::options::module_name;
use dmc_common::ConstantTable;
use dmc_frontend::{Frontend, Token};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Import prefix selecting the standard library directory
pub const STDLIB_PREFIX: &str = "dor.";

/// A lexed source file waiting to be parsed
#[derive(Debug)]
pub struct SourceFile {
    /// Module name, also the stem of its assembly file. Standard library
    /// modules keep their `dor.` prefix so they never share a file with a
    /// local module of the same name.
    pub name: String,
    pub path: PathBuf,
    pub tokens: Vec<Token>,
}

/// Every file of one program plus the merged constants
#[derive(Debug, Default)]
pub struct CompilationUnit {
    pub files: Vec<SourceFile>,
    pub constants: ConstantTable,
}

pub struct ImportResolver {
    base_dir: PathBuf,
    stdlib_dir: PathBuf,
    visited: HashSet<PathBuf>,
    unit: CompilationUnit,
}

impl ImportResolver {
    pub fn new(base_dir: impl Into<PathBuf>, stdlib_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            stdlib_dir: stdlib_dir.into(),
            visited: HashSet::new(),
            unit: CompilationUnit::default(),
        }
    }

    /// Collect the entry file and everything it imports
    pub fn resolve(mut self, entry: &Path) -> Result<CompilationUnit, DriverError> {
        let name = module_name(entry)?;
        self.visit(&name, entry.to_path_buf())?;
        info!(
            "resolved {} file(s), {} constant(s)",
            self.unit.files.len(),
            self.unit.constants.len()
        );
        Ok(self.unit)
    }

    /// Where `@import name` is loaded from
    pub fn module_path(&self, import: &str) -> PathBuf {
        match import.strip_prefix(STDLIB_PREFIX) {
            Some(module) => self.stdlib_dir.join(format!("{module}.dor")),
            None => self.base_dir.join(format!("{import}.dor")),
        }
    }

    fn visit(&mut self, name: &str, path: PathBuf) -> Result<(), DriverError> {
        let key = path.canonicalize().unwrap_or_else(|_| path.clone());
        if !self.visited.insert(key) {
            debug!("'{name}' already loaded from {}", path.display());
            return Ok(());
        }

        let source = std::fs::read_to_string(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => DriverError::ImportNotFound {
                name: name.to_string(),
                path: path.clone(),
            },
            _ => DriverError::Read {
                path: path.clone(),
                source,
            },
        })?;

        let lexed = Frontend::tokenize_source(&source, &path.to_string_lossy())?;
        debug!(
            "lexed {}: {} token(s), {} import(s), {} define(s)",
            path.display(),
            lexed.tokens.len(),
            lexed.imports.len(),
            lexed.defines.len()
        );

        for define in &lexed.defines {
            if let Some(previous) = self.unit.constants.define(&define.name, &define.value) {
                warn!(
                    "{}: '{}' was already defined as '{}', overwriting with '{}'",
                    define.location, define.name, previous, define.value
                );
            }
        }

        self.unit.files.push(SourceFile {
            name: name.to_string(),
            path,
            tokens: lexed.tokens,
        });

        for import in &lexed.imports {
            let path = self.module_path(&import.name);
            self.visit(&import.name, path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_resolves_imports_depth_first() {
        let dir = tempfile::tempdir().unwrap();
        let stdlib = dir.path().join("builtin");
        fs::create_dir(&stdlib).unwrap();

        let entry = write(
            dir.path(),
            "main.dor",
            "@import util\n@import dor.math\nint main() {\n    return 0\n}\n",
        );
        write(dir.path(), "util.dor", "@import helper\nint util() {\n    return 1\n}\n");
        write(dir.path(), "helper.dor", "int helper() {\n    return 2\n}\n");
        write(&stdlib, "math.dor", "int square(int x) {\n    return x * x\n}\n");

        let unit = ImportResolver::new(dir.path(), &stdlib).resolve(&entry).unwrap();
        let names: Vec<&str> = unit.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["main", "util", "helper", "dor.math"]);
        assert_eq!(unit.files[3].path, stdlib.join("math.dor"));
    }

    #[test]
    fn test_local_and_stdlib_modules_with_one_name_stay_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let stdlib = dir.path().join("builtin");
        fs::create_dir(&stdlib).unwrap();

        let entry = write(
            dir.path(),
            "main.dor",
            "@import math\n@import dor.math\nint main() {\n    return 0\n}\n",
        );
        write(dir.path(), "math.dor", "int mine() {\n    return 1\n}\n");
        write(&stdlib, "math.dor", "int square(int x) {\n    return x * x\n}\n");

        let unit = ImportResolver::new(dir.path(), &stdlib).resolve(&entry).unwrap();
        let files: Vec<(&str, &Path)> = unit
            .files
            .iter()
            .map(|f| (f.name.as_str(), f.path.as_path()))
            .collect();
        let local = dir.path().join("math.dor");
        let library = stdlib.join("math.dor");
        assert_eq!(
            files,
            vec![
                ("main", entry.as_path()),
                ("math", local.as_path()),
                ("dor.math", library.as_path()),
            ]
        );
    }

    #[test]
    fn test_import_cycles_visit_each_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write(dir.path(), "a.dor", "@import b\nint main() {\n    return 0\n}\n");
        write(dir.path(), "b.dor", "@import a\n@import b\nint b() {\n    return 0\n}\n");

        let unit = ImportResolver::new(dir.path(), dir.path()).resolve(&entry).unwrap();
        assert_eq!(unit.files.len(), 2);
    }

    #[test]
    fn test_defines_merge_and_later_ones_win() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write(
            dir.path(),
            "main.dor",
            "@define SIZE 4\n@define MODE 1\n@import other\nint main() {\n    return SIZE\n}\n",
        );
        write(dir.path(), "other.dor", "@define SIZE 8\n");

        let unit = ImportResolver::new(dir.path(), dir.path()).resolve(&entry).unwrap();
        assert_eq!(unit.constants.get("SIZE"), Some("8"));
        assert_eq!(unit.constants.get("MODE"), Some("1"));
        assert_eq!(unit.constants.len(), 2);
    }

    #[test]
    fn test_missing_import_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write(dir.path(), "main.dor", "@import dor.nothing\n");
        let stdlib = dir.path().join("lib");

        let err = ImportResolver::new(dir.path(), &stdlib).resolve(&entry).unwrap_err();
        match err {
            DriverError::ImportNotFound { name, path } => {
                assert_eq!(name, "dor.nothing");
                assert_eq!(path, stdlib.join("nothing.dor"));
            }
            other => panic!("expected ImportNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_lex_errors_propagate() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write(dir.path(), "main.dor", "@bogus thing\n");
        let err = ImportResolver::new(dir.path(), dir.path()).resolve(&entry).unwrap_err();
        assert!(matches!(err, DriverError::Compiler(_)));
    }
}
