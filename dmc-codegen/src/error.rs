//! Code generation errors
//! 
//! Every variant is fatal: generation stops and the error is propagated to
//! the driver. There is no partial output.

use dmc_common::{CompilerError, SourceLocation};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("{location}: undefined variable '{name}'")]
    UndefinedVariable {
        name: String,
        location: SourceLocation,
    },

    #[error("registers exhausted: all {capacity} allocatable registers are live")]
    RegistersExhausted { capacity: usize },

    #[error("stack exhausted: declaring '{name}' exceeds the {limit}-byte local frame")]
    StackExhausted { name: String, limit: u32 },

    #[error("{location}: unsupported construct: {construct}")]
    UnsupportedConstruct {
        construct: String,
        location: SourceLocation,
    },

    #[error("{location}: constant '{name}' has malformed value '{value}'")]
    MalformedConstant {
        name: String,
        value: String,
        location: SourceLocation,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CodegenError {
    pub fn unsupported(construct: impl Into<String>, location: &SourceLocation) -> Self {
        CodegenError::UnsupportedConstruct {
            construct: construct.into(),
            location: location.clone(),
        }
    }
}

impl From<CodegenError> for CompilerError {
    fn from(err: CodegenError) -> Self {
        match err {
            CodegenError::Io { .. } => CompilerError::IoError { message: err.to_string() },
            _ => CompilerError::codegen_error(err.to_string()),
        }
    }
}
