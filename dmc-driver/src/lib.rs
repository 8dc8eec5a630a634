//! Dormouse Compiler - Driver
//!
//! Turns an entry `.dor` file into an executable: resolves `@import`s,
//! merges `@define`s, lowers every file with the selected backend while
//! threading the label counter, concatenates the assembly and links it.

pub mod error;
pub mod imports;
pub mod options;
pub mod pipeline;

pub use error::DriverError;
pub use imports::{CompilationUnit, ImportResolver, SourceFile};
pub use options::DriverOptions;
pub use pipeline::{compile, CompileOutcome};
