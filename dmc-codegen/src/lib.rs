//! Dormouse Compiler - Code Generation Support
//! 
//! The target-independent machinery both backends are built from:
//! 
//! - Typed instruction and register models for x86-64 and AArch64
//! - The per-function variable layout table
//! - The virtual register pool
//! - Label/condition counter and control-flow label naming
//! - Compile-time constant resolution
//! - The fatal error taxonomy of code generation

pub mod asm;
pub mod constants;
pub mod error;
pub mod labels;
pub mod layout;
pub mod regpool;

pub use constants::resolve_constant;
pub use error::CodegenError;
pub use labels::{IfLabels, LabelCounter, WhileLabels};
pub use layout::VariableLayout;
pub use regpool::{Occupant, RegisterPool};

/// Where the value of a lowered expression ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultLocation<R> {
    /// The value is resident in this register
    Register(R),
    /// The value is pooled data referenced by this label
    Data(String),
    /// The expression produced no usable value
    NoValue,
}
