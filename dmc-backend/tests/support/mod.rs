//! Shared helpers for the backend scenario tests.
//!
//! Generated instruction lists are executed on small interpreters so the
//! tests check what the code computes, not only how it is spelled.
#![allow(dead_code)]

pub mod arm;
pub mod x86;

use dmc_backend::{Aarch64Generator, Backend, X86Generator};
use dmc_codegen::{CodegenError, LabelCounter};
use dmc_common::ConstantTable;
use dmc_frontend::Frontend;

/// Stack pointer value at program entry
pub const STACK_TOP: i64 = 0x10_0000;

/// Return address handed to the entry function
pub const EXIT_ADDRESS: i64 = -1;

pub const STEP_LIMIT: usize = 1_000_000;

/// Written into every caller-saved register when a call returns
pub const CLOBBERED: i64 = 0x0dea_dbee_f000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub function: String,
    /// Parameter registers at the moment of the call
    pub registers: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub value: i64,
    pub calls: Vec<CallRecord>,
}

pub fn generate_x86(source: &str, constants: &ConstantTable) -> Result<X86Generator, CodegenError> {
    let program = Frontend::parse_source(source, "test.dor").expect("test source parses");
    let mut generator = X86Generator::new();
    generator.generate(&program, constants, LabelCounter::default())?;
    Ok(generator)
}

pub fn generate_arm(source: &str, constants: &ConstantTable) -> Result<Aarch64Generator, CodegenError> {
    let program = Frontend::parse_source(source, "test.dor").expect("test source parses");
    let mut generator = Aarch64Generator::new();
    generator.generate(&program, constants, LabelCounter::default())?;
    Ok(generator)
}

pub fn run_x86_with(source: &str, constants: &ConstantTable) -> Run {
    let generator = generate_x86(source, constants).expect("x86_64 generation succeeds");
    x86::execute(generator.instructions(), "main")
        .unwrap_or_else(|err| panic!("x86_64 execution failed: {err}\n{}", generator.assembly()))
}

pub fn run_arm_with(source: &str, constants: &ConstantTable) -> Run {
    let generator = generate_arm(source, constants).expect("aarch64 generation succeeds");
    arm::execute(generator.instructions(), "_main")
        .unwrap_or_else(|err| panic!("aarch64 execution failed: {err}\n{}", generator.assembly()))
}

pub fn run_x86(source: &str) -> Run {
    run_x86_with(source, &ConstantTable::new())
}

pub fn run_arm(source: &str) -> Run {
    run_arm_with(source, &ConstantTable::new())
}

/// Run `source` on both targets and check `main`'s return value
pub fn assert_returns(source: &str, expected: i64) {
    assert_eq!(run_x86(source).value, expected, "x86_64 result of:\n{source}");
    assert_eq!(run_arm(source).value, expected, "aarch64 result of:\n{source}");
}

/// Error produced by both targets for `source`
pub fn errors_of(source: &str, constants: &ConstantTable) -> (CodegenError, CodegenError) {
    let x86 = generate_x86(source, constants).err().expect("x86_64 generation fails");
    let arm = generate_arm(source, constants).err().expect("aarch64 generation fails");
    (x86, arm)
}
