//! x86-64 backend (AT&T syntax, System V)
//! 
//! Frame layout below `%rbp`:
//! 
//! ```text
//!   -8 .. -256   locals, variable at layout offset o lives at -(o+8)(%rbp)
//! -264 .. -296   saved %rbx %r12 %r13 %r14 %r15
//! ```
//! 
//! The frame is a fixed 304 bytes so `%rsp` stays 16-byte aligned at calls.

mod control_flow;
mod expr;
mod function;

use dmc_codegen::asm::x86_64::{
    Inst, Operand, Reg, ALLOCATABLE_REGISTERS, RETURN_REGISTER,
};
use dmc_codegen::asm::render;
use dmc_codegen::{CodegenError, LabelCounter, Occupant, RegisterPool, ResultLocation, VariableLayout};
use dmc_common::{ConstantTable, SourceLocation};
use dmc_frontend::Program;
use log::info;

use crate::{Backend, Target};

/// Bytes reserved for local variables
pub const LOCALS_SIZE: u32 = 256;

/// Locals plus the callee-saved register area
pub const FRAME_SIZE: i64 = 304;

pub struct X86Generator {
    /// Function text, in emission order
    text: Vec<Inst>,
    /// Pooled string literals
    data: Vec<Inst>,
    /// Nested function bodies waiting for their enclosing function to finish
    deferred: Vec<Inst>,
    /// Buffer of the function currently being lowered
    out: Vec<Inst>,
    layout: VariableLayout,
    pool: RegisterPool<Reg>,
    constants: ConstantTable,
    labels: LabelCounter,
}

impl Default for X86Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl X86Generator {
    pub fn new() -> Self {
        Self {
            text: Vec::new(),
            data: Vec::new(),
            deferred: Vec::new(),
            out: Vec::new(),
            layout: VariableLayout::new(LOCALS_SIZE),
            pool: Self::fresh_pool(),
            constants: ConstantTable::new(),
            labels: LabelCounter::default(),
        }
    }

    fn fresh_pool() -> RegisterPool<Reg> {
        RegisterPool::new(&ALLOCATABLE_REGISTERS, RETURN_REGISTER)
    }

    /// Lowered function text
    pub fn instructions(&self) -> &[Inst] {
        &self.text
    }

    /// Pooled literal data
    pub fn data(&self) -> &[Inst] {
        &self.data
    }

    pub(crate) fn emit(&mut self, inst: Inst) {
        self.out.push(inst);
    }

    /// Stack slot of the variable at layout offset `offset`
    pub(crate) fn slot(offset: u32) -> Operand {
        Operand::Mem {
            base: Reg::Rbp,
            offset: -(offset as i32) - 8,
        }
    }

    pub(crate) fn load_immediate(&mut self, value: i64, dest: Reg) {
        if i32::try_from(value).is_ok() {
            self.emit(Inst::Movq(Operand::Imm(value), Operand::Reg(dest)));
        } else {
            self.emit(Inst::Movabsq(value, dest));
        }
    }

    /// Force a lowered value into a register
    pub(crate) fn materialize(
        &mut self,
        result: ResultLocation<Reg>,
        location: &SourceLocation,
    ) -> Result<Reg, CodegenError> {
        match result {
            ResultLocation::Register(reg) => Ok(reg),
            ResultLocation::Data(label) => {
                let reg = self.pool.allocate(Occupant::Transient)?;
                self.emit(Inst::Leaq(Operand::RipLabel(label), reg));
                Ok(reg)
            }
            ResultLocation::NoValue => Err(CodegenError::unsupported(
                "control-flow expression used as a value",
                location,
            )),
        }
    }

    /// Release `reg` unless it caches a named variable
    pub(crate) fn release_if_temporary(&mut self, reg: Reg) {
        if matches!(
            self.pool.occupant(reg),
            Some(Occupant::Transient) | Some(Occupant::CallReturn)
        ) {
            self.pool.release(reg);
        }
    }

    /// Reserve `count` eight-byte stack cells, keeping 16-byte alignment
    pub(crate) fn push_area(&mut self, count: usize) -> i64 {
        let size = ((count as i64 * 8) + 15) / 16 * 16;
        self.emit(Inst::Subq(Operand::Imm(size), Reg::Rsp));
        size
    }

    pub(crate) fn pop_area(&mut self, size: i64) {
        self.emit(Inst::Addq(Operand::Imm(size), Reg::Rsp));
    }

    pub(crate) fn stack_cell(index: usize) -> Operand {
        Operand::Mem {
            base: Reg::Rsp,
            offset: index as i32 * 8,
        }
    }
}

impl Backend for X86Generator {
    fn target(&self) -> Target {
        Target::X86_64
    }

    fn generate(
        &mut self,
        program: &Program,
        constants: &ConstantTable,
        counter: LabelCounter,
    ) -> Result<LabelCounter, CodegenError> {
        self.constants = constants.clone();
        self.labels = counter;

        for function in &program.functions {
            info!("x86_64: lowering function '{}'", function.name);
            let code = self.lower_function(function).inspect_err(|_| {
                // Nested functions of a failed parent are never emitted
                self.deferred.clear();
            })?;
            self.text.extend(code);
            let nested = std::mem::take(&mut self.deferred);
            self.text.extend(nested);
        }

        Ok(self.labels)
    }

    fn assembly(&self) -> String {
        let mut out = render(&[Inst::Directive(".text".to_string())]);
        out.push_str(&render(&self.text));
        if !self.data.is_empty() {
            out.push_str(&render(&[Inst::Directive(".data".to_string())]));
            out.push_str(&render(&self.data));
        }
        out.push_str(&render(&[Inst::Directive(
            ".section .note.GNU-stack,\"\",@progbits".to_string(),
        )]));
        out
    }
}
