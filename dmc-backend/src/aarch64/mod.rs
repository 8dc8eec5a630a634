//! AArch64 backend (clang / Apple assembler flavour)
//!
//! Frame layout below `x29`:
//!
//! ```text
//!   -8 .. -256   locals, variable at layout offset o lives at [x29, #-(o+8)]
//! -272 .. -336   saved x19 - x28, stored in pairs
//! ```
//!
//! `x29`/`x30` are pushed by the prologue itself, so calls need no
//! caller-side save of the link register.

mod control_flow;
mod expr;
mod function;

use dmc_codegen::asm::aarch64::{Address, Inst, Reg, ALLOCATABLE_REGISTERS, FRAME_POINTER, RETURN_REGISTER};
use dmc_codegen::asm::render;
use dmc_codegen::{CodegenError, LabelCounter, Occupant, RegisterPool, ResultLocation, VariableLayout};
use dmc_common::{ConstantTable, SourceLocation};
use dmc_frontend::Program;
use log::info;

use crate::{Backend, Target};

/// Bytes reserved for local variables
pub const LOCALS_SIZE: u32 = 256;

/// Locals plus the callee-saved pair area
pub const FRAME_SIZE: u32 = 336;

/// Widest immediate a single `mov` encodes
const MOV_IMMEDIATE_RANGE: std::ops::RangeInclusive<i64> = -65536..=65535;

pub struct Aarch64Generator {
    text: Vec<Inst>,
    deferred: Vec<Inst>,
    out: Vec<Inst>,
    layout: VariableLayout,
    pool: RegisterPool<Reg>,
    constants: ConstantTable,
    labels: LabelCounter,
}

impl Default for Aarch64Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aarch64Generator {
    pub fn new() -> Self {
        Self {
            text: Vec::new(),
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

    pub fn instructions(&self) -> &[Inst] {
        &self.text
    }

    pub(crate) fn emit(&mut self, inst: Inst) {
        self.out.push(inst);
    }

    /// Symbol name of a dormouse function
    pub(crate) fn symbol(name: &str) -> String {
        format!("_{name}")
    }

    pub(crate) fn slot(offset: u32) -> Address {
        Address::Offset {
            base: FRAME_POINTER,
            offset: -(offset as i32) - 8,
        }
    }

    pub(crate) fn load_immediate(&mut self, value: i64, dest: Reg) {
        if MOV_IMMEDIATE_RANGE.contains(&value) {
            self.emit(Inst::MovImm(dest, value));
        } else {
            self.emit(Inst::LdrImm(dest, value));
        }
    }

    pub(crate) fn materialize(
        &mut self,
        result: ResultLocation<Reg>,
        location: &SourceLocation,
    ) -> Result<Reg, CodegenError> {
        match result {
            ResultLocation::Register(reg) => Ok(reg),
            ResultLocation::Data(_) => Err(CodegenError::unsupported("string literal", location)),
            ResultLocation::NoValue => Err(CodegenError::unsupported(
                "control-flow expression used as a value",
                location,
            )),
        }
    }

    pub(crate) fn release_if_temporary(&mut self, reg: Reg) {
        if matches!(
            self.pool.occupant(reg),
            Some(Occupant::Transient) | Some(Occupant::CallReturn)
        ) {
            self.pool.release(reg);
        }
    }

    /// Push one register in its own 16-byte cell
    pub(crate) fn push(&mut self, reg: Reg) {
        self.emit(Inst::Str(reg, Address::PreIndex { base: Reg::Sp, offset: -16 }));
    }

    pub(crate) fn pop(&mut self, reg: Reg) {
        self.emit(Inst::Ldr(reg, Address::PostIndex { base: Reg::Sp, offset: 16 }));
    }
}

impl Backend for Aarch64Generator {
    fn target(&self) -> Target {
        Target::Aarch64
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
            info!("aarch64: lowering function '{}'", function.name);
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
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmc_frontend::Frontend;
    use pretty_assertions::assert_eq;

    fn lines(source: &str) -> Result<Vec<String>, CodegenError> {
        let program = Frontend::parse_source(source, "test.dor").unwrap();
        let mut generator = Aarch64Generator::new();
        generator.generate(&program, &ConstantTable::new(), LabelCounter::default())?;
        Ok(generator.instructions().iter().map(|inst| inst.to_string()).collect())
    }

    #[test]
    fn test_main_prologue() {
        let lines = lines("int main() {\n    return 7\n}\n").unwrap();
        assert_eq!(
            &lines[..9],
            &[
                ".globl _main",
                ".p2align 2",
                "_main:",
                "stp x29, x30, [sp, #-16]!",
                "mov x29, sp",
                "sub sp, sp, #336",
                "stp x19, x20, [x29, #-336]",
                "stp x21, x22, [x29, #-320]",
                "stp x23, x24, [x29, #-304]",
            ]
        );
        assert!(lines.contains(&"mov x0, #7".to_string()));
        assert_eq!(
            &lines[lines.len() - 3..],
            &["mov sp, x29", "ldp x29, x30, [sp], #16", "ret"]
        );
    }

    #[test]
    fn test_locals_use_unscaled_access() {
        let lines = lines("int main() {\n    int x = 4\n    return x\n}\n").unwrap();
        assert!(lines.contains(&"stur x0, [x29, #-8]".to_string()));
        assert!(lines.contains(&"ldur x0, [x29, #-8]".to_string()));
    }

    #[test]
    fn test_wide_immediate_uses_literal_pool() {
        let lines = lines("int main() {\n    return 70000\n}\n").unwrap();
        assert!(lines.contains(&"ldr x0, =70000".to_string()));
        let lines = self::lines("int main() {\n    return 65535\n}\n").unwrap();
        assert!(lines.contains(&"mov x0, #65535".to_string()));
    }

    #[test]
    fn test_condition_uses_cset_and_tbnz() {
        let source = "int main() {\n    int i = 0\n    while (i < 3) {\n        i = i + 1\n    }\n    return i\n}\n";
        let lines = lines(source).unwrap();

        let tbnz = lines.iter().position(|l| l == "tbnz x8, #0, while0_body").unwrap();
        assert_eq!(lines[tbnz - 1], "cset x8, lt");
        assert!(lines[tbnz - 2].starts_with("cmp "));
        assert_eq!(lines[tbnz + 1], "b while0_end");
        assert!(lines.contains(&"b while0_compare".to_string()));
    }

    #[test]
    fn test_calls_use_underscore_symbols() {
        let source = "int one() {\n    return 1\n}\nint main() {\n    return one()\n}\n";
        let lines = lines(source).unwrap();
        assert!(lines.contains(&"_one:".to_string()));
        assert!(lines.contains(&"bl _one".to_string()));
        assert_eq!(lines.iter().filter(|l| *l == ".globl _main").count(), 1);
    }

    #[test]
    fn test_modulo_uses_msub() {
        let lines = lines("int main() {\n    return 7 % 3\n}\n").unwrap();
        let msub = lines.iter().position(|l| l.starts_with("msub")).unwrap();
        assert!(lines[msub - 1].starts_with("sdiv x8, "));
    }

    #[test]
    fn test_string_literal_is_unsupported() {
        let err = lines("int main() {\n    string s = \"hi\"\n    return 0\n}\n").unwrap_err();
        assert!(matches!(err, CodegenError::UnsupportedConstruct { .. }));
    }

    #[test]
    fn test_assembly_header() {
        let program = Frontend::parse_source("int main() {\n    return 0\n}\n", "test.dor").unwrap();
        let mut generator = Aarch64Generator::new();
        generator
            .generate(&program, &ConstantTable::new(), LabelCounter::default())
            .unwrap();
        let text = generator.assembly();
        assert!(text.starts_with("\t.text\n"));
        assert!(text.contains("_main:\n"));
        assert!(!text.contains(".data"));
    }
}
