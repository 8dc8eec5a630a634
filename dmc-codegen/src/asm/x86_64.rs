//! x86-64 register model and AT&T-syntax instructions

use super::{escape_asciz, AsmLine};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reg {
    Rax, Rbx, Rcx, Rdx, Rsi, Rdi, Rbp, Rsp,
    R8, R9, R10, R11, R12, R13, R14, R15,
}

/// Allocation order of the register pool
pub const ALLOCATABLE_REGISTERS: [Reg; 13] = [
    Reg::Rax, Reg::Rbx, Reg::Rcx, Reg::Rdx, Reg::Rsi, Reg::Rdi,
    Reg::R8, Reg::R9, Reg::R10, Reg::R12, Reg::R13, Reg::R14, Reg::R15,
];

/// System V integer argument registers, in ordinal order
pub const PARAMETER_REGISTERS: [Reg; 6] = [Reg::Rdi, Reg::Rsi, Reg::Rdx, Reg::Rcx, Reg::R8, Reg::R9];

/// Pool registers the callee must preserve
pub const CALLEE_SAVED_REGISTERS: [Reg; 5] = [Reg::Rbx, Reg::R12, Reg::R13, Reg::R14, Reg::R15];

pub const RETURN_REGISTER: Reg = Reg::Rax;

/// Never allocated; used for division, flag materialisation and operand shuffles
pub const SCRATCH_REGISTER: Reg = Reg::R11;

impl Reg {
    pub fn name(&self) -> &'static str {
        match self {
            Reg::Rax => "rax",
            Reg::Rbx => "rbx",
            Reg::Rcx => "rcx",
            Reg::Rdx => "rdx",
            Reg::Rsi => "rsi",
            Reg::Rdi => "rdi",
            Reg::Rbp => "rbp",
            Reg::Rsp => "rsp",
            Reg::R8 => "r8",
            Reg::R9 => "r9",
            Reg::R10 => "r10",
            Reg::R11 => "r11",
            Reg::R12 => "r12",
            Reg::R13 => "r13",
            Reg::R14 => "r14",
            Reg::R15 => "r15",
        }
    }

    /// Name of the low byte sub-register
    pub fn byte_name(&self) -> &'static str {
        match self {
            Reg::Rax => "al",
            Reg::Rbx => "bl",
            Reg::Rcx => "cl",
            Reg::Rdx => "dl",
            Reg::Rsi => "sil",
            Reg::Rdi => "dil",
            Reg::Rbp => "bpl",
            Reg::Rsp => "spl",
            Reg::R8 => "r8b",
            Reg::R9 => "r9b",
            Reg::R10 => "r10b",
            Reg::R11 => "r11b",
            Reg::R12 => "r12b",
            Reg::R13 => "r13b",
            Reg::R14 => "r14b",
            Reg::R15 => "r15b",
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Reg(Reg),
    Imm(i64),
    /// `offset(%base)`
    Mem { base: Reg, offset: i32 },
    /// `label(%rip)`
    RipLabel(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{reg}"),
            Operand::Imm(value) => write!(f, "${value}"),
            Operand::Mem { base, offset: 0 } => write!(f, "({base})"),
            Operand::Mem { base, offset } => write!(f, "{offset}({base})"),
            Operand::RipLabel(label) => write!(f, "{label}(%rip)"),
        }
    }
}

/// Condition codes used by `j<cc>` and `set<cc>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cond {
    E, Ne, L, G, Le, Ge,
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self {
            Cond::E => "e",
            Cond::Ne => "ne",
            Cond::L => "l",
            Cond::G => "g",
            Cond::Le => "le",
            Cond::Ge => "ge",
        };
        write!(f, "{suffix}")
    }
}

/// AT&T syntax: source operand first, destination last
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inst {
    // Data movement
    Movq(Operand, Operand),
    Movabsq(i64, Reg),
    Leaq(Operand, Reg),
    Pushq(Reg),
    Popq(Reg),

    // Arithmetic and logic, `dst = dst op src`
    Addq(Operand, Reg),
    Subq(Operand, Reg),
    Imulq(Operand, Reg),
    Andq(Operand, Reg),
    Orq(Operand, Reg),
    Xorq(Operand, Reg),
    Negq(Reg),
    Notq(Reg),
    /// Sign extend %rax into %rdx:%rax
    Cqto,
    /// Signed divide %rdx:%rax by the operand
    Idivq(Reg),

    // Comparison, flags from `rhs - lhs` as `cmpq lhs, rhs`
    Cmpq(Operand, Reg),
    Set(Cond, Reg),
    /// Zero extend the low byte of the first register into the second
    Movzbq(Reg, Reg),

    // Control flow
    Jmp(String),
    Jcc(Cond, String),
    Call(String),
    Ret,

    // Assembler pseudo-instructions
    Label(String),
    Directive(String),
    Asciz(String),
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inst::Movq(src, dst) => write!(f, "movq {src}, {dst}"),
            Inst::Movabsq(value, dst) => write!(f, "movabsq ${value}, {dst}"),
            Inst::Leaq(src, dst) => write!(f, "leaq {src}, {dst}"),
            Inst::Pushq(reg) => write!(f, "pushq {reg}"),
            Inst::Popq(reg) => write!(f, "popq {reg}"),

            Inst::Addq(src, dst) => write!(f, "addq {src}, {dst}"),
            Inst::Subq(src, dst) => write!(f, "subq {src}, {dst}"),
            Inst::Imulq(src, dst) => write!(f, "imulq {src}, {dst}"),
            Inst::Andq(src, dst) => write!(f, "andq {src}, {dst}"),
            Inst::Orq(src, dst) => write!(f, "orq {src}, {dst}"),
            Inst::Xorq(src, dst) => write!(f, "xorq {src}, {dst}"),
            Inst::Negq(reg) => write!(f, "negq {reg}"),
            Inst::Notq(reg) => write!(f, "notq {reg}"),
            Inst::Cqto => write!(f, "cqto"),
            Inst::Idivq(reg) => write!(f, "idivq {reg}"),

            Inst::Cmpq(lhs, rhs) => write!(f, "cmpq {lhs}, {rhs}"),
            Inst::Set(cond, reg) => write!(f, "set{cond} %{}", reg.byte_name()),
            Inst::Movzbq(src, dst) => write!(f, "movzbq %{}, {dst}", src.byte_name()),

            Inst::Jmp(label) => write!(f, "jmp {label}"),
            Inst::Jcc(cond, label) => write!(f, "j{cond} {label}"),
            Inst::Call(label) => write!(f, "call {label}"),
            Inst::Ret => write!(f, "ret"),

            Inst::Label(label) => write!(f, "{label}:"),
            Inst::Directive(text) => write!(f, "{text}"),
            Inst::Asciz(value) => write!(f, ".asciz {}", escape_asciz(value)),
        }
    }
}

impl AsmLine for Inst {
    fn is_label(&self) -> bool {
        matches!(self, Inst::Label(_))
    }
}
