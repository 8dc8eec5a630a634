//! AArch64 register model and instructions

use super::AsmLine;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reg {
    /// General purpose register x0 - x30
    X(u8),
    Sp,
}

pub const FRAME_POINTER: Reg = Reg::X(29);
pub const LINK_REGISTER: Reg = Reg::X(30);
pub const RETURN_REGISTER: Reg = Reg::X(0);

/// Holds `cset` results for condition tests; never allocated
pub const SCRATCH_REGISTER: Reg = Reg::X(8);

/// Allocation order of the register pool. x8 is the scratch register,
/// x16-x18 belong to the platform, x29/x30 are the frame and link registers.
pub const ALLOCATABLE_REGISTERS: [Reg; 25] = [
    Reg::X(0), Reg::X(1), Reg::X(2), Reg::X(3), Reg::X(4), Reg::X(5), Reg::X(6), Reg::X(7),
    Reg::X(9), Reg::X(10), Reg::X(11), Reg::X(12), Reg::X(13), Reg::X(14), Reg::X(15),
    Reg::X(19), Reg::X(20), Reg::X(21), Reg::X(22), Reg::X(23),
    Reg::X(24), Reg::X(25), Reg::X(26), Reg::X(27), Reg::X(28),
];

pub const PARAMETER_REGISTERS: [Reg; 8] = [
    Reg::X(0), Reg::X(1), Reg::X(2), Reg::X(3), Reg::X(4), Reg::X(5), Reg::X(6), Reg::X(7),
];

/// Pool registers the callee must preserve, saved in pairs
pub const CALLEE_SAVED_REGISTERS: [Reg; 10] = [
    Reg::X(19), Reg::X(20), Reg::X(21), Reg::X(22), Reg::X(23),
    Reg::X(24), Reg::X(25), Reg::X(26), Reg::X(27), Reg::X(28),
];

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reg::X(n) => write!(f, "x{n}"),
            Reg::Sp => write!(f, "sp"),
        }
    }
}

/// Memory addressing modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    /// `[base, #offset]`
    Offset { base: Reg, offset: i32 },
    /// `[base, #offset]!`, base updated before the access
    PreIndex { base: Reg, offset: i32 },
    /// `[base], #offset`, base updated after the access
    PostIndex { base: Reg, offset: i32 },
}

impl Address {
    /// Negative plain offsets need the unscaled `stur`/`ldur` forms
    fn is_unscaled(&self) -> bool {
        matches!(self, Address::Offset { offset, .. } if *offset < 0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Offset { base, offset: 0 } => write!(f, "[{base}]"),
            Address::Offset { base, offset } => write!(f, "[{base}, #{offset}]"),
            Address::PreIndex { base, offset } => write!(f, "[{base}, #{offset}]!"),
            Address::PostIndex { base, offset } => write!(f, "[{base}], #{offset}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cond {
    Eq, Ne, Lt, Gt, Le, Ge,
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Cond::Eq => "eq",
            Cond::Ne => "ne",
            Cond::Lt => "lt",
            Cond::Gt => "gt",
            Cond::Le => "le",
            Cond::Ge => "ge",
        };
        write!(f, "{name}")
    }
}

/// Destination register first
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inst {
    // Data movement
    Mov(Reg, Reg),
    MovImm(Reg, i64),
    /// `ldr xd, =imm` literal pool load for wide immediates
    LdrImm(Reg, i64),
    Ldr(Reg, Address),
    Str(Reg, Address),
    Ldp(Reg, Reg, Address),
    Stp(Reg, Reg, Address),

    // Arithmetic and logic
    Add(Reg, Reg, Reg),
    Sub(Reg, Reg, Reg),
    SubImm(Reg, Reg, u32),
    Mul(Reg, Reg, Reg),
    Sdiv(Reg, Reg, Reg),
    /// `d = a - n * m` as `msub d, n, m, a`
    Msub(Reg, Reg, Reg, Reg),
    And(Reg, Reg, Reg),
    Orr(Reg, Reg, Reg),
    Eor(Reg, Reg, Reg),
    Neg(Reg, Reg),
    Mvn(Reg, Reg),

    // Comparison
    Cmp(Reg, Reg),
    Cset(Reg, Cond),
    /// Branch if bit is set
    Tbnz(Reg, u8, String),

    // Control flow
    B(String),
    Bl(String),
    Ret,

    // Assembler pseudo-instructions
    Label(String),
    Directive(String),
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inst::Mov(rd, rs) => write!(f, "mov {rd}, {rs}"),
            Inst::MovImm(rd, imm) => write!(f, "mov {rd}, #{imm}"),
            Inst::LdrImm(rd, imm) => write!(f, "ldr {rd}, ={imm}"),
            Inst::Ldr(rt, addr) if addr.is_unscaled() => write!(f, "ldur {rt}, {addr}"),
            Inst::Ldr(rt, addr) => write!(f, "ldr {rt}, {addr}"),
            Inst::Str(rt, addr) if addr.is_unscaled() => write!(f, "stur {rt}, {addr}"),
            Inst::Str(rt, addr) => write!(f, "str {rt}, {addr}"),
            Inst::Ldp(r1, r2, addr) => write!(f, "ldp {r1}, {r2}, {addr}"),
            Inst::Stp(r1, r2, addr) => write!(f, "stp {r1}, {r2}, {addr}"),

            Inst::Add(rd, rn, rm) => write!(f, "add {rd}, {rn}, {rm}"),
            Inst::Sub(rd, rn, rm) => write!(f, "sub {rd}, {rn}, {rm}"),
            Inst::SubImm(rd, rn, imm) => write!(f, "sub {rd}, {rn}, #{imm}"),
            Inst::Mul(rd, rn, rm) => write!(f, "mul {rd}, {rn}, {rm}"),
            Inst::Sdiv(rd, rn, rm) => write!(f, "sdiv {rd}, {rn}, {rm}"),
            Inst::Msub(rd, rn, rm, ra) => write!(f, "msub {rd}, {rn}, {rm}, {ra}"),
            Inst::And(rd, rn, rm) => write!(f, "and {rd}, {rn}, {rm}"),
            Inst::Orr(rd, rn, rm) => write!(f, "orr {rd}, {rn}, {rm}"),
            Inst::Eor(rd, rn, rm) => write!(f, "eor {rd}, {rn}, {rm}"),
            Inst::Neg(rd, rs) => write!(f, "neg {rd}, {rs}"),
            Inst::Mvn(rd, rs) => write!(f, "mvn {rd}, {rs}"),

            Inst::Cmp(rn, rm) => write!(f, "cmp {rn}, {rm}"),
            Inst::Cset(rd, cond) => write!(f, "cset {rd}, {cond}"),
            Inst::Tbnz(rt, bit, label) => write!(f, "tbnz {rt}, #{bit}, {label}"),

            Inst::B(label) => write!(f, "b {label}"),
            Inst::Bl(label) => write!(f, "bl {label}"),
            Inst::Ret => write!(f, "ret"),

            Inst::Label(label) => write!(f, "{label}:"),
            Inst::Directive(text) => write!(f, "{text}"),
        }
    }
}

impl AsmLine for Inst {
    fn is_label(&self) -> bool {
        matches!(self, Inst::Label(_))
    }
}
