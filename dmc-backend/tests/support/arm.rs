//! Interpreter for generated AArch64 instruction lists

use super::{CallRecord, Run, CLOBBERED, EXIT_ADDRESS, STACK_TOP, STEP_LIMIT};
use dmc_codegen::asm::aarch64::{
    Address, Cond, Inst, Reg, CALLEE_SAVED_REGISTERS, FRAME_POINTER, LINK_REGISTER, PARAMETER_REGISTERS,
};
use std::collections::HashMap;

struct Machine<'a> {
    code: &'a [Inst],
    labels: HashMap<&'a str, usize>,
    registers: HashMap<Reg, i64>,
    memory: HashMap<i64, i64>,
    /// Operands of the last `cmp`
    flags: (i64, i64),
    calls: Vec<CallRecord>,
}

impl<'a> Machine<'a> {
    fn new(code: &'a [Inst]) -> Self {
        let labels = code
            .iter()
            .enumerate()
            .filter_map(|(i, inst)| match inst {
                Inst::Label(name) => Some((name.as_str(), i)),
                _ => None,
            })
            .collect();

        Self {
            code,
            labels,
            registers: HashMap::new(),
            memory: HashMap::new(),
            flags: (0, 0),
            calls: Vec::new(),
        }
    }

    fn get(&self, reg: Reg) -> i64 {
        self.registers.get(&reg).copied().unwrap_or(0)
    }

    fn set(&mut self, reg: Reg, value: i64) {
        self.registers.insert(reg, value);
    }

    fn load(&self, address: i64) -> Result<i64, String> {
        self.memory
            .get(&address)
            .copied()
            .ok_or_else(|| format!("read of uninitialised memory at {address:#x}"))
    }

    /// Effective address, applying any base register writeback
    fn resolve(&mut self, address: Address) -> i64 {
        match address {
            Address::Offset { base, offset } => self.get(base) + i64::from(offset),
            Address::PreIndex { base, offset } => {
                let value = self.get(base) + i64::from(offset);
                self.set(base, value);
                value
            }
            Address::PostIndex { base, offset } => {
                let value = self.get(base);
                self.set(base, value + i64::from(offset));
                value
            }
        }
    }

    fn holds(&self, cond: Cond) -> bool {
        let (a, b) = self.flags;
        match cond {
            Cond::Eq => a == b,
            Cond::Ne => a != b,
            Cond::Lt => a < b,
            Cond::Gt => a > b,
            Cond::Le => a <= b,
            Cond::Ge => a >= b,
        }
    }

    fn target(&self, label: &str) -> Result<usize, String> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| format!("branch to unknown label '{label}'"))
    }

    fn binary(&mut self, rd: Reg, rn: Reg, rm: Reg, f: impl Fn(i64, i64) -> i64) {
        let value = f(self.get(rn), self.get(rm));
        self.set(rd, value);
    }

    fn run(&mut self, entry: &str) -> Result<i64, String> {
        let code = self.code;
        let mut pc = self.target(entry)?;
        for _ in 0..STEP_LIMIT {
            let inst = code
                .get(pc)
                .ok_or_else(|| format!("fell off the end of the code at {pc}"))?;
            pc += 1;

            match inst {
                Inst::Mov(rd, rs) => self.set(*rd, self.get(*rs)),
                Inst::MovImm(rd, value) | Inst::LdrImm(rd, value) => self.set(*rd, *value),
                Inst::Ldr(rt, address) => {
                    let at = self.resolve(*address);
                    let value = self.load(at)?;
                    self.set(*rt, value);
                }
                Inst::Str(rt, address) => {
                    let value = self.get(*rt);
                    let at = self.resolve(*address);
                    self.memory.insert(at, value);
                }
                Inst::Ldp(r1, r2, address) => {
                    let at = self.resolve(*address);
                    let first = self.load(at)?;
                    let second = self.load(at + 8)?;
                    self.set(*r1, first);
                    self.set(*r2, second);
                }
                Inst::Stp(r1, r2, address) => {
                    let (first, second) = (self.get(*r1), self.get(*r2));
                    let at = self.resolve(*address);
                    self.memory.insert(at, first);
                    self.memory.insert(at + 8, second);
                }
                Inst::Add(rd, rn, rm) => self.binary(*rd, *rn, *rm, i64::wrapping_add),
                Inst::Sub(rd, rn, rm) => self.binary(*rd, *rn, *rm, i64::wrapping_sub),
                Inst::SubImm(rd, rn, imm) => self.set(*rd, self.get(*rn) - i64::from(*imm)),
                Inst::Mul(rd, rn, rm) => self.binary(*rd, *rn, *rm, i64::wrapping_mul),
                Inst::Sdiv(rd, rn, rm) => {
                    self.binary(*rd, *rn, *rm, |a, b| if b == 0 { 0 } else { a.wrapping_div(b) })
                }
                Inst::Msub(rd, rn, rm, ra) => {
                    let value = self.get(*ra).wrapping_sub(self.get(*rn).wrapping_mul(self.get(*rm)));
                    self.set(*rd, value);
                }
                Inst::And(rd, rn, rm) => self.binary(*rd, *rn, *rm, |a, b| a & b),
                Inst::Orr(rd, rn, rm) => self.binary(*rd, *rn, *rm, |a, b| a | b),
                Inst::Eor(rd, rn, rm) => self.binary(*rd, *rn, *rm, |a, b| a ^ b),
                Inst::Neg(rd, rs) => self.set(*rd, self.get(*rs).wrapping_neg()),
                Inst::Mvn(rd, rs) => self.set(*rd, !self.get(*rs)),
                Inst::Cmp(rn, rm) => self.flags = (self.get(*rn), self.get(*rm)),
                Inst::Cset(rd, cond) => self.set(*rd, i64::from(self.holds(*cond))),
                Inst::Tbnz(rt, bit, label) => {
                    if (self.get(*rt) >> *bit) & 1 == 1 {
                        pc = self.target(label)?;
                    }
                }
                Inst::B(label) => pc = self.target(label)?,
                Inst::Bl(label) => {
                    if self.get(Reg::Sp) % 16 != 0 {
                        return Err(format!("misaligned stack at call to '{label}'"));
                    }
                    self.calls.push(CallRecord {
                        function: label.trim_start_matches('_').to_string(),
                        registers: PARAMETER_REGISTERS.iter().map(|&r| self.get(r)).collect(),
                    });
                    self.set(LINK_REGISTER, pc as i64);
                    pc = self.target(label)?;
                }
                Inst::Ret => {
                    let address = self.get(LINK_REGISTER);
                    if address == EXIT_ADDRESS {
                        return Ok(self.get(Reg::X(0)));
                    }
                    // x1-x18 and the link register are not preserved by a callee
                    for n in 1..=18 {
                        self.set(Reg::X(n), CLOBBERED);
                    }
                    self.set(LINK_REGISTER, CLOBBERED);
                    pc = address as usize;
                }
                Inst::Label(_) | Inst::Directive(_) => {}
            }
        }
        Err("step limit exceeded".to_string())
    }
}

/// Run `entry` to completion and check the calling convention held.
pub fn execute(code: &[Inst], entry: &str) -> Result<Run, String> {
    let mut machine = Machine::new(code);

    let preserved: Vec<(Reg, i64)> = CALLEE_SAVED_REGISTERS
        .iter()
        .chain([FRAME_POINTER].iter())
        .enumerate()
        .map(|(i, &reg)| (reg, 0x5a5a_0000 + i as i64))
        .collect();
    for &(reg, value) in &preserved {
        machine.set(reg, value);
    }
    machine.set(Reg::Sp, STACK_TOP);
    machine.set(LINK_REGISTER, EXIT_ADDRESS);

    let value = machine.run(entry)?;

    for &(reg, value) in &preserved {
        if machine.get(reg) != value {
            return Err(format!("{reg} not preserved across '{entry}'"));
        }
    }
    if machine.get(Reg::Sp) != STACK_TOP {
        return Err(format!("unbalanced stack: {:#x}", machine.get(Reg::Sp)));
    }

    Ok(Run {
        value,
        calls: machine.calls,
    })
}
