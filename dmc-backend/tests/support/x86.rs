//! Interpreter for generated x86-64 instruction lists

use super::{CallRecord, Run, CLOBBERED, EXIT_ADDRESS, STACK_TOP, STEP_LIMIT};
use dmc_codegen::asm::x86_64::{Cond, Inst, Operand, Reg, CALLEE_SAVED_REGISTERS, PARAMETER_REGISTERS};
use std::collections::HashMap;

/// Address handed out for `leaq label(%rip)`
const DATA_ADDRESS: i64 = 0x40_0000;

/// Registers a callee may leave changed, apart from `%rax`
const CALLER_SAVED: [Reg; 8] = [
    Reg::Rcx,
    Reg::Rdx,
    Reg::Rsi,
    Reg::Rdi,
    Reg::R8,
    Reg::R9,
    Reg::R10,
    Reg::R11,
];

struct Machine<'a> {
    code: &'a [Inst],
    labels: HashMap<&'a str, usize>,
    registers: HashMap<Reg, i64>,
    memory: HashMap<i64, i64>,
    /// Operands of the last `cmpq`, destination first
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

    fn read(&self, operand: &Operand) -> Result<i64, String> {
        match operand {
            Operand::Reg(reg) => Ok(self.get(*reg)),
            Operand::Imm(value) => Ok(*value),
            Operand::Mem { base, offset } => self.load(self.get(*base) + i64::from(*offset)),
            Operand::RipLabel(label) => Err(format!("direct read of {label}")),
        }
    }

    fn write(&mut self, operand: &Operand, value: i64) -> Result<(), String> {
        match operand {
            Operand::Reg(reg) => self.set(*reg, value),
            Operand::Mem { base, offset } => {
                let address = self.get(*base) + i64::from(*offset);
                self.memory.insert(address, value);
            }
            other => return Err(format!("cannot write to {other}")),
        }
        Ok(())
    }

    fn push(&mut self, value: i64) {
        let sp = self.get(Reg::Rsp) - 8;
        self.set(Reg::Rsp, sp);
        self.memory.insert(sp, value);
    }

    fn pop(&mut self) -> Result<i64, String> {
        let sp = self.get(Reg::Rsp);
        let value = self.load(sp)?;
        self.set(Reg::Rsp, sp + 8);
        Ok(value)
    }

    fn holds(&self, cond: Cond) -> bool {
        let (a, b) = self.flags;
        match cond {
            Cond::E => a == b,
            Cond::Ne => a != b,
            Cond::L => a < b,
            Cond::G => a > b,
            Cond::Le => a <= b,
            Cond::Ge => a >= b,
        }
    }

    fn target(&self, label: &str) -> Result<usize, String> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| format!("jump to unknown label '{label}'"))
    }

    fn arithmetic(&mut self, src: &Operand, dst: Reg, f: impl Fn(i64, i64) -> i64) -> Result<(), String> {
        let value = f(self.get(dst), self.read(src)?);
        self.set(dst, value);
        Ok(())
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
                Inst::Movq(src, dst) => {
                    let value = self.read(src)?;
                    self.write(dst, value)?;
                }
                Inst::Movabsq(value, dst) => self.set(*dst, *value),
                Inst::Leaq(src, dst) => {
                    let address = match src {
                        Operand::Mem { base, offset } => self.get(*base) + i64::from(*offset),
                        Operand::RipLabel(_) => DATA_ADDRESS,
                        other => return Err(format!("leaq of {other}")),
                    };
                    self.set(*dst, address);
                }
                Inst::Pushq(reg) => self.push(self.get(*reg)),
                Inst::Popq(reg) => {
                    let value = self.pop()?;
                    self.set(*reg, value);
                }
                Inst::Addq(src, dst) => self.arithmetic(src, *dst, i64::wrapping_add)?,
                Inst::Subq(src, dst) => self.arithmetic(src, *dst, i64::wrapping_sub)?,
                Inst::Imulq(src, dst) => self.arithmetic(src, *dst, i64::wrapping_mul)?,
                Inst::Andq(src, dst) => self.arithmetic(src, *dst, |a, b| a & b)?,
                Inst::Orq(src, dst) => self.arithmetic(src, *dst, |a, b| a | b)?,
                Inst::Xorq(src, dst) => self.arithmetic(src, *dst, |a, b| a ^ b)?,
                Inst::Negq(reg) => self.set(*reg, self.get(*reg).wrapping_neg()),
                Inst::Notq(reg) => self.set(*reg, !self.get(*reg)),
                Inst::Cqto => {
                    let high = if self.get(Reg::Rax) < 0 { -1 } else { 0 };
                    self.set(Reg::Rdx, high);
                }
                Inst::Idivq(reg) => {
                    let divisor = self.get(*reg);
                    if divisor == 0 {
                        return Err("division by zero".to_string());
                    }
                    let dividend = self.get(Reg::Rax);
                    self.set(Reg::Rax, dividend.wrapping_div(divisor));
                    self.set(Reg::Rdx, dividend.wrapping_rem(divisor));
                }
                Inst::Cmpq(src, dst) => self.flags = (self.get(*dst), self.read(src)?),
                Inst::Set(cond, reg) => {
                    let bit = i64::from(self.holds(*cond));
                    self.set(*reg, (self.get(*reg) & !0xff) | bit);
                }
                Inst::Movzbq(src, dst) => self.set(*dst, self.get(*src) & 0xff),
                Inst::Jmp(label) => pc = self.target(label)?,
                Inst::Jcc(cond, label) => {
                    if self.holds(*cond) {
                        pc = self.target(label)?;
                    }
                }
                Inst::Call(label) => {
                    if self.get(Reg::Rsp) % 16 != 0 {
                        return Err(format!("misaligned stack at call to '{label}'"));
                    }
                    self.calls.push(CallRecord {
                        function: label.clone(),
                        registers: PARAMETER_REGISTERS.iter().map(|&r| self.get(r)).collect(),
                    });
                    self.push(pc as i64);
                    pc = self.target(label)?;
                }
                Inst::Ret => {
                    let address = self.pop()?;
                    if address == EXIT_ADDRESS {
                        return Ok(self.get(Reg::Rax));
                    }
                    for reg in CALLER_SAVED {
                        self.set(reg, CLOBBERED);
                    }
                    pc = address as usize;
                }
                Inst::Label(_) | Inst::Directive(_) | Inst::Asciz(_) => {}
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
        .chain([Reg::Rbp].iter())
        .enumerate()
        .map(|(i, &reg)| (reg, 0x5a5a_0000 + i as i64))
        .collect();
    for &(reg, value) in &preserved {
        machine.set(reg, value);
    }
    machine.set(Reg::Rsp, STACK_TOP);
    machine.push(EXIT_ADDRESS);

    let value = machine.run(entry)?;

    for &(reg, value) in &preserved {
        if machine.get(reg) != value {
            return Err(format!("{reg} not preserved across '{entry}'"));
        }
    }
    if machine.get(Reg::Rsp) != STACK_TOP {
        return Err(format!("unbalanced stack: {:#x}", machine.get(Reg::Rsp)));
    }

    Ok(Run {
        value,
        calls: machine.calls,
    })
}
