//! Virtual Register Pool
//!
//! Tracks which symbolic value currently occupies each allocatable register
//! of a target. Slots are kept in a fixed, ordered array so allocation is
//! deterministic: the lowest-indexed free register always wins. There is no
//! spilling; running out of registers is a fatal error.

use crate::error::CodegenError;
use log::{debug, trace};
use std::fmt;

/// What a register currently holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occupant {
    /// The value of a named variable, loaded from its stack slot
    Variable(String),
    /// An intermediate result not bound to any name
    Transient,
    /// The return register right after a call
    CallReturn,
}

impl fmt::Display for Occupant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Occupant::Variable(name) => write!(f, "var '{name}'"),
            Occupant::Transient => write!(f, "transient"),
            Occupant::CallReturn => write!(f, "call return"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterPool<R> {
    registers: Vec<R>,
    occupants: Vec<Option<Occupant>>,
    return_register: R,
}

impl<R: Copy + PartialEq + fmt::Display> RegisterPool<R> {
    /// Create a pool over `registers`, in allocation order
    pub fn new(registers: &[R], return_register: R) -> Self {
        Self {
            registers: registers.to_vec(),
            occupants: vec![None; registers.len()],
            return_register,
        }
    }

    fn index_of(&self, reg: R) -> Option<usize> {
        self.registers.iter().position(|&r| r == reg)
    }

    /// Bind the lowest-indexed free register to `occupant`
    pub fn allocate(&mut self, occupant: Occupant) -> Result<R, CodegenError> {
        let index = self
            .occupants
            .iter()
            .position(Option::is_none)
            .ok_or(CodegenError::RegistersExhausted {
                capacity: self.registers.len(),
            })?;

        let reg = self.registers[index];
        trace!("regpool: allocate {reg} for {occupant}");
        self.occupants[index] = Some(occupant);
        Ok(reg)
    }

    /// Register currently holding variable `name`, if any
    pub fn locate(&self, name: &str) -> Option<R> {
        self.occupants
            .iter()
            .position(|o| matches!(o, Some(Occupant::Variable(n)) if n == name))
            .map(|index| self.registers[index])
    }

    pub fn occupant(&self, reg: R) -> Option<&Occupant> {
        self.index_of(reg).and_then(|index| self.occupants[index].as_ref())
    }

    /// Clear one binding
    pub fn release(&mut self, reg: R) {
        if let Some(index) = self.index_of(reg) {
            if let Some(occupant) = self.occupants[index].take() {
                trace!("regpool: release {reg} ({occupant})");
            }
        }
    }

    /// Drop the residency of variable `name`, e.g. after it was reassigned
    pub fn release_variable(&mut self, name: &str) {
        if let Some(reg) = self.locate(name) {
            self.release(reg);
        }
    }

    /// Bind a specific register, discarding whatever it held
    pub fn claim(&mut self, reg: R, occupant: Occupant) {
        if let Some(index) = self.index_of(reg) {
            trace!("regpool: claim {reg} for {occupant}");
            self.occupants[index] = Some(occupant);
        }
    }

    /// A call may overwrite every register: forget all bindings, then mark
    /// the return register as holding the call's result
    pub fn clobber_all(&mut self) {
        self.clear();
        let return_register = self.return_register;
        self.claim(return_register, Occupant::CallReturn);
        debug!("regpool: clobbered by call, {return_register} holds the result");
    }

    /// Forget every binding, at statement boundaries and join points
    pub fn clear(&mut self) {
        self.occupants.iter_mut().for_each(|o| *o = None);
    }
}
