//! Function and statement lowering

use super::{Aarch64Generator, FRAME_SIZE, LOCALS_SIZE};
use dmc_codegen::asm::aarch64::{
    Address, Inst, Reg, CALLEE_SAVED_REGISTERS, FRAME_POINTER, LINK_REGISTER, PARAMETER_REGISTERS,
    RETURN_REGISTER,
};
use dmc_codegen::{CodegenError, VariableLayout};
use dmc_frontend::{Block, FunctionDefinition, Statement, StatementKind};
use log::{debug, trace};

impl Aarch64Generator {
    pub(crate) fn lower_function(&mut self, function: &FunctionDefinition) -> Result<Vec<Inst>, CodegenError> {
        let saved_layout = std::mem::replace(&mut self.layout, VariableLayout::new(LOCALS_SIZE));
        let saved_pool = std::mem::replace(&mut self.pool, Self::fresh_pool());
        let saved_out = std::mem::take(&mut self.out);

        let result = self.lower_function_body(function);

        let code = std::mem::replace(&mut self.out, saved_out);
        self.layout = saved_layout;
        self.pool = saved_pool;
        result.map(|()| code)
    }

    fn lower_function_body(&mut self, function: &FunctionDefinition) -> Result<(), CodegenError> {
        if function.parameters.len() > PARAMETER_REGISTERS.len() {
            return Err(CodegenError::unsupported(
                format!(
                    "function '{}' takes more than {} parameters",
                    function.name,
                    PARAMETER_REGISTERS.len()
                ),
                &function.location,
            ));
        }

        let symbol = Self::symbol(&function.name);
        if function.is_entry_point() {
            self.emit(Inst::Directive(format!(".globl {symbol}")));
        }
        self.emit(Inst::Directive(".p2align 2".to_string()));
        self.emit(Inst::Label(symbol));
        self.emit_prologue();

        for (param, &reg) in function.parameters.iter().zip(PARAMETER_REGISTERS.iter()) {
            let offset = self.layout.declare(&param.name, param.param_type)?;
            debug!("aarch64: parameter '{}' from {reg} to offset {offset}", param.name);
            self.emit(Inst::Str(reg, Self::slot(offset)));
        }

        self.lower_block(&function.body)?;

        if !function.body.ends_with_return() {
            self.emit_epilogue();
        }
        Ok(())
    }

    /// Addresses of the callee-saved pairs, lowest first
    fn callee_saved_pairs() -> impl Iterator<Item = (Reg, Reg, Address)> {
        let registers: &'static [Reg] = &CALLEE_SAVED_REGISTERS;
        registers.chunks(2).enumerate().map(|(i, pair)| {
            let address = Address::Offset {
                base: FRAME_POINTER,
                offset: -(FRAME_SIZE as i32) + 16 * i as i32,
            };
            (pair[0], pair[1], address)
        })
    }

    fn emit_prologue(&mut self) {
        self.emit(Inst::Stp(FRAME_POINTER, LINK_REGISTER, Address::PreIndex { base: Reg::Sp, offset: -16 }));
        self.emit(Inst::Mov(FRAME_POINTER, Reg::Sp));
        self.emit(Inst::SubImm(Reg::Sp, Reg::Sp, FRAME_SIZE));
        for (first, second, address) in Self::callee_saved_pairs() {
            self.emit(Inst::Stp(first, second, address));
        }
    }

    pub(crate) fn emit_epilogue(&mut self) {
        for (first, second, address) in Self::callee_saved_pairs() {
            self.emit(Inst::Ldp(first, second, address));
        }
        self.emit(Inst::Mov(Reg::Sp, FRAME_POINTER));
        self.emit(Inst::Ldp(FRAME_POINTER, LINK_REGISTER, Address::PostIndex { base: Reg::Sp, offset: 16 }));
        self.emit(Inst::Ret);
    }

    pub(crate) fn lower_block(&mut self, block: &Block) -> Result<(), CodegenError> {
        for statement in &block.statements {
            self.lower_statement(statement)?;
            // Every stack slot is current here, so cached variables can go too
            self.pool.clear();
        }
        Ok(())
    }

    fn lower_statement(&mut self, statement: &Statement) -> Result<(), CodegenError> {
        trace!("aarch64: statement at {}", statement.location);

        match &statement.kind {
            StatementKind::Var { name, var_type, value } => {
                let result = self.lower_expression(value)?;
                let reg = self.materialize(result, &value.location)?;
                let offset = self.layout.declare(name, *var_type)?;
                self.pool.release_variable(name);
                self.emit(Inst::Str(reg, Self::slot(offset)));
            }

            StatementKind::Reassign { name, value } => {
                let offset = self.layout.offset_of(name).ok_or_else(|| {
                    CodegenError::UndefinedVariable {
                        name: name.clone(),
                        location: statement.location.clone(),
                    }
                })?;
                let result = self.lower_expression(value)?;
                let reg = self.materialize(result, &value.location)?;
                self.emit(Inst::Str(reg, Self::slot(offset)));
                self.pool.release_variable(name);
            }

            StatementKind::Return(value) => {
                let result = self.lower_expression(value)?;
                let reg = self.materialize(result, &value.location)?;
                if reg != RETURN_REGISTER {
                    self.emit(Inst::Mov(RETURN_REGISTER, reg));
                }
                self.emit_epilogue();
            }

            StatementKind::Expression(expr) => {
                self.lower_expression(expr)?;
            }

            StatementKind::Function(nested) => {
                debug!("aarch64: deferring nested function '{}'", nested.name);
                let code = self.lower_function(nested)?;
                self.deferred.extend(code);
            }
        }

        Ok(())
    }
}
