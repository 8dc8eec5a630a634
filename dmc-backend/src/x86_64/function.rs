//! Function and statement lowering

use super::{X86Generator, FRAME_SIZE, LOCALS_SIZE};
use dmc_codegen::asm::x86_64::{Inst, Operand, Reg, CALLEE_SAVED_REGISTERS, PARAMETER_REGISTERS, RETURN_REGISTER};
use dmc_codegen::{CodegenError, VariableLayout};
use dmc_frontend::{Block, FunctionDefinition, Statement, StatementKind};
use log::{debug, trace};

impl X86Generator {
    /// Lower one function into its own instruction list.
    /// 
    /// The layout table, register pool and output buffer of any enclosing
    /// function are set aside and restored afterwards.
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

        if function.is_entry_point() {
            self.emit(Inst::Directive(format!(".globl {}", function.name)));
        }
        self.emit(Inst::Directive(format!(".type {}, @function", function.name)));
        self.emit(Inst::Label(function.name.clone()));
        self.emit_prologue();

        for (param, &reg) in function.parameters.iter().zip(PARAMETER_REGISTERS.iter()) {
            let offset = self.layout.declare(&param.name, param.param_type)?;
            debug!("x86_64: parameter '{}' from {reg} to offset {offset}", param.name);
            self.emit(Inst::Movq(Operand::Reg(reg), Self::slot(offset)));
        }

        self.lower_block(&function.body)?;

        if !function.body.ends_with_return() {
            self.emit_epilogue();
        }
        Ok(())
    }

    fn callee_saved_slot(index: usize) -> Operand {
        Operand::Mem {
            base: Reg::Rbp,
            offset: -(LOCALS_SIZE as i32) - 8 * (index as i32 + 1),
        }
    }

    fn emit_prologue(&mut self) {
        self.emit(Inst::Pushq(Reg::Rbp));
        self.emit(Inst::Movq(Operand::Reg(Reg::Rsp), Operand::Reg(Reg::Rbp)));
        self.emit(Inst::Subq(Operand::Imm(FRAME_SIZE), Reg::Rsp));
        for (i, &reg) in CALLEE_SAVED_REGISTERS.iter().enumerate() {
            self.emit(Inst::Movq(Operand::Reg(reg), Self::callee_saved_slot(i)));
        }
    }

    pub(crate) fn emit_epilogue(&mut self) {
        for (i, &reg) in CALLEE_SAVED_REGISTERS.iter().enumerate() {
            self.emit(Inst::Movq(Self::callee_saved_slot(i), Operand::Reg(reg)));
        }
        self.emit(Inst::Movq(Operand::Reg(Reg::Rbp), Operand::Reg(Reg::Rsp)));
        self.emit(Inst::Popq(Reg::Rbp));
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
        trace!("x86_64: statement at {}", statement.location);

        match &statement.kind {
            StatementKind::Var { name, var_type, value } => {
                let result = self.lower_expression(value)?;
                let reg = self.materialize(result, &value.location)?;
                let offset = self.layout.declare(name, *var_type)?;
                self.pool.release_variable(name);
                self.emit(Inst::Movq(Operand::Reg(reg), Self::slot(offset)));
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
                self.emit(Inst::Movq(Operand::Reg(reg), Self::slot(offset)));
                self.pool.release_variable(name);
            }

            StatementKind::Return(value) => {
                let result = self.lower_expression(value)?;
                let reg = self.materialize(result, &value.location)?;
                if reg != RETURN_REGISTER {
                    self.emit(Inst::Movq(Operand::Reg(reg), Operand::Reg(RETURN_REGISTER)));
                }
                self.emit_epilogue();
            }

            StatementKind::Expression(expr) => {
                self.lower_expression(expr)?;
            }

            StatementKind::Function(nested) => {
                debug!("x86_64: deferring nested function '{}'", nested.name);
                let code = self.lower_function(nested)?;
                self.deferred.extend(code);
            }
        }

        Ok(())
    }
}
