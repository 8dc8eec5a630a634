//! Expression lowering

use super::X86Generator;
use dmc_codegen::asm::x86_64::{Inst, Operand, Reg, PARAMETER_REGISTERS, RETURN_REGISTER, SCRATCH_REGISTER};
use dmc_codegen::labels::string_label;
use dmc_codegen::{resolve_constant, CodegenError, Occupant, ResultLocation};
use dmc_common::SourceLocation;
use dmc_frontend::{BinaryOp, Expression, ExpressionKind, PrefixOp};
use log::{debug, trace};

impl X86Generator {
    pub(crate) fn lower_expression(&mut self, expr: &Expression) -> Result<ResultLocation<Reg>, CodegenError> {
        trace!("x86_64: lowering {} at {}", expr.kind.describe(), expr.location);

        match &expr.kind {
            ExpressionKind::Identifier(name) => self.lower_identifier(name, &expr.location),
            ExpressionKind::IntegerLiteral(value) => self.lower_integer(*value),
            ExpressionKind::Boolean(value) => self.lower_integer(i64::from(*value)),
            ExpressionKind::StringLiteral(value) => Ok(self.lower_string(value)),
            ExpressionKind::Prefix { op, operand } => self.lower_prefix(*op, operand, &expr.location),
            ExpressionKind::Infix { op, left, right } => self.lower_infix(*op, left, right, &expr.location),
            ExpressionKind::Call { function, arguments } => self.lower_call(function, arguments, &expr.location),
            ExpressionKind::If { condition, consequence, alternative } => {
                self.lower_if(condition, consequence, alternative.as_ref())?;
                Ok(ResultLocation::NoValue)
            }
            ExpressionKind::While { condition, body } => {
                self.lower_while(condition, body)?;
                Ok(ResultLocation::NoValue)
            }
        }
    }

    fn lower_identifier(&mut self, name: &str, location: &SourceLocation) -> Result<ResultLocation<Reg>, CodegenError> {
        if let Some(value) = resolve_constant(&self.constants, name, location)? {
            return self.lower_integer(value);
        }

        if let Some(reg) = self.pool.locate(name) {
            return Ok(ResultLocation::Register(reg));
        }

        let offset = self.layout.offset_of(name).ok_or_else(|| CodegenError::UndefinedVariable {
            name: name.to_string(),
            location: location.clone(),
        })?;

        let reg = self.pool.allocate(Occupant::Variable(name.to_string()))?;
        self.emit(Inst::Movq(Self::slot(offset), Operand::Reg(reg)));
        Ok(ResultLocation::Register(reg))
    }

    fn lower_integer(&mut self, value: i64) -> Result<ResultLocation<Reg>, CodegenError> {
        let reg = self.pool.allocate(Occupant::Transient)?;
        self.load_immediate(value, reg);
        Ok(ResultLocation::Register(reg))
    }

    /// Pool the literal in the data section
    fn lower_string(&mut self, value: &str) -> ResultLocation<Reg> {
        let label = string_label(self.labels.next());
        debug!("x86_64: string literal {value:?} pooled as {label}");
        self.data.push(Inst::Label(label.clone()));
        self.data.push(Inst::Asciz(value.to_string()));
        ResultLocation::Data(label)
    }

    fn lower_prefix(
        &mut self,
        op: PrefixOp,
        operand: &Expression,
        location: &SourceLocation,
    ) -> Result<ResultLocation<Reg>, CodegenError> {
        if op == PrefixOp::Not {
            return Err(CodegenError::unsupported("logical not", location));
        }

        let result = self.lower_expression(operand)?;
        let src = self.materialize(result, &operand.location)?;
        let dest = self.pool.allocate(Occupant::Transient)?;
        self.emit(Inst::Movq(Operand::Reg(src), Operand::Reg(dest)));
        match op {
            PrefixOp::Neg => self.emit(Inst::Negq(dest)),
            _ => self.emit(Inst::Notq(dest)),
        }
        self.release_if_temporary(src);
        Ok(ResultLocation::Register(dest))
    }

    /// Lower both operands of a binary operator, left first.
    /// 
    /// When the right operand performs a call, the left value is parked on
    /// the machine stack across it and reloaded into a fresh register.
    pub(crate) fn lower_operands(&mut self, left: &Expression, right: &Expression) -> Result<(Reg, Reg), CodegenError> {
        let result = self.lower_expression(left)?;
        let lhs = self.materialize(result, &left.location)?;

        if !right.contains_call() {
            let result = self.lower_expression(right)?;
            let rhs = self.materialize(result, &right.location)?;
            return Ok((lhs, rhs));
        }

        debug!("x86_64: preserving {lhs} across call in right operand");
        let area = self.push_area(1);
        self.emit(Inst::Movq(Operand::Reg(lhs), Self::stack_cell(0)));

        let result = self.lower_expression(right)?;
        let rhs = self.materialize(result, &right.location)?;

        let lhs = self.pool.allocate(Occupant::Transient)?;
        self.emit(Inst::Movq(Self::stack_cell(0), Operand::Reg(lhs)));
        self.pop_area(area);
        Ok((lhs, rhs))
    }

    fn lower_infix(
        &mut self,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        location: &SourceLocation,
    ) -> Result<ResultLocation<Reg>, CodegenError> {
        if op.is_logical() {
            return Err(CodegenError::unsupported(format!("logical operator '{op}'"), location));
        }

        let (lhs, rhs) = self.lower_operands(left, right)?;
        let dest = self.pool.allocate(Occupant::Transient)?;

        match op {
            BinaryOp::Div | BinaryOp::Mod => self.emit_division(op, lhs, rhs, dest),
            _ if op.is_comparison() => {
                self.emit(Inst::Cmpq(Operand::Reg(rhs), lhs));
                self.emit(Inst::Set(Self::condition(op), SCRATCH_REGISTER));
                self.emit(Inst::Movzbq(SCRATCH_REGISTER, dest));
            }
            _ => self.emit_arithmetic(op, lhs, rhs, dest),
        }

        self.release_if_temporary(lhs);
        self.release_if_temporary(rhs);
        Ok(ResultLocation::Register(dest))
    }

    /// `dest = lhs op rhs` with the two-operand instruction forms
    fn emit_arithmetic(&mut self, op: BinaryOp, lhs: Reg, rhs: Reg, dest: Reg) {
        let mut rhs_operand = rhs;
        if dest == rhs {
            self.emit(Inst::Movq(Operand::Reg(rhs), Operand::Reg(SCRATCH_REGISTER)));
            rhs_operand = SCRATCH_REGISTER;
        }
        if dest != lhs {
            self.emit(Inst::Movq(Operand::Reg(lhs), Operand::Reg(dest)));
        }

        let src = Operand::Reg(rhs_operand);
        let inst = match op {
            BinaryOp::Add => Inst::Addq(src, dest),
            BinaryOp::Sub => Inst::Subq(src, dest),
            BinaryOp::Mul => Inst::Imulq(src, dest),
            BinaryOp::BitAnd => Inst::Andq(src, dest),
            BinaryOp::BitOr => Inst::Orq(src, dest),
            _ => Inst::Xorq(src, dest),
        };
        self.emit(inst);
    }

    /// Signed division through `%rdx:%rax`, preserving both
    fn emit_division(&mut self, op: BinaryOp, lhs: Reg, rhs: Reg, dest: Reg) {
        let result = if op == BinaryOp::Mod { Reg::Rdx } else { Reg::Rax };

        self.emit(Inst::Pushq(Reg::Rax));
        self.emit(Inst::Pushq(Reg::Rdx));
        self.emit(Inst::Movq(Operand::Reg(rhs), Operand::Reg(SCRATCH_REGISTER)));
        self.emit(Inst::Movq(Operand::Reg(lhs), Operand::Reg(Reg::Rax)));
        self.emit(Inst::Cqto);
        self.emit(Inst::Idivq(SCRATCH_REGISTER));
        self.emit(Inst::Movq(Operand::Reg(result), Operand::Reg(SCRATCH_REGISTER)));
        self.emit(Inst::Popq(Reg::Rdx));
        self.emit(Inst::Popq(Reg::Rax));
        self.emit(Inst::Movq(Operand::Reg(SCRATCH_REGISTER), Operand::Reg(dest)));
    }

    /// Move each argument into its parameter register and call.
    fn lower_call(
        &mut self,
        function: &str,
        arguments: &[Expression],
        location: &SourceLocation,
    ) -> Result<ResultLocation<Reg>, CodegenError> {
        if arguments.len() > PARAMETER_REGISTERS.len() {
            return Err(CodegenError::unsupported(
                format!("call to '{function}' with more than {} arguments", PARAMETER_REGISTERS.len()),
                location,
            ));
        }

        for (i, argument) in arguments.iter().enumerate() {
            let target = PARAMETER_REGISTERS[i];
            let placed = &PARAMETER_REGISTERS[..i];

            // A nested call would overwrite the arguments placed so far
            let saved = if i > 0 && argument.contains_call() {
                let area = self.push_area(placed.len());
                for (cell, &reg) in placed.iter().enumerate() {
                    self.emit(Inst::Movq(Operand::Reg(reg), Self::stack_cell(cell)));
                }
                Some(area)
            } else {
                None
            };

            let result = self.lower_expression(argument)?;
            let reg = self.materialize(result, &argument.location)?;
            if reg != target {
                self.emit(Inst::Movq(Operand::Reg(reg), Operand::Reg(target)));
                self.release_if_temporary(reg);
            }
            self.pool.claim(target, Occupant::Transient);

            if let Some(area) = saved {
                for (cell, &reg) in placed.iter().enumerate() {
                    self.emit(Inst::Movq(Self::stack_cell(cell), Operand::Reg(reg)));
                    self.pool.claim(reg, Occupant::Transient);
                }
                self.pop_area(area);
            }
        }

        self.emit(Inst::Call(function.to_string()));
        self.pool.clobber_all();
        Ok(ResultLocation::Register(RETURN_REGISTER))
    }
}
