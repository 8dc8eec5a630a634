//! Expression lowering

use super::Aarch64Generator;
use dmc_codegen::asm::aarch64::{Inst, Reg, PARAMETER_REGISTERS, RETURN_REGISTER, SCRATCH_REGISTER};
use dmc_codegen::{resolve_constant, CodegenError, Occupant, ResultLocation};
use dmc_common::SourceLocation;
use dmc_frontend::{BinaryOp, Expression, ExpressionKind, PrefixOp};
use log::{debug, trace};

impl Aarch64Generator {
    pub(crate) fn lower_expression(&mut self, expr: &Expression) -> Result<ResultLocation<Reg>, CodegenError> {
        trace!("aarch64: lowering {} at {}", expr.kind.describe(), expr.location);

        match &expr.kind {
            ExpressionKind::Identifier(name) => self.lower_identifier(name, &expr.location),
            ExpressionKind::IntegerLiteral(value) => self.lower_integer(*value),
            ExpressionKind::Boolean(value) => self.lower_integer(i64::from(*value)),
            ExpressionKind::StringLiteral(_) => Err(CodegenError::unsupported("string literal", &expr.location)),
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
        self.emit(Inst::Ldr(reg, Self::slot(offset)));
        Ok(ResultLocation::Register(reg))
    }

    fn lower_integer(&mut self, value: i64) -> Result<ResultLocation<Reg>, CodegenError> {
        let reg = self.pool.allocate(Occupant::Transient)?;
        self.load_immediate(value, reg);
        Ok(ResultLocation::Register(reg))
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
        match op {
            PrefixOp::Neg => self.emit(Inst::Neg(dest, src)),
            _ => self.emit(Inst::Mvn(dest, src)),
        }
        self.release_if_temporary(src);
        Ok(ResultLocation::Register(dest))
    }

    /// Lower both operands, left first, parking the left value on the stack
    /// when the right operand performs a call.
    pub(crate) fn lower_operands(&mut self, left: &Expression, right: &Expression) -> Result<(Reg, Reg), CodegenError> {
        let result = self.lower_expression(left)?;
        let lhs = self.materialize(result, &left.location)?;

        if !right.contains_call() {
            let result = self.lower_expression(right)?;
            let rhs = self.materialize(result, &right.location)?;
            return Ok((lhs, rhs));
        }

        debug!("aarch64: preserving {lhs} across call in right operand");
        self.push(lhs);
        let result = self.lower_expression(right)?;
        let rhs = self.materialize(result, &right.location)?;

        let lhs = self.pool.allocate(Occupant::Transient)?;
        self.pop(lhs);
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

        let inst = match op {
            BinaryOp::Add => Inst::Add(dest, lhs, rhs),
            BinaryOp::Sub => Inst::Sub(dest, lhs, rhs),
            BinaryOp::Mul => Inst::Mul(dest, lhs, rhs),
            BinaryOp::Div => Inst::Sdiv(dest, lhs, rhs),
            BinaryOp::Mod => {
                self.emit(Inst::Sdiv(SCRATCH_REGISTER, lhs, rhs));
                Inst::Msub(dest, SCRATCH_REGISTER, rhs, lhs)
            }
            BinaryOp::BitAnd => Inst::And(dest, lhs, rhs),
            BinaryOp::BitOr => Inst::Orr(dest, lhs, rhs),
            BinaryOp::BitXor => Inst::Eor(dest, lhs, rhs),
            _ => {
                self.emit(Inst::Cmp(lhs, rhs));
                Inst::Cset(dest, Self::condition(op))
            }
        };
        self.emit(inst);

        self.release_if_temporary(lhs);
        self.release_if_temporary(rhs);
        Ok(ResultLocation::Register(dest))
    }

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
            let save = i > 0 && argument.contains_call();
            if save {
                for &reg in placed {
                    self.push(reg);
                }
            }

            let result = self.lower_expression(argument)?;
            let reg = self.materialize(result, &argument.location)?;
            if reg != target {
                self.emit(Inst::Mov(target, reg));
                self.release_if_temporary(reg);
            }
            self.pool.claim(target, Occupant::Transient);

            if save {
                for &reg in placed.iter().rev() {
                    self.pop(reg);
                    self.pool.claim(reg, Occupant::Transient);
                }
            }
        }

        self.emit(Inst::Bl(Self::symbol(function)));
        self.pool.clobber_all();
        Ok(ResultLocation::Register(RETURN_REGISTER))
    }
}
