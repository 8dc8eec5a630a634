//! If and while lowering

use super::X86Generator;
use dmc_codegen::asm::x86_64::{Cond, Inst, Operand};
use dmc_codegen::{CodegenError, IfLabels, WhileLabels};
use dmc_frontend::{BinaryOp, Block, Expression, ExpressionKind};
use log::debug;

impl X86Generator {
    /// Condition code that holds after `cmpq rhs, lhs` when `lhs op rhs`
    pub(crate) fn condition(op: BinaryOp) -> Cond {
        match op {
            BinaryOp::Equal => Cond::E,
            BinaryOp::NotEqual => Cond::Ne,
            BinaryOp::Less => Cond::L,
            BinaryOp::Greater => Cond::G,
            BinaryOp::LessEqual => Cond::Le,
            _ => Cond::Ge,
        }
    }

    /// Compare and branch: to `on_true` when the condition holds,
    /// to `on_false` otherwise
    fn emit_condition(&mut self, condition: &Expression, on_true: &str, on_false: &str) -> Result<(), CodegenError> {
        let ExpressionKind::Infix { op, left, right } = &condition.kind else {
            return Err(CodegenError::unsupported(
                format!("{} as a condition (expected a comparison)", condition.kind.describe()),
                &condition.location,
            ));
        };
        if !op.is_comparison() {
            return Err(CodegenError::unsupported(
                format!("'{op}' expression as a condition (expected a comparison)"),
                &condition.location,
            ));
        }

        let (lhs, rhs) = self.lower_operands(left, right)?;
        self.emit(Inst::Cmpq(Operand::Reg(rhs), lhs));
        self.emit(Inst::Jcc(Self::condition(*op), on_true.to_string()));
        self.emit(Inst::Jmp(on_false.to_string()));
        Ok(())
    }

    /// Register contents differ between the paths meeting at a label
    fn emit_join_label(&mut self, label: &str) {
        self.emit(Inst::Label(label.to_string()));
        self.pool.clear();
    }

    pub(crate) fn lower_if(
        &mut self,
        condition: &Expression,
        consequence: &Block,
        alternative: Option<&Block>,
    ) -> Result<(), CodegenError> {
        let labels = IfLabels::new(self.labels.next());
        debug!("x86_64: if construct {}", labels.true_label);

        self.emit_condition(condition, &labels.true_label, &labels.false_label)?;

        self.emit_join_label(&labels.true_label);
        self.lower_block(consequence)?;
        self.emit(Inst::Jmp(labels.end_label.clone()));

        self.emit_join_label(&labels.false_label);
        if let Some(alternative) = alternative {
            self.lower_block(alternative)?;
        }
        self.emit(Inst::Jmp(labels.end_label.clone()));

        self.emit_join_label(&labels.end_label);
        Ok(())
    }

    pub(crate) fn lower_while(&mut self, condition: &Expression, body: &Block) -> Result<(), CodegenError> {
        let labels = WhileLabels::new(self.labels.next());
        debug!("x86_64: while construct {}", labels.compare_label);

        self.emit(Inst::Jmp(labels.compare_label.clone()));
        self.emit_join_label(&labels.compare_label);
        self.emit_condition(condition, &labels.body_label, &labels.end_label)?;

        self.emit_join_label(&labels.body_label);
        self.lower_block(body)?;
        self.emit(Inst::Jmp(labels.compare_label.clone()));

        self.emit_join_label(&labels.end_label);
        Ok(())
    }
}
