//! If and while lowering

use super::Aarch64Generator;
use dmc_codegen::asm::aarch64::{Cond, Inst, SCRATCH_REGISTER};
use dmc_codegen::{CodegenError, IfLabels, WhileLabels};
use dmc_frontend::{BinaryOp, Block, Expression, ExpressionKind};
use log::debug;

impl Aarch64Generator {
    /// Condition code that holds after `cmp lhs, rhs` when `lhs op rhs`
    pub(crate) fn condition(op: BinaryOp) -> Cond {
        match op {
            BinaryOp::Equal => Cond::Eq,
            BinaryOp::NotEqual => Cond::Ne,
            BinaryOp::Less => Cond::Lt,
            BinaryOp::Greater => Cond::Gt,
            BinaryOp::LessEqual => Cond::Le,
            _ => Cond::Ge,
        }
    }

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
        self.emit(Inst::Cmp(lhs, rhs));
        self.emit(Inst::Cset(SCRATCH_REGISTER, Self::condition(*op)));
        self.emit(Inst::Tbnz(SCRATCH_REGISTER, 0, on_true.to_string()));
        self.emit(Inst::B(on_false.to_string()));
        Ok(())
    }

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
        debug!("aarch64: if construct {}", labels.true_label);

        self.emit_condition(condition, &labels.true_label, &labels.false_label)?;

        self.emit_join_label(&labels.true_label);
        self.lower_block(consequence)?;
        self.emit(Inst::B(labels.end_label.clone()));

        self.emit_join_label(&labels.false_label);
        if let Some(alternative) = alternative {
            self.lower_block(alternative)?;
        }
        self.emit(Inst::B(labels.end_label.clone()));

        self.emit_join_label(&labels.end_label);
        Ok(())
    }

    pub(crate) fn lower_while(&mut self, condition: &Expression, body: &Block) -> Result<(), CodegenError> {
        let labels = WhileLabels::new(self.labels.next());
        debug!("aarch64: while construct {}", labels.compare_label);

        self.emit(Inst::B(labels.compare_label.clone()));
        self.emit_join_label(&labels.compare_label);
        self.emit_condition(condition, &labels.body_label, &labels.end_label)?;

        self.emit_join_label(&labels.body_label);
        self.lower_block(body)?;
        self.emit(Inst::B(labels.compare_label.clone()));

        self.emit_join_label(&labels.end_label);
        Ok(())
    }
}
