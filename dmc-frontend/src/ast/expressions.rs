//! Expression AST nodes

use super::ops::{BinaryOp, PrefixOp};
use super::statements::Block;
use dmc_common::SourceLocation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionKind {
    /// Variable, compile-time constant or parameter reference
    Identifier(String),

    IntegerLiteral(i64),
    StringLiteral(String),
    Boolean(bool),

    Prefix {
        op: PrefixOp,
        operand: Box<Expression>,
    },

    Infix {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Call of a named function; there are no function values
    Call {
        function: String,
        arguments: Vec<Expression>,
    },

    If {
        condition: Box<Expression>,
        consequence: Block,
        alternative: Option<Block>,
    },

    While {
        condition: Box<Expression>,
        body: Block,
    },
}

impl ExpressionKind {
    /// Short human readable name of the node kind
    pub fn describe(&self) -> &'static str {
        match self {
            ExpressionKind::Identifier(_) => "identifier",
            ExpressionKind::IntegerLiteral(_) => "integer literal",
            ExpressionKind::StringLiteral(_) => "string literal",
            ExpressionKind::Boolean(_) => "boolean literal",
            ExpressionKind::Prefix { .. } => "prefix expression",
            ExpressionKind::Infix { .. } => "infix expression",
            ExpressionKind::Call { .. } => "call",
            ExpressionKind::If { .. } => "if expression",
            ExpressionKind::While { .. } => "while expression",
        }
    }
}

impl Expression {
    pub fn new(kind: ExpressionKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }

    /// Whether evaluating this expression executes a call instruction
    pub fn contains_call(&self) -> bool {
        match &self.kind {
            ExpressionKind::Call { .. } => true,
            ExpressionKind::Prefix { operand, .. } => operand.contains_call(),
            ExpressionKind::Infix { left, right, .. } => left.contains_call() || right.contains_call(),
            ExpressionKind::If { .. } | ExpressionKind::While { .. } => true,
            ExpressionKind::Identifier(_)
            | ExpressionKind::IntegerLiteral(_)
            | ExpressionKind::StringLiteral(_)
            | ExpressionKind::Boolean(_) => false,
        }
    }
}
