//! Operator precedence levels for the Pratt parser

use crate::ast::BinaryOp;
use crate::lexer::TokenType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Equals,      // == !=
    LessGreater, // < > <= >=
    Logical,     // && ||
    Bitwise,     // & | ^
    Sum,         // + -
    Product,     // * / %
    Prefix,      // -x !x ~x
    Call,        // f(x)
}

impl Precedence {
    /// Binding power of a token in infix position
    pub fn of(token_type: &TokenType) -> Precedence {
        match token_type {
            TokenType::EqualEqual | TokenType::BangEqual => Precedence::Equals,
            TokenType::Less
            | TokenType::Greater
            | TokenType::LessEqual
            | TokenType::GreaterEqual => Precedence::LessGreater,
            TokenType::AmpersandAmpersand | TokenType::PipePipe => Precedence::Logical,
            TokenType::Ampersand | TokenType::Pipe | TokenType::Caret => Precedence::Bitwise,
            TokenType::Plus | TokenType::Minus => Precedence::Sum,
            TokenType::Star | TokenType::Slash | TokenType::Percent => Precedence::Product,
            TokenType::LeftParen => Precedence::Call,
            _ => Precedence::Lowest,
        }
    }
}

/// Map an infix operator token to its AST operator
pub fn binary_op(token_type: &TokenType) -> Option<BinaryOp> {
    let op = match token_type {
        TokenType::Plus => BinaryOp::Add,
        TokenType::Minus => BinaryOp::Sub,
        TokenType::Star => BinaryOp::Mul,
        TokenType::Slash => BinaryOp::Div,
        TokenType::Percent => BinaryOp::Mod,
        TokenType::Ampersand => BinaryOp::BitAnd,
        TokenType::Pipe => BinaryOp::BitOr,
        TokenType::Caret => BinaryOp::BitXor,
        TokenType::AmpersandAmpersand => BinaryOp::LogicalAnd,
        TokenType::PipePipe => BinaryOp::LogicalOr,
        TokenType::EqualEqual => BinaryOp::Equal,
        TokenType::BangEqual => BinaryOp::NotEqual,
        TokenType::Less => BinaryOp::Less,
        TokenType::Greater => BinaryOp::Greater,
        TokenType::LessEqual => BinaryOp::LessEqual,
        TokenType::GreaterEqual => BinaryOp::GreaterEqual,
        _ => return None,
    };
    Some(op)
}
