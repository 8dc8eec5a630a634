//! Pratt expression parsing

use crate::ast::*;
use crate::lexer::TokenType;
use crate::parser::precedence::binary_op;
use crate::parser::{ParseError, Parser, Precedence};

impl Parser {
    /// Parse an expression whose operators bind tighter than `precedence`
    pub fn parse_expression(&mut self, precedence: Precedence) -> Result<Expression, ParseError> {
        let mut left = self.parse_prefix()?;

        while !self.check(&TokenType::Newline) && precedence < Precedence::of(&self.peek().token_type) {
            left = if self.check(&TokenType::LeftParen) {
                self.parse_call(left)?
            } else {
                self.parse_infix(left)?
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expression, ParseError> {
        let location = self.current_location();

        let kind = match self.peek().token_type.clone() {
            TokenType::Identifier(name) => {
                self.advance();
                ExpressionKind::Identifier(name)
            }
            TokenType::IntLiteral(value) => {
                self.advance();
                ExpressionKind::IntegerLiteral(value)
            }
            TokenType::StringLiteral(value) => {
                self.advance();
                ExpressionKind::StringLiteral(value)
            }
            TokenType::True => {
                self.advance();
                ExpressionKind::Boolean(true)
            }
            TokenType::False => {
                self.advance();
                ExpressionKind::Boolean(false)
            }
            TokenType::Minus | TokenType::Bang | TokenType::Tilde => {
                let op = match self.advance().token_type {
                    TokenType::Minus => PrefixOp::Neg,
                    TokenType::Bang => PrefixOp::Not,
                    _ => PrefixOp::BitNot,
                };
                let operand = self.parse_expression(Precedence::Prefix)?;
                ExpressionKind::Prefix { op, operand: Box::new(operand) }
            }
            TokenType::LeftParen => {
                self.advance();
                let inner = self.parse_expression(Precedence::Lowest)?;
                self.expect(TokenType::RightParen, "parenthesised expression")?;
                return Ok(inner);
            }
            TokenType::If => return self.parse_if_expression(),
            TokenType::While => return self.parse_while_expression(),
            TokenType::EndOfFile => return Err(self.unexpected("expression")),
            other => {
                return Err(ParseError::InvalidExpression {
                    message: format!("unexpected '{other}' at start of expression"),
                    location,
                });
            }
        };

        Ok(Expression::new(kind, location))
    }

    fn parse_infix(&mut self, left: Expression) -> Result<Expression, ParseError> {
        let location = self.current_location();
        let token = self.advance();
        let op = binary_op(&token.token_type).ok_or_else(|| ParseError::InvalidExpression {
            message: format!("'{}' is not an infix operator", token.token_type),
            location,
        })?;

        let right = self.parse_expression(Precedence::of(&token.token_type))?;
        let location = left.location.clone();

        Ok(Expression::new(
            ExpressionKind::Infix {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            location,
        ))
    }

    /// `name(arg, ...)`; only named functions can be called
    fn parse_call(&mut self, callee: Expression) -> Result<Expression, ParseError> {
        let function = match callee.kind {
            ExpressionKind::Identifier(name) => name,
            _ => {
                return Err(ParseError::InvalidExpression {
                    message: "only named functions can be called".to_string(),
                    location: callee.location,
                });
            }
        };

        self.expect(TokenType::LeftParen, "call arguments")?;
        let mut arguments = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                arguments.push(self.parse_expression(Precedence::Lowest)?);
                if self.check(&TokenType::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenType::RightParen, "call arguments")?;

        Ok(Expression::new(
            ExpressionKind::Call { function, arguments },
            callee.location,
        ))
    }

    /// `if (cond) { ... } else { ... }`
    fn parse_if_expression(&mut self) -> Result<Expression, ParseError> {
        let location = self.current_location();
        self.expect(TokenType::If, "if expression")?;
        self.expect(TokenType::LeftParen, "if condition")?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenType::RightParen, "if condition")?;

        let consequence = self.parse_block("if body")?;
        let alternative = if self.check(&TokenType::Else) {
            self.advance();
            Some(self.parse_block("else body")?)
        } else {
            None
        };

        Ok(Expression::new(
            ExpressionKind::If {
                condition: Box::new(condition),
                consequence,
                alternative,
            },
            location,
        ))
    }

    /// `while (cond) { ... }`
    fn parse_while_expression(&mut self) -> Result<Expression, ParseError> {
        let location = self.current_location();
        self.expect(TokenType::While, "while expression")?;
        self.expect(TokenType::LeftParen, "while condition")?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenType::RightParen, "while condition")?;

        let body = self.parse_block("while body")?;

        Ok(Expression::new(
            ExpressionKind::While {
                condition: Box::new(condition),
                body,
            },
            location,
        ))
    }
}
