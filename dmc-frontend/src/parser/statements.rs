//! Statement, block and function definition parsing

use crate::ast::*;
use crate::lexer::TokenType;
use crate::parser::{ParseError, Parser, Precedence};
use dmc_common::ValueType;

impl Parser {
    /// `TYPE IDENT (` starts a function definition
    pub(crate) fn is_function_definition_start(&self) -> bool {
        matches!(self.peek().token_type, TokenType::Type(_))
            && matches!(self.peek_nth(1).token_type, TokenType::Identifier(_))
            && self.check_nth(2, &TokenType::LeftParen)
    }

    /// Parse `TYPE name(TYPE a, TYPE b) { ... }`
    pub fn parse_function_definition(&mut self) -> Result<FunctionDefinition, ParseError> {
        let location = self.current_location();
        let return_type = self.expect_type("function definition")?;
        let name = self.expect_identifier("function definition")?;

        self.expect(TokenType::LeftParen, "function parameters")?;
        let mut parameters = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                let param_location = self.current_location();
                let param_type = self.expect_type("function parameters")?;
                let param_name = self.expect_identifier("function parameters")?;
                parameters.push(Parameter {
                    name: param_name,
                    param_type,
                    location: param_location,
                });

                if self.check(&TokenType::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenType::RightParen, "function parameters")?;

        let body = self.parse_block("function body")?;

        Ok(FunctionDefinition {
            name,
            parameters,
            return_type,
            body,
            location,
        })
    }

    /// Parse `{ statement* }`; newlines inside are free-form
    pub fn parse_block(&mut self, context: &str) -> Result<Block, ParseError> {
        let location = self.current_location();
        self.expect(TokenType::LeftBrace, context)?;

        let mut statements = Vec::new();
        loop {
            self.skip_newlines();
            if self.check(&TokenType::RightBrace) {
                break;
            }
            if self.check(&TokenType::EndOfFile) {
                return Err(self.unexpected(&format!("'}}' to close {context}")));
            }

            statements.push(self.parse_statement()?);
            self.expect_statement_end()?;
        }

        self.expect(TokenType::RightBrace, context)?;
        Ok(Block { statements, location })
    }

    /// Parse one statement, without its terminator
    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let location = self.current_location();

        let kind = match &self.peek().token_type {
            TokenType::Type(_) if self.is_function_definition_start() => {
                StatementKind::Function(self.parse_function_definition()?)
            }
            TokenType::Type(_) => self.parse_var_statement()?,
            TokenType::Return => {
                self.advance();
                StatementKind::Return(self.parse_expression(Precedence::Lowest)?)
            }
            TokenType::Identifier(_) if self.check_nth(1, &TokenType::Equal) => {
                let name = self.expect_identifier("assignment")?;
                self.advance(); // '='
                let value = self.parse_expression(Precedence::Lowest)?;
                StatementKind::Reassign { name, value }
            }
            keyword @ (TokenType::For
            | TokenType::Break
            | TokenType::Continue
            | TokenType::As
            | TokenType::Typedef) => {
                return Err(ParseError::UnsupportedStatement {
                    keyword: keyword.clone(),
                    location,
                });
            }
            _ => StatementKind::Expression(self.parse_expression(Precedence::Lowest)?),
        };

        Ok(Statement { kind, location })
    }

    /// `TYPE name = value`
    fn parse_var_statement(&mut self) -> Result<StatementKind, ParseError> {
        let location = self.current_location();
        let var_type = self.expect_type("variable declaration")?;
        if var_type == ValueType::Void {
            return Err(ParseError::InvalidExpression {
                message: "variables cannot be declared void".to_string(),
                location,
            });
        }

        let name = self.expect_identifier("variable declaration")?;
        self.expect(TokenType::Equal, "variable declaration")?;
        let value = self.parse_expression(Precedence::Lowest)?;

        Ok(StatementKind::Var { name, var_type, value })
    }
}
