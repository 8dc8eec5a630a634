//! `@import` and `@define` directive handling

use crate::lexer::Lexer;
use dmc_common::{CompilerError, SourceLocation};
use serde::{Deserialize, Serialize};

/// `@import <name>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub name: String,
    pub location: SourceLocation,
}

/// `@define <NAME> <value>`; the value is kept as raw text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Define {
    pub name: String,
    pub value: String,
    pub location: SourceLocation,
}

impl Lexer {
    /// Lex a directive starting at `@` and record it
    pub(crate) fn tokenize_directive(&mut self) -> Result<(), CompilerError> {
        let location = self.current_location();
        self.advance(); // Skip '@'
        let directive = self.read_word();

        match directive.as_str() {
            "import" => {
                let name = self.directive_operand("@import", "module name")?;
                self.imports.push(Import { name, location });
            }
            "define" => {
                let name = self.directive_operand("@define", "constant name")?;
                let value = self.directive_operand("@define", "constant value")?;
                self.defines.push(Define { name, value, location });
            }
            _ => {
                return Err(CompilerError::lexer_error(
                    format!("Unknown directive '@{directive}'"),
                    location,
                ));
            }
        }

        Ok(())
    }

    /// Read the next whitespace-delimited operand on the current line
    fn directive_operand(&mut self, directive: &str, what: &str) -> Result<String, CompilerError> {
        self.skip_whitespace();
        let location = self.current_location();

        let mut operand = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                break;
            }
            operand.push(ch);
            self.advance();
        }

        if operand.is_empty() {
            return Err(CompilerError::lexer_error(
                format!("{directive} is missing its {what}"),
                location,
            ));
        }
        Ok(operand)
    }
}
