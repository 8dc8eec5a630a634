//! Literal lexing for integers and strings

use crate::lexer::{Lexer, TokenType};
use dmc_common::{parse_integer_literal, CompilerError};

impl Lexer {
    /// Tokenize an integer literal (decimal, or `0x` / `0o` / `0b` prefixed)
    pub fn tokenize_integer(&mut self) -> Result<TokenType, CompilerError> {
        let location = self.current_location();
        let text = self.read_word();

        parse_integer_literal(&text)
            .map(TokenType::IntLiteral)
            .ok_or_else(|| CompilerError::lexer_error(
                format!("Invalid integer literal: {text}"),
                location,
            ))
    }

    /// Tokenize a double-quoted string literal
    pub fn tokenize_string_literal(&mut self) -> Result<TokenType, CompilerError> {
        let start = self.current_location();
        self.advance(); // Skip opening quote
        let mut string = String::new();

        loop {
            match self.current_char() {
                None | Some('\n') => {
                    return Err(CompilerError::lexer_error(
                        "Unterminated string literal".to_string(),
                        start,
                    ));
                }
                Some('"') => {
                    self.advance();
                    return Ok(TokenType::StringLiteral(string));
                }
                Some('\\') => {
                    self.advance();
                    let escaped = match self.current_char() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('0') => '\0',
                        Some(c) => {
                            return Err(CompilerError::lexer_error(
                                format!("Invalid escape sequence: \\{c}"),
                                self.current_location(),
                            ));
                        }
                        None => {
                            return Err(CompilerError::lexer_error(
                                "Unterminated string literal".to_string(),
                                start,
                            ));
                        }
                    };
                    self.advance();
                    string.push(escaped);
                }
                Some(ch) => {
                    self.advance();
                    string.push(ch);
                }
            }
        }
    }
}
