//! Parse error types
//! 
//! The parser records every error it meets and resynchronises at the next
//! statement boundary, so a single run can report several of these.

use crate::lexer::TokenType;
use dmc_common::{CompilerError, SourceLocation};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{location}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: TokenType,
        location: SourceLocation,
    },

    #[error("{location}: unexpected end of file, expected {expected}")]
    UnexpectedEndOfFile {
        expected: String,
        location: SourceLocation,
    },

    #[error("{location}: {message}")]
    InvalidExpression {
        message: String,
        location: SourceLocation,
    },

    #[error("{location}: only function definitions may appear at the top level")]
    TopLevelStatement { location: SourceLocation },

    #[error("{location}: '{keyword}' statements are not supported")]
    UnsupportedStatement {
        keyword: TokenType,
        location: SourceLocation,
    },
}

impl ParseError {
    pub fn location(&self) -> &SourceLocation {
        match self {
            ParseError::UnexpectedToken { location, .. }
            | ParseError::UnexpectedEndOfFile { location, .. }
            | ParseError::InvalidExpression { location, .. }
            | ParseError::TopLevelStatement { location }
            | ParseError::UnsupportedStatement { location, .. } => location,
        }
    }
}

impl From<ParseError> for CompilerError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnexpectedToken { expected, found, location } => {
                CompilerError::parse_error(format!("Expected {expected}, found {found}"), location)
            }
            ParseError::UnexpectedEndOfFile { expected, location } => {
                CompilerError::parse_error(format!("Unexpected end of file, expected {expected}"), location)
            }
            ParseError::InvalidExpression { message, location } => {
                CompilerError::parse_error(message, location)
            }
            ParseError::TopLevelStatement { location } => CompilerError::parse_error(
                "Only function definitions may appear at the top level".to_string(),
                location,
            ),
            ParseError::UnsupportedStatement { keyword, location } => CompilerError::parse_error(
                format!("'{keyword}' statements are not supported"),
                location,
            ),
        }
    }
}
