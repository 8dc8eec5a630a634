//! Dormouse Compiler - Frontend
//! 
//! This crate provides the frontend components for the dormouse compiler:
//! - Lexer: tokenizes `.dor` source and collects `@import` / `@define` directives
//! - Parser: Pratt parser building the AST from tokens
//! - AST: abstract syntax tree definitions shared with the backends

pub mod lexer;
pub mod parser;
pub mod ast;

pub use lexer::{Define, Import, LexOutput, Lexer, Token, TokenType};
pub use parser::{ParseError, Parser, Precedence};
pub use ast::{
    BinaryOp, Block, Expression, ExpressionKind, FunctionDefinition, Parameter, PrefixOp,
    Program, Statement, StatementKind,
};

use dmc_common::CompilerError;

/// High-level frontend interface
pub struct Frontend;

impl Frontend {
    /// Tokenize source code, collecting directives
    pub fn tokenize_source(source: &str, filename: &str) -> Result<LexOutput, CompilerError> {
        Lexer::new(source, filename).tokenize()
    }

    /// Parse already lexed tokens, returning every parse error found
    pub fn parse_tokens(tokens: Vec<Token>) -> Result<Program, Vec<CompilerError>> {
        Parser::new(tokens)
            .parse_program()
            .map_err(|errors| errors.into_iter().map(CompilerError::from).collect())
    }

    /// Lex and parse in one step, stopping at the first error
    pub fn parse_source(source: &str, filename: &str) -> Result<Program, CompilerError> {
        let lexed = Self::tokenize_source(source, filename)?;
        Self::parse_tokens(lexed.tokens).map_err(|errors| {
            errors.into_iter().next().unwrap_or_else(|| CompilerError::InternalError {
                message: "parse failed without reporting an error".to_string(),
            })
        })
    }

    /// Pretty JSON rendering of a parsed program
    pub fn program_to_json(program: &Program) -> Result<String, CompilerError> {
        serde_json::to_string_pretty(program).map_err(|e| CompilerError::InternalError {
            message: format!("Failed to serialize AST: {e}"),
        })
    }
}
