//! Dormouse Lexer
//! 
//! Tokenizes dormouse source code into a stream of tokens.
//! Newlines are significant and are emitted as tokens; `//` comments are
//! dropped. `@import` and `@define` directives are collected separately and
//! never reach the parser.

pub mod token;
pub mod literals;
pub mod directives;

pub use token::{Token, TokenType};
pub use directives::{Define, Import};

use dmc_common::{CompilerError, SourceLocation, ValueType};
use log::trace;
use std::collections::HashMap;

/// Everything produced by lexing one source file
#[derive(Debug, Clone, PartialEq)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub imports: Vec<Import>,
    pub defines: Vec<Define>,
}

/// Dormouse lexer
pub struct Lexer {
    pub(crate) input: Vec<char>,
    pub(crate) position: usize,
    pub(crate) line: u32,
    pub(crate) column: u32,
    filename: String,
    keywords: HashMap<&'static str, TokenType>,
    pub(crate) imports: Vec<Import>,
    pub(crate) defines: Vec<Define>,
}

impl Lexer {
    /// Create a new lexer for the named file
    pub fn new(input: &str, filename: &str) -> Self {
        let mut lexer = Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            filename: filename.to_string(),
            keywords: HashMap::new(),
            imports: Vec::new(),
            defines: Vec::new(),
        };

        lexer.initialize_keywords();
        lexer
    }

    fn initialize_keywords(&mut self) {
        let keywords = [
            ("if", TokenType::If),
            ("else", TokenType::Else),
            ("for", TokenType::For),
            ("while", TokenType::While),
            ("return", TokenType::Return),
            ("break", TokenType::Break),
            ("continue", TokenType::Continue),
            ("as", TokenType::As),
            ("typedef", TokenType::Typedef),
            ("true", TokenType::True),
            ("false", TokenType::False),
            ("string", TokenType::Type(ValueType::String)),
            ("int", TokenType::Type(ValueType::Int)),
            ("float", TokenType::Type(ValueType::Float)),
            ("double", TokenType::Type(ValueType::Double)),
            ("bool", TokenType::Type(ValueType::Bool)),
            ("void", TokenType::Type(ValueType::Void)),
        ];

        self.keywords.extend(keywords);
    }

    pub(crate) fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    pub(crate) fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    pub(crate) fn advance(&mut self) -> Option<char> {
        let ch = self.current_char()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        SourceLocation::new(&self.filename, self.line, self.column)
    }

    /// Skip whitespace (except newlines)
    pub(crate) fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() && ch != '\n' {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skip a `//` comment up to (not including) the end of the line
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    pub(crate) fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        word
    }

    fn tokenize_identifier(&mut self) -> TokenType {
        let identifier = self.read_word();
        match self.keywords.get(identifier.as_str()) {
            Some(keyword) => keyword.clone(),
            None => TokenType::Identifier(identifier),
        }
    }

    /// Consume `second` if it follows, choosing between two token types
    fn one_or_two(&mut self, second: char, double: TokenType, single: TokenType) -> TokenType {
        self.advance();
        if self.current_char() == Some(second) {
            self.advance();
            double
        } else {
            single
        }
    }

    /// Get the next token, processing any directives on the way
    pub fn next_token(&mut self) -> Result<Token, CompilerError> {
        loop {
            self.skip_whitespace();

            if self.current_char() == Some('/') && self.peek_char(1) == Some('/') {
                self.skip_line_comment();
                continue;
            }

            if self.current_char() == Some('@') {
                self.tokenize_directive()?;
                continue;
            }

            break;
        }

        let location = self.current_location();

        let token_type = match self.current_char() {
            None => TokenType::EndOfFile,

            Some('\n') => {
                self.advance();
                TokenType::Newline
            }

            Some(ch) if ch.is_alphabetic() || ch == '_' => self.tokenize_identifier(),

            Some(ch) if ch.is_ascii_digit() => self.tokenize_integer()?,

            Some('"') => self.tokenize_string_literal()?,

            Some('=') => self.one_or_two('=', TokenType::EqualEqual, TokenType::Equal),
            Some('!') => self.one_or_two('=', TokenType::BangEqual, TokenType::Bang),
            Some('<') => self.one_or_two('=', TokenType::LessEqual, TokenType::Less),
            Some('>') => self.one_or_two('=', TokenType::GreaterEqual, TokenType::Greater),
            Some('&') => self.one_or_two('&', TokenType::AmpersandAmpersand, TokenType::Ampersand),
            Some('|') => self.one_or_two('|', TokenType::PipePipe, TokenType::Pipe),

            Some(ch) => {
                let token_type = match ch {
                    '+' => TokenType::Plus,
                    '-' => TokenType::Minus,
                    '*' => TokenType::Star,
                    '/' => TokenType::Slash,
                    '%' => TokenType::Percent,
                    '^' => TokenType::Caret,
                    '~' => TokenType::Tilde,
                    '(' => TokenType::LeftParen,
                    ')' => TokenType::RightParen,
                    '{' => TokenType::LeftBrace,
                    '}' => TokenType::RightBrace,
                    '[' => TokenType::LeftBracket,
                    ']' => TokenType::RightBracket,
                    ',' => TokenType::Comma,
                    _ => {
                        return Err(CompilerError::lexer_error(
                            format!("Unexpected character '{ch}'"),
                            location,
                        ));
                    }
                };
                self.advance();
                token_type
            }
        };

        Ok(Token::new(token_type, location))
    }

    /// Tokenize the whole input
    pub fn tokenize(mut self) -> Result<LexOutput, CompilerError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.token_type, TokenType::EndOfFile);
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        trace!(
            "Lexed {}: {} tokens, {} imports, {} defines",
            self.filename,
            tokens.len(),
            self.imports.len(),
            self.defines.len()
        );

        Ok(LexOutput {
            tokens,
            imports: self.imports,
            defines: self.defines,
        })
    }
}
