//! Dormouse Pratt Parser
//! 
//! Parses the newline-significant token stream into an AST. Errors do not
//! abort the parse: each one is recorded and the parser skips ahead to the
//! next top-level statement boundary before continuing.

pub mod errors;
pub mod precedence;
pub mod statements;
pub mod expressions;

use crate::ast::*;
use crate::lexer::{Token, TokenType};
use dmc_common::{SourceLocation, ValueType};
use log::debug;

pub use errors::ParseError;
pub use precedence::Precedence;

/// Dormouse parser
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    /// Nesting depth of the braces consumed so far
    depth: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last().map(|t| &t.token_type), Some(TokenType::EndOfFile)) {
            let location = tokens
                .last()
                .map(|t| t.location.clone())
                .unwrap_or_default();
            tokens.push(Token::eof(location));
        }

        Self { tokens, position: 0, depth: 0 }
    }

    /// Peek at the current token without consuming it
    pub(crate) fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    /// Peek `n` tokens ahead; past the end this is the EOF token
    pub(crate) fn peek_nth(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.position + n).min(last)]
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        match token.token_type {
            TokenType::EndOfFile => return token,
            TokenType::LeftBrace => self.depth += 1,
            TokenType::RightBrace => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
        self.position += 1;
        token
    }

    /// Check if the current token matches the expected type
    pub(crate) fn check(&self, token_type: &TokenType) -> bool {
        std::mem::discriminant(&self.peek().token_type) == std::mem::discriminant(token_type)
    }

    pub(crate) fn check_nth(&self, n: usize, token_type: &TokenType) -> bool {
        std::mem::discriminant(&self.peek_nth(n).token_type) == std::mem::discriminant(token_type)
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location.clone()
    }

    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        if matches!(token.token_type, TokenType::EndOfFile) {
            ParseError::UnexpectedEndOfFile {
                expected: expected.to_string(),
                location: token.location.clone(),
            }
        } else {
            ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.token_type.clone(),
                location: token.location.clone(),
            }
        }
    }

    /// Expect and consume a specific token type
    pub(crate) fn expect(&mut self, token_type: TokenType, context: &str) -> Result<Token, ParseError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("'{token_type}' in {context}")))
        }
    }

    pub(crate) fn expect_identifier(&mut self, context: &str) -> Result<String, ParseError> {
        match &self.peek().token_type {
            TokenType::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(&format!("identifier in {context}"))),
        }
    }

    pub(crate) fn expect_type(&mut self, context: &str) -> Result<ValueType, ParseError> {
        match self.peek().token_type {
            TokenType::Type(value_type) => {
                self.advance();
                Ok(value_type)
            }
            _ => Err(self.unexpected(&format!("type in {context}"))),
        }
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.check(&TokenType::Newline) {
            self.advance();
        }
    }

    /// A statement ends at a newline, or just before a closing brace or EOF
    pub(crate) fn expect_statement_end(&mut self) -> Result<(), ParseError> {
        match self.peek().token_type {
            TokenType::Newline => {
                self.advance();
                Ok(())
            }
            TokenType::RightBrace | TokenType::EndOfFile => Ok(()),
            _ => Err(self.unexpected("end of statement")),
        }
    }

    /// Skip to the next newline outside of any braces, or to the end of the
    /// file when a brace is never closed
    fn synchronize(&mut self) {
        while !self.check(&TokenType::EndOfFile)
            && !(self.depth == 0 && self.check(&TokenType::Newline))
        {
            self.advance();
        }
        debug!("Parser resynchronised at {}", self.current_location());
    }

    /// Parse a whole file
    pub fn parse_program(&mut self) -> Result<Program, Vec<ParseError>> {
        let mut functions = Vec::new();
        let mut errors = Vec::new();

        loop {
            self.skip_newlines();
            if self.check(&TokenType::EndOfFile) {
                break;
            }

            match self.parse_top_level_item() {
                Ok(function) => functions.push(function),
                Err(err) => {
                    errors.push(err);
                    self.synchronize();
                }
            }
        }

        if errors.is_empty() {
            Ok(Program { functions })
        } else {
            Err(errors)
        }
    }

    fn parse_top_level_item(&mut self) -> Result<FunctionDefinition, ParseError> {
        if self.is_function_definition_start() {
            let function = self.parse_function_definition()?;
            self.expect_statement_end()?;
            Ok(function)
        } else {
            let location = self.current_location();
            // Consume at least one token so that resynchronisation makes progress
            self.advance();
            Err(ParseError::TopLevelStatement { location })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Result<Program, Vec<ParseError>> {
        let tokens = Lexer::new(source, "test.dor").tokenize().unwrap().tokens;
        Parser::new(tokens).parse_program()
    }

    fn parse_expr(source: &str) -> Expression {
        let tokens = Lexer::new(source, "test.dor").tokenize().unwrap().tokens;
        Parser::new(tokens).parse_expression(Precedence::Lowest).unwrap()
    }

    /// Render an expression fully parenthesised
    fn show(expr: &Expression) -> String {
        match &expr.kind {
            ExpressionKind::Identifier(name) => name.clone(),
            ExpressionKind::IntegerLiteral(v) => v.to_string(),
            ExpressionKind::StringLiteral(s) => format!("{s:?}"),
            ExpressionKind::Boolean(b) => b.to_string(),
            ExpressionKind::Prefix { op, operand } => format!("({op}{})", show(operand)),
            ExpressionKind::Infix { op, left, right } => {
                format!("({} {op} {})", show(left), show(right))
            }
            ExpressionKind::Call { function, arguments } => {
                let args: Vec<String> = arguments.iter().map(show).collect();
                format!("{function}({})", args.join(", "))
            }
            ExpressionKind::If { .. } => "if".to_string(),
            ExpressionKind::While { .. } => "while".to_string(),
        }
    }

    #[test]
    fn test_operator_precedence() {
        assert_eq!(show(&parse_expr("1 + 2 * 3")), "(1 + (2 * 3))");
        assert_eq!(show(&parse_expr("a - b - c")), "((a - b) - c)");
        assert_eq!(show(&parse_expr("a + b < c * d")), "((a + b) < (c * d))");
        assert_eq!(show(&parse_expr("a ^ b + c")), "(a ^ (b + c))");
        assert_eq!(show(&parse_expr("-a * b")), "((-a) * b)");
        assert_eq!(show(&parse_expr("(1 + 2) * 3")), "((1 + 2) * 3)");
        assert_eq!(show(&parse_expr("a == b != c")), "((a == b) != c)");
        assert_eq!(show(&parse_expr("x % 2 == 0")), "((x % 2) == 0)");
    }

    #[test]
    fn test_call_expression() {
        assert_eq!(show(&parse_expr("add(1, b * 2, f(x))")), "add(1, (b * 2), f(x))");
        assert_eq!(show(&parse_expr("g() + 1")), "(g() + 1)");
    }

    #[test]
    fn test_parse_function_definition() {
        let program = parse("int add(int a, int b) {\n    return a + b\n}\n").unwrap();
        assert_eq!(program.functions.len(), 1);

        let function = &program.functions[0];
        assert_eq!(function.name, "add");
        assert_eq!(function.return_type, ValueType::Int);
        let params: Vec<(&str, ValueType)> = function
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p.param_type))
            .collect();
        assert_eq!(params, vec![("a", ValueType::Int), ("b", ValueType::Int)]);
        assert!(function.body.ends_with_return());
    }

    #[test]
    fn test_statement_kinds() {
        let source = "int main() {\n    int x = 5\n    x = x + 1\n    print(x)\n    return x\n}\n";
        let program = parse(source).unwrap();
        let statements = &program.functions[0].body.statements;
        assert_eq!(statements.len(), 4);
        assert!(matches!(&statements[0].kind, StatementKind::Var { name, var_type: ValueType::Int, .. } if name == "x"));
        assert!(matches!(&statements[1].kind, StatementKind::Reassign { name, .. } if name == "x"));
        assert!(matches!(
            &statements[2].kind,
            StatementKind::Expression(Expression { kind: ExpressionKind::Call { .. }, .. })
        ));
        assert!(matches!(&statements[3].kind, StatementKind::Return(_)));
    }

    #[test]
    fn test_if_else_and_while() {
        let source = "int main() {\n    if (x > 2) { x = 1 } else { x = 0 }\n    while (i < 3) {\n        i = i + 1\n    }\n    return x\n}\n";
        let program = parse(source).unwrap();
        let statements = &program.functions[0].body.statements;
        match &statements[0].kind {
            StatementKind::Expression(Expression { kind: ExpressionKind::If { condition, consequence, alternative }, .. }) => {
                assert_eq!(show(condition), "(x > 2)");
                assert_eq!(consequence.statements.len(), 1);
                assert_eq!(alternative.as_ref().map(|b| b.statements.len()), Some(1));
            }
            other => panic!("Expected if expression, got {other:?}"),
        }
        match &statements[1].kind {
            StatementKind::Expression(Expression { kind: ExpressionKind::While { condition, body }, .. }) => {
                assert_eq!(show(condition), "(i < 3)");
                assert_eq!(body.statements.len(), 1);
            }
            other => panic!("Expected while expression, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_function_definition() {
        let source = "int main() {\n    int helper(int a) {\n        return a\n    }\n    return helper(2)\n}\n";
        let program = parse(source).unwrap();
        let statements = &program.functions[0].body.statements;
        assert!(matches!(&statements[0].kind, StatementKind::Function(f) if f.name == "helper"));
    }

    #[test]
    fn test_top_level_statement_is_rejected() {
        let errors = parse("int x = 5\nint main() {\n    return 0\n}\n").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ParseError::TopLevelStatement { .. }));
        assert_eq!(errors[0].location().line, 1);
    }

    #[test]
    fn test_errors_are_collected_across_functions() {
        let source = "int a() {\n    return +\n}\nint b() {\n    int = 3\n}\nint c() {\n    return 1\n}\n";
        let errors = parse(source).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].location().line, 2);
        assert_eq!(errors[1].location().line, 5);
    }

    #[test]
    fn test_unsupported_keyword_statement() {
        let errors = parse("int main() {\n    break\n}\n").unwrap_err();
        assert!(matches!(errors[0], ParseError::UnsupportedStatement { keyword: TokenType::Break, .. }));
    }

    #[test]
    fn test_missing_closing_brace() {
        let errors = parse("int main() {\n    return 0\n").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ParseError::UnexpectedEndOfFile { .. }));
    }

    #[test]
    fn test_error_inside_unclosed_block_stops_at_end_of_file() {
        let errors = parse("int main() {\n    if (x > 1) {\n        return +\n").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].location().line, 3);
    }
}
