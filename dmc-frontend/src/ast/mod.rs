//! Abstract Syntax Tree definitions for dormouse
//! 
//! The AST is built by the parser and consumed, read-only, by the backends.
//! Every node carries the `SourceLocation` of its first token.

pub mod ops;
pub mod expressions;
pub mod statements;

pub use ops::{BinaryOp, PrefixOp};
pub use expressions::{Expression, ExpressionKind};
pub use statements::{Block, FunctionDefinition, Parameter, Program, Statement, StatementKind};
