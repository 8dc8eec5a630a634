//! Statement AST nodes and function definitions

use super::expressions::Expression;
use dmc_common::{SourceLocation, ValueType};
use serde::{Deserialize, Serialize};

/// One parsed source file: its top-level function definitions in order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<FunctionDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: ValueType,
    pub body: Block,
    pub location: SourceLocation,
}

impl FunctionDefinition {
    /// The program entry point gets global visibility
    pub fn is_entry_point(&self) -> bool {
        self.name == "main"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub param_type: ValueType,
    pub location: SourceLocation,
}

/// A braced statement list. Blocks share the enclosing function's variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub location: SourceLocation,
}

impl Block {
    pub fn ends_with_return(&self) -> bool {
        matches!(
            self.statements.last().map(|s| &s.kind),
            Some(StatementKind::Return(_))
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementKind {
    /// `TYPE name = value`
    Var {
        name: String,
        var_type: ValueType,
        value: Expression,
    },

    /// `name = value`
    Reassign {
        name: String,
        value: Expression,
    },

    Return(Expression),

    /// Evaluated for its side effects
    Expression(Expression),

    /// A function defined inside another function's body
    Function(FunctionDefinition),
}
