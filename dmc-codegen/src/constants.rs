//! Compile-time constant substitution

use crate::error::CodegenError;
use dmc_common::{parse_integer_literal, ConstantTable, SourceLocation};

/// Resolve `name` against the constant table.
/// 
/// `Ok(None)` when no such constant exists; a constant whose text is not an
/// integer (or `true`/`false`) literal is a `MalformedConstant` error.
pub fn resolve_constant(
    constants: &ConstantTable,
    name: &str,
    location: &SourceLocation,
) -> Result<Option<i64>, CodegenError> {
    let Some(text) = constants.get(name) else {
        return Ok(None);
    };

    let value = match text {
        "true" => Some(1),
        "false" => Some(0),
        _ => parse_integer_literal(text),
    };

    value
        .map(Some)
        .ok_or_else(|| CodegenError::MalformedConstant {
            name: name.to_string(),
            value: text.to_string(),
            location: location.clone(),
        })
}
