//! Common type definitions used across the compiler

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Declared type of a variable, parameter or function result
/// 
/// The language is explicitly typed at declaration sites and the backend
/// trusts these declarations; no inference happens anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Int,
    Bool,
    String,
    Float,
    Double,
    Void,
}

impl ValueType {
    /// Every stack slot is one machine word
    pub const SLOT_SIZE: u32 = 8;

    /// Look up a type keyword
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(ValueType::Int),
            "bool" => Some(ValueType::Bool),
            "string" => Some(ValueType::String),
            "float" => Some(ValueType::Float),
            "double" => Some(ValueType::Double),
            "void" => Some(ValueType::Void),
            _ => None,
        }
    }

    /// Bytes this type occupies in a function's stack layout.
    /// 
    /// Scalar types all share one uniform slot; layouts are not
    /// differentiated per type. `void` occupies nothing.
    pub fn storage_size(&self) -> u32 {
        match self {
            ValueType::Void => 0,
            _ => Self::SLOT_SIZE,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, ValueType::Void)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Int => "int",
            ValueType::Bool => "bool",
            ValueType::String => "string",
            ValueType::Float => "float",
            ValueType::Double => "double",
            ValueType::Void => "void",
        };
        write!(f, "{name}")
    }
}

/// Compile-time constants collected from `@define` directives
/// 
/// Values are kept as the raw text that followed the name; whether that text
/// is a valid literal is only decided when code generation consults it.
/// Ordered so that iteration (and therefore any output derived from it) is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantTable {
    entries: BTreeMap<String, String>,
}

impl ConstantTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) a constant, returning the value it replaced
    pub fn define(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConstantTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = ConstantTable::new();
        for (name, value) in iter {
            table.define(name, value);
        }
        table
    }
}

/// Parse an integer literal, inferring the base from its prefix
/// 
/// Accepts an optional sign, then `0x`/`0X` (hex), `0o`/`0O` (octal),
/// `0b`/`0B` (binary), a bare leading `0` (octal) or plain decimal.
pub fn parse_integer_literal(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let (radix, body) = if let Some(rest) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        (16, rest)
    } else if let Some(rest) = digits.strip_prefix("0o").or_else(|| digits.strip_prefix("0O")) {
        (8, rest)
    } else if let Some(rest) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        (2, rest)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    if body.is_empty() || body.starts_with('+') || body.starts_with('-') {
        return None;
    }

    // Parse the magnitude as u64 so that i64::MIN round-trips
    let magnitude = u64::from_str_radix(body, radix).ok()?;
    if negative {
        if magnitude == i64::MIN.unsigned_abs() {
            Some(i64::MIN)
        } else {
            i64::try_from(magnitude).ok().map(|v| -v)
        }
    } else {
        i64::try_from(magnitude).ok()
    }
}
