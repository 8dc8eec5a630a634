//! Variable Layout Table
//!
//! Per-function, declaration-ordered record of the variables that live in
//! the stack frame. A variable's byte offset is the sum of the storage sizes
//! of every entry declared before it: a flat linear scan, with no alignment
//! or packing. Reassignment never adds an entry, and there is no removal.

use crate::error::CodegenError;
use dmc_common::ValueType;
use log::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
struct LayoutEntry {
    name: String,
    value_type: ValueType,
}

#[derive(Debug, Clone)]
pub struct VariableLayout {
    entries: Vec<LayoutEntry>,
    /// Bytes available for locals in the fixed-size frame
    capacity: u32,
}

impl VariableLayout {
    pub fn new(capacity: u32) -> Self {
        Self { entries: Vec::new(), capacity }
    }

    /// Append a variable, returning the byte offset it occupies
    pub fn declare(&mut self, name: &str, value_type: ValueType) -> Result<u32, CodegenError> {
        let offset = self.total_size();
        if offset + value_type.storage_size() > self.capacity {
            return Err(CodegenError::StackExhausted {
                name: name.to_string(),
                limit: self.capacity,
            });
        }

        self.entries.push(LayoutEntry {
            name: name.to_string(),
            value_type,
        });
        debug!("layout: '{name}' ({value_type}) at offset {offset}");
        Ok(offset)
    }

    /// Offset of the most recently declared entry called `name`
    pub fn offset_of(&self, name: &str) -> Option<u32> {
        let index = self.entries.iter().rposition(|e| e.name == name)?;
        Some(
            self.entries[..index]
                .iter()
                .map(|e| e.value_type.storage_size())
                .sum(),
        )
    }

    /// Bytes used by every declared entry
    pub fn total_size(&self) -> u32 {
        self.entries.iter().map(|e| e.value_type.storage_size()).sum()
    }

}
