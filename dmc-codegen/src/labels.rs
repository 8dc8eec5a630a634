//! Label/condition counter and control-flow label names
//! 
//! The counter is threaded by value through every `generate` call of a
//! compilation run, so labels stay unique after per-file outputs are
//! concatenated. Each if/while construct consumes exactly one value.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LabelCounter(u32);

impl LabelCounter {
    pub fn new(start: u32) -> Self {
        LabelCounter(start)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Take the current value and advance
    pub fn next(&mut self) -> u32 {
        let n = self.0;
        self.0 += 1;
        n
    }
}

impl fmt::Display for LabelCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Labels of one if construct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfLabels {
    pub true_label: String,
    pub false_label: String,
    pub end_label: String,
}

impl IfLabels {
    pub fn new(n: u32) -> Self {
        Self {
            true_label: format!("if{n}_true"),
            false_label: format!("if{n}_false"),
            end_label: format!("if{n}_end"),
        }
    }
}

/// Labels of one while construct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhileLabels {
    pub compare_label: String,
    pub body_label: String,
    pub end_label: String,
}

impl WhileLabels {
    pub fn new(n: u32) -> Self {
        Self {
            compare_label: format!("while{n}_compare"),
            body_label: format!("while{n}_body"),
            end_label: format!("while{n}_end"),
        }
    }
}

/// Label of a pooled string literal
pub fn string_label(n: u32) -> String {
    format!(".Lstr{n}")
}
