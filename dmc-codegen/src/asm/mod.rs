//! Assembly models for the supported targets
//! 
//! Generators build typed instruction lists; text is only produced at the
//! very end through the `Display` impls.

pub mod aarch64;
pub mod x86_64;

use std::fmt;

/// One line of an assembly listing
pub trait AsmLine: fmt::Display {
    /// Labels are printed flush left, everything else is indented
    fn is_label(&self) -> bool;
}

/// Render a listing, one instruction per line
pub fn render<I: AsmLine>(lines: &[I]) -> String {
    let mut out = String::new();
    for line in lines {
        if line.is_label() {
            out.push_str(&format!("{line}\n"));
        } else {
            out.push_str(&format!("\t{line}\n"));
        }
    }
    out
}

/// Quote a string for an `.asciz` directive
pub fn escape_asciz(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
