//! Low-level line helpers shared by the macro expander and the line
//! parser: comment stripping, whitespace trimming, and the small
//! character-class checks label validation needs.
//!
//! Grounded on the teacher's `char.rs`/`lexer.rs` pair, scaled down
//! from a full-language tokenizer to the handful of classifications a
//! line-oriented assembler syntax actually needs.

/// Maximum length of a label, per spec §4.2's validation regex
/// (`[A-Za-z][A-Za-z0-9]{0,30}`: 1 + 30 = 31 characters).
pub const MAX_LABEL_LEN: usize = 31;

/// Strip a trailing `;...` comment, if any. A line whose first
/// non-space character is `;` is handled separately by the caller
/// (spec §4.1: "Comment line: first non-space char is `;`").
pub fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// True if the line (after trimming) is empty or begins with `;`.
pub fn is_comment_or_blank(trimmed: &str) -> bool {
    trimmed.is_empty() || trimmed.starts_with(';')
}

/// Split a line into whitespace-separated tokens, preserving nothing
/// about original spacing (used only where spacing doesn't matter,
/// e.g. macro invocation/definition header lines).
pub fn split_whitespace_tokens(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

fn is_label_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_label_cont(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

/// Validate a label against spec §4.2: `[A-Za-z][A-Za-z0-9]{0,30}`.
pub fn is_valid_label(s: &str) -> bool {
    if s.is_empty() || s.len() > MAX_LABEL_LEN {
        return false;
    }
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    is_label_start(first) && chars.all(is_label_cont)
}

const RESERVED: &[&str] = &[
    "mov", "cmp", "add", "sub", "lea", "clr", "not", "inc", "dec", "jmp", "bne", "jsr", "red",
    "prn", "rts", "stop", "mcro", "endmcro", "data", "string", "entry", "extern", "r0", "r1",
    "r2", "r3", "r4", "r5", "r6", "r7",
];

/// True if `s` collides with an opcode, directive keyword, a register
/// name, or `mcro`/`endmcro` (spec §4.1/§4.2).
pub fn is_reserved_word(s: &str) -> bool {
    RESERVED.contains(&s)
}
