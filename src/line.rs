//! Per-line parsing: turns one source line into a [`ParsedLine`].
//!
//! `ParsedLine` is the "tagged variants replace `instruction_type_t`"
//! redesign named in spec §9, grounded on the shape of the teacher's
//! `ast.rs` (`Stmt`/`Expr` enums over a small closed set of forms).

use crate::error::{directive_arity, lexical, AsmResult};
use crate::lexer::{is_comment_or_blank, is_reserved_word, is_valid_label, strip_comment};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedLine {
    Blank,
    Comment,
    Data {
        label: Option<String>,
        operands: String,
    },
    Str {
        label: Option<String>,
        text: String,
    },
    Entry {
        name: String,
    },
    Extern {
        name: String,
    },
    Instruction {
        label: Option<String>,
        mnemonic: String,
        operands: Vec<String>,
    },
}

/// Parse one source line (no trailing newline) into a [`ParsedLine`].
pub fn parse_line(file: &str, line_no: usize, raw: &str) -> AsmResult<ParsedLine> {
    let trimmed = raw.trim();
    if trimmed.starts_with(';') {
        return Ok(ParsedLine::Comment);
    }
    let code = strip_comment(raw);
    let trimmed = code.trim();
    if is_comment_or_blank(trimmed) {
        return Ok(ParsedLine::Blank);
    }

    let mut rest = trimmed;
    let mut label = None;

    let first_tok = rest.split_whitespace().next().unwrap();
    if let Some(name) = first_tok.strip_suffix(':') {
        if name.is_empty() {
            return Err(lexical(file, line_no, "Invalid label name (empty)"));
        }
        if !is_valid_label(name) {
            return Err(lexical(file, line_no, format!("Invalid label name: {name}")));
        }
        if is_reserved_word(name) {
            return Err(lexical(
                file,
                line_no,
                format!("Label '{name}' collides with a reserved word"),
            ));
        }
        label = Some(name.to_string());
        rest = rest[first_tok.len()..].trim_start();
        if rest.is_empty() {
            return Err(lexical(
                file,
                line_no,
                "Label defined without instruction or directive",
            ));
        }
    }

    let directive_tok = rest.split_whitespace().next().unwrap();

    if let Some(directive) = directive_tok.strip_prefix('.') {
        let operand_str = rest[directive_tok.len()..].trim();
        return match directive {
            "data" => {
                if operand_str.is_empty() {
                    return Err(directive_arity(
                        file,
                        line_no,
                        "No data values specified for .data directive",
                    ));
                }
                Ok(ParsedLine::Data {
                    label,
                    operands: operand_str.to_string(),
                })
            }
            "string" => {
                if operand_str.is_empty() {
                    return Err(directive_arity(
                        file,
                        line_no,
                        "No string specified for .string directive",
                    ));
                }
                Ok(ParsedLine::Str {
                    label,
                    text: operand_str.to_string(),
                })
            }
            "entry" | "extern" => {
                if label.is_some() {
                    return Err(directive_arity(
                        file,
                        line_no,
                        format!("Cannot define a label for .{directive} directive"),
                    ));
                }
                let mut toks = operand_str.split_whitespace();
                let Some(name) = toks.next() else {
                    return Err(directive_arity(
                        file,
                        line_no,
                        format!("No symbol specified for .{directive} directive"),
                    ));
                };
                if toks.next().is_some() {
                    return Err(directive_arity(
                        file,
                        line_no,
                        format!("Extra tokens after symbol in .{directive} directive"),
                    ));
                }
                if !is_valid_label(name) {
                    return Err(lexical(file, line_no, format!("Invalid symbol name: {name}")));
                }
                Ok(if directive == "entry" {
                    ParsedLine::Entry {
                        name: name.to_string(),
                    }
                } else {
                    ParsedLine::Extern {
                        name: name.to_string(),
                    }
                })
            }
            other => Err(directive_arity(
                file,
                line_no,
                format!("Unknown directive: .{other}"),
            )),
        };
    }

    // Machine instruction.
    let mnemonic = directive_tok.to_string();
    let operand_str = rest[directive_tok.len()..].trim();
    let operands: Vec<String> = if operand_str.is_empty() {
        Vec::new()
    } else {
        operand_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect()
    };
    if operands.len() > 2 {
        return Err(instruction_arity_too_many(file, line_no));
    }
    Ok(ParsedLine::Instruction {
        label,
        mnemonic,
        operands,
    })
}

fn instruction_arity_too_many(file: &str, line_no: usize) -> crate::error::AsmError {
    crate::error::instruction_arity(file, line_no, "Too many operands for instruction")
}
