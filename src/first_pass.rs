//! The first pass (spec §4.3): tokenizes each line, collects labels,
//! accounts for `IC`/`DC`, computes per-instruction word counts, and
//! relocates data symbols once the final `IC` is known.
//!
//! Grounded on `original_source/src/first_pass.c` (`process_label`,
//! `process_data_directive`, `process_string_directive`,
//! `calculate_instruction_length`).

use log::debug;

use crate::error::{directive_arity, immediate_parse, instruction_arity, AsmError, AsmResult};
use crate::line::{parse_line, ParsedLine};
use crate::operand::{parse_operand, Operand};
use crate::symbol::{SymbolAttrs, SymbolTable};
use crate::word::{Arity, Mnemonic, BASE};

/// One source line together with its parsed form, threaded through to
/// the second pass so the source doesn't need to be re-tokenized
/// (spec §2: "an implementation may cache it").
pub struct CachedLine {
    pub line_no: usize,
    pub parsed: ParsedLine,
}

pub struct FirstPassResult {
    pub symbols: SymbolTable,
    pub ic_final: u32,
    pub dc_final: u32,
    pub lines: Vec<CachedLine>,
}

/// Parse an integer list like `"1, -2, 3"` (spec §4.3's `.data`
/// handling). Shared with the second pass, which re-parses the same
/// operand text to emit the actual data words.
pub fn parse_int_list(file: &str, line_no: usize, text: &str) -> AsmResult<Vec<i32>> {
    text.split(',')
        .map(|tok| {
            let tok = tok.trim();
            tok.parse::<i32>().map_err(|_| {
                immediate_parse(file, line_no, format!("Invalid data value: {tok}"))
            })
        })
        .collect()
}

pub fn quoted_string_body<'a>(file: &str, line_no: usize, text: &'a str) -> AsmResult<&'a str> {
    if text.len() < 2 || !text.starts_with('"') || !text.ends_with('"') {
        return Err(directive_arity(file, line_no, "String must be enclosed in quotes"));
    }
    Ok(&text[1..text.len() - 1])
}

/// The instruction word count, per the length rule resolved in
/// DESIGN.md ("Resolved formula inconsistency: instruction length").
pub fn instruction_length(operands: &[Operand]) -> u32 {
    match operands {
        [] => 1,
        [only] => 1 + u32::from(only.requires_word()),
        [src, dst] => {
            if matches!(src, Operand::Register(_)) && matches!(dst, Operand::Register(_)) {
                2
            } else {
                1 + u32::from(src.requires_word()) + u32::from(dst.requires_word())
            }
        }
        _ => unreachable!("parser rejects more than two operands"),
    }
}

pub fn validate_and_parse_operands(
    file: &str,
    line_no: usize,
    mnemonic: Mnemonic,
    raw_operands: &[String],
) -> AsmResult<Vec<Operand>> {
    let expected = match mnemonic.arity() {
        Arity::Zero => 0,
        Arity::One => 1,
        Arity::Two => 2,
    };
    if raw_operands.len() != expected {
        return Err(instruction_arity(
            file,
            line_no,
            format!(
                "Wrong number of operands: expected {expected}, got {}",
                raw_operands.len()
            ),
        ));
    }

    let operands: Vec<Operand> = raw_operands
        .iter()
        .map(|s| parse_operand(file, line_no, s))
        .collect::<AsmResult<_>>()?;

    if mnemonic.requires_direct_src() {
        if !matches!(operands[0], Operand::Direct(_)) {
            return Err(instruction_arity(
                file,
                line_no,
                "lea requires a Direct-addressed source operand",
            ));
        }
    }

    Ok(operands)
}

pub fn run(file: &str, source: &str) -> (FirstPassResult, Vec<AsmError>) {
    let mut symbols = SymbolTable::new();
    let mut ic: u32 = 0;
    let mut dc: u32 = 0;
    let mut lines = Vec::new();
    let mut errors = Vec::new();

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        let parsed = match parse_line(file, line_no, raw) {
            Ok(p) => p,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };

        let result: AsmResult<()> = (|| {
            match &parsed {
                ParsedLine::Blank | ParsedLine::Comment => {}
                ParsedLine::Data { label, operands } => {
                    if let Some(label) = label {
                        symbols.add(file, line_no, label, dc + BASE, SymbolAttrs::DATA)?;
                    }
                    let count = parse_int_list(file, line_no, operands)?.len() as u32;
                    dc += count;
                }
                ParsedLine::Str { label, text } => {
                    if let Some(label) = label {
                        symbols.add(file, line_no, label, dc + BASE, SymbolAttrs::DATA)?;
                    }
                    let body = quoted_string_body(file, line_no, text)?;
                    dc += body.chars().count() as u32 + 1;
                }
                ParsedLine::Extern { name } => {
                    symbols.add(file, line_no, name, 0, SymbolAttrs::EXTERNAL)?;
                }
                ParsedLine::Entry { .. } => {
                    // Resolved in the second pass; no-op here beyond
                    // the label-absence check already done while parsing.
                }
                ParsedLine::Instruction {
                    label,
                    mnemonic,
                    operands,
                } => {
                    if let Some(label) = label {
                        symbols.add(file, line_no, label, ic + BASE, SymbolAttrs::CODE)?;
                    }
                    let Some(mnemonic) = Mnemonic::parse(mnemonic) else {
                        return Err(instruction_arity(
                            file,
                            line_no,
                            format!("Unknown mnemonic: {mnemonic}"),
                        ));
                    };
                    let parsed_operands =
                        validate_and_parse_operands(file, line_no, mnemonic, operands)?;
                    ic += instruction_length(&parsed_operands);
                }
            }
            Ok(())
        })();

        if let Err(e) = result {
            errors.push(e);
            continue;
        }

        debug!("{file}:{line_no}: IC={ic} DC={dc}");
        lines.push(CachedLine { line_no, parsed });
    }

    symbols.bulk_relocate_data(ic);

    (
        FirstPassResult {
            symbols,
            ic_final: ic,
            dc_final: dc,
            lines,
        },
        errors,
    )
}
