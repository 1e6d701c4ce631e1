//! The second pass (spec §4.4): re-walks the cached line stream,
//! resolves symbol references, emits bit-packed 24-bit words, and
//! records every external reference site.
//!
//! Grounded on `original_source/include/second_pass.h`'s operation
//! names and spec §4.4's emission algorithm.

use log::debug;

use crate::error::{undefined_symbol, AsmError, AsmResult};
use crate::first_pass::{
    instruction_length, parse_int_list, quoted_string_body, validate_and_parse_operands,
    CachedLine,
};
use crate::line::ParsedLine;
use crate::operand::Operand;
use crate::symbol::{SymbolAttrs, SymbolTable};
use crate::word::{
    encode_instruction_word, encode_register_word, AddrMode, Are, MachineWord, Mnemonic, BASE,
};

pub struct SecondPassResult {
    /// (address, word) pairs, in address order, starting at `BASE`.
    pub code: Vec<(u32, MachineWord)>,
    /// (address, word) pairs, in address order, starting at `BASE + ic_final`.
    pub data: Vec<(u32, MachineWord)>,
    /// (symbol name, address of the operand word) in discovery order.
    pub ext_refs: Vec<(String, u32)>,
}

/// Normalize an instruction's operand list into (src, dst) per spec
/// §4.4 step 1: zero-operand instructions get synthetic Immediate(0)
/// operands on both sides; one-operand instructions put their sole
/// operand in `dst` and synthesize `src = Immediate(0)`.
fn normalize(operands: &[Operand]) -> (Operand, Operand) {
    match operands {
        [] => (Operand::Immediate(0), Operand::Immediate(0)),
        [only] => (Operand::Immediate(0), only.clone()),
        [src, dst] => (src.clone(), dst.clone()),
        _ => unreachable!("first pass already rejected >2 operands"),
    }
}

fn reg_of(op: &Operand) -> u32 {
    match op {
        Operand::Register(r) => u32::from(*r),
        _ => 0,
    }
}

fn emit_operand_word(
    file: &str,
    line_no: usize,
    symbols: &SymbolTable,
    op: &Operand,
    instr_word_addr: u32,
    ext_refs: &mut Vec<(String, u32)>,
    operand_word_addr: u32,
) -> AsmResult<MachineWord> {
    match op {
        Operand::Immediate(n) => Ok(MachineWord::from_signed(*n, Are::Absolute)),
        Operand::Direct(label) => {
            let sym = symbols.find(label).ok_or_else(|| {
                undefined_symbol(file, line_no, format!("Undefined symbol: {label}"))
            })?;
            if sym.attrs.contains(SymbolAttrs::EXTERNAL) {
                ext_refs.push((label.clone(), operand_word_addr));
                Ok(MachineWord::new(0, Are::External))
            } else {
                Ok(MachineWord::new(sym.value, Are::Relocatable))
            }
        }
        Operand::Relative(label) => {
            let sym = symbols.find(label).ok_or_else(|| {
                undefined_symbol(file, line_no, format!("Undefined symbol: {label}"))
            })?;
            if sym.attrs.contains(SymbolAttrs::EXTERNAL) {
                return Err(undefined_symbol(
                    file,
                    line_no,
                    format!("External symbol '{label}' cannot be used with relative addressing"),
                ));
            }
            let distance = sym.value as i64 - instr_word_addr as i64;
            Ok(MachineWord::from_signed(distance as i32, Are::Relocatable))
        }
        Operand::Register(_) => unreachable!("register operands never require a word here"),
    }
}

/// Run the second pass. `symbols` is the first pass's table, taken
/// mutably since `.entry` resolution adds the `Entry` attribute.
pub fn run(
    file: &str,
    lines: &[CachedLine],
    ic_final: u32,
    symbols: &mut SymbolTable,
) -> (SecondPassResult, Vec<AsmError>) {
    let mut errors = Vec::new();
    let mut code: Vec<(u32, MachineWord)> = Vec::new();
    let mut data: Vec<(u32, MachineWord)> = Vec::new();
    let mut ext_refs: Vec<(String, u32)> = Vec::new();
    let mut ic: u32 = 0;
    let mut dc: u32 = 0;

    for cached in lines {
        let CachedLine { line_no, parsed } = cached;
        let line_no = *line_no;

        let result: AsmResult<()> = (|| {
            match parsed {
                ParsedLine::Blank | ParsedLine::Comment => {}
                ParsedLine::Data { operands, .. } => {
                    let values = parse_int_list(file, line_no, operands)?;
                    for v in values {
                        data.push((
                            BASE + ic_final + dc,
                            MachineWord::from_signed(v, Are::Absolute),
                        ));
                        dc += 1;
                    }
                }
                ParsedLine::Str { text, .. } => {
                    let body = quoted_string_body(file, line_no, text)?;
                    for c in body.chars() {
                        data.push((
                            BASE + ic_final + dc,
                            MachineWord::new(c as u32, Are::Absolute),
                        ));
                        dc += 1;
                    }
                    data.push((BASE + ic_final + dc, MachineWord::new(0, Are::Absolute)));
                    dc += 1;
                }
                ParsedLine::Extern { .. } => {}
                ParsedLine::Entry { name } => {
                    symbols.add_attrs(file, line_no, name, SymbolAttrs::ENTRY)?;
                }
                ParsedLine::Instruction {
                    mnemonic, operands, ..
                } => {
                    let mnemonic = Mnemonic::parse(mnemonic)
                        .expect("first pass already validated the mnemonic");
                    let parsed_operands =
                        validate_and_parse_operands(file, line_no, mnemonic, operands)?;
                    let instr_addr = BASE + ic;
                    let (src, dst) = normalize(&parsed_operands);
                    let (opcode, funct) = mnemonic.op_funct();

                    let word0 = encode_instruction_word(
                        opcode,
                        src.mode(),
                        reg_of(&src),
                        dst.mode(),
                        reg_of(&dst),
                        funct,
                    );
                    code.push((instr_addr, word0));
                    let mut next_addr = instr_addr + 1;

                    if src.mode() == AddrMode::Register && dst.mode() == AddrMode::Register {
                        code.push((next_addr, encode_register_word(reg_of(&src), reg_of(&dst))));
                        next_addr += 1;
                    } else {
                        // Iterate the *real* operands only: `normalize`'s
                        // synthetic Immediate(0) source for 0/1-arity
                        // instructions must never produce a word of its own.
                        for op in &parsed_operands {
                            if matches!(op, Operand::Register(_)) {
                                continue;
                            }
                            let word = emit_operand_word(
                                file,
                                line_no,
                                symbols,
                                op,
                                instr_addr,
                                &mut ext_refs,
                                next_addr,
                            )?;
                            code.push((next_addr, word));
                            next_addr += 1;
                        }
                    }

                    let expected_len = instruction_length(&parsed_operands);
                    debug_assert_eq!(next_addr - instr_addr, expected_len);
                    ic += expected_len;
                }
            }
            Ok(())
        })();

        if let Err(e) = result {
            errors.push(e);
            continue;
        }
        debug!("{file}:{line_no}: second pass ok (ic={ic} dc={dc})");
    }

    (
        SecondPassResult {
            code,
            data,
            ext_refs,
        },
        errors,
    )
}
