//! End-to-end tests driving the full pipeline (macro expansion, both
//! passes, artifact rendering) through the library surface, covering
//! the worked scenarios and invariants.

use asm24::symbol::SymbolAttrs;
use asm24::word::BASE;
use asm24::{first_pass, macro_expander, second_pass, writer};

struct Run {
    first: first_pass::FirstPassResult,
    second: second_pass::SecondPassResult,
    ob: String,
    ent: Option<String>,
    ext: Option<String>,
}

fn run(src: &str) -> Run {
    let expanded = macro_expander::expand("u.as", src).expect("macro expansion failed");
    let (mut first, fp_errs) = first_pass::run("u.as", &expanded);
    assert!(fp_errs.is_empty(), "first pass errors: {fp_errs:?}");
    let mut symbols = std::mem::take(&mut first.symbols);
    let (second, sp_errs) =
        second_pass::run("u.as", &first.lines, first.ic_final, &mut symbols);
    assert!(sp_errs.is_empty(), "second pass errors: {sp_errs:?}");
    let artifacts = writer::render(&second, &symbols, first.ic_final, first.dc_final);
    first.symbols = symbols;
    Run {
        first,
        second,
        ob: artifacts.ob,
        ent: artifacts.ent,
        ext: artifacts.ext,
    }
}

#[test]
fn scenario_pure_two_register_instruction() {
    let r = run("mov r3, r5\n");
    assert_eq!(r.first.ic_final, 2);
    assert_eq!(r.second.code.len(), 2);
    let w0 = r.second.code[0].1;
    assert_eq!(w0.opcode_field(), 0);
    assert_eq!(w0.src_mode_field(), 3);
    assert_eq!(w0.src_reg_field(), 3);
    assert_eq!(w0.dst_mode_field(), 3);
    assert_eq!(w0.dst_reg_field(), 5);
    assert_eq!(w0.funct_field(), 0);
    assert_eq!(w0.are(), 0b100);
    let w1 = r.second.code[1].1;
    assert_eq!(w1.src_reg_field(), 3);
    assert_eq!(w1.dst_reg_field(), 5);
    assert_eq!(w1.are(), 0b100);
}

#[test]
fn scenario_immediate_plus_direct_with_external() {
    let r = run(".extern TARGET\nadd #7, TARGET\n");
    assert_eq!(r.first.ic_final, 3);
    assert_eq!(r.second.code.len(), 3);
    let op_word = r.second.code[0].1;
    assert_eq!(op_word.opcode_field(), 2);
    assert_eq!(op_word.funct_field(), 1);
    assert_eq!(op_word.src_mode_field(), 0); // Immediate
    assert_eq!(op_word.dst_mode_field(), 1); // Direct
    assert_eq!(r.second.code[1].1.payload(), 7);
    assert_eq!(r.second.code[1].1.are(), 0b100);
    assert_eq!(r.second.code[2].1.payload(), 0);
    assert_eq!(r.second.code[2].1.are(), 0b001);
    assert_eq!(r.second.ext_refs.len(), 1);
    assert_eq!(r.second.ext_refs[0].0, "TARGET");
    assert_eq!(r.second.ext_refs[0].1, r.second.code[2].0);
    assert!(r.ext.unwrap().contains("TARGET"));
}

#[test]
fn scenario_relative_jump() {
    let mut src = String::new();
    for _ in 0..7 {
        src.push_str("stop\n");
    }
    src.push_str("LOOP: stop\n"); // address 107
    for _ in 0..12 {
        src.push_str("stop\n");
    }
    src.push_str("jmp &LOOP\n"); // instruction word at address 120

    let r = run(&src);
    let jmp_word = r.second.code.last().unwrap().1;
    let signed = ((jmp_word.payload() as i32) << 11) >> 11;
    assert_eq!(signed, 107 - 120);
    assert_eq!(jmp_word.are(), 0b010);
    assert!(r.second.ext_refs.is_empty());
}

#[test]
fn scenario_data_relocation() {
    let src = "X: .data 1, -2, 3\njmp X\n";
    let r = run(src);
    let x = r.first.symbols.find("X").unwrap();
    assert_eq!(x.value, 100 + r.first.ic_final);
    let direct_word = r.second.code[1].1;
    assert_eq!(direct_word.payload(), x.value);
    assert_eq!(direct_word.are(), 0b010);
}

#[test]
fn scenario_string_length() {
    let r = run(r#"S: .string "ab""#);
    assert_eq!(r.first.dc_final, 3);
    assert_eq!(r.second.data.len(), 3);
    assert_eq!(r.second.data[0].1.payload(), b'a' as u32);
    assert_eq!(r.second.data[1].1.payload(), b'b' as u32);
    assert_eq!(r.second.data[2].1.payload(), 0);
}

#[test]
fn scenario_macro_expansion() {
    let src = "mcro MAC\ninc r1\ndec r2\nendmcro\nMAC\nstop\nMAC\n";
    let expanded = macro_expander::expand("u.as", src).unwrap();
    assert_eq!(expanded, "inc r1\ndec r2\nstop\ninc r1\ndec r2\n");
}

#[test]
fn invariant_address_monotonicity() {
    let src = "A: add #1, r1\nB: sub r2, r3\nX: .data 9, 9\n";
    let r = run(src);
    for (i, (addr, _)) in r.second.code.iter().enumerate() {
        assert_eq!(*addr, BASE + i as u32);
    }
    let data_base = BASE + r.first.ic_final;
    for (i, (addr, _)) in r.second.data.iter().enumerate() {
        assert_eq!(*addr, data_base + i as u32);
    }
}

#[test]
fn invariant_length_consistency_between_passes() {
    let src = "add #1, TARGET\nmov r1, r2\njmp &TARGET\nTARGET: stop\n";
    let r = run(src);
    let total_words: u32 = r
        .second
        .code
        .last()
        .map(|(addr, _)| addr - BASE + 1)
        .unwrap_or(0);
    assert_eq!(total_words, r.first.ic_final);
}

#[test]
fn zero_and_one_operand_instructions_emit_no_extra_words() {
    // `normalize`'s synthetic Immediate(0) source for 0/1-arity
    // instructions must never itself contribute a word.
    let r = run("stop\nclr r1\nLOOP: jmp LOOP\n");
    assert_eq!(r.first.ic_final, 4); // stop=1, clr r1=1, jmp LOOP=2
    assert_eq!(r.second.code.len(), 4);
    for (i, (addr, _)) in r.second.code.iter().enumerate() {
        assert_eq!(*addr, BASE + i as u32);
    }
}

#[test]
fn invariant_symbol_exclusivity_is_enforced() {
    let (_, errs) = first_pass::run("u.as", "L: add #1, r1\nL2: .data 1\n");
    assert!(errs.is_empty());
    let src = ".extern X\n.entry X\nstop\n";
    let expanded = macro_expander::expand("u.as", src).unwrap();
    let (mut first, fp_errs) = first_pass::run("u.as", &expanded);
    assert!(fp_errs.is_empty());
    let mut symbols = std::mem::take(&mut first.symbols);
    let (_, sp_errs) = second_pass::run("u.as", &first.lines, first.ic_final, &mut symbols);
    assert_eq!(sp_errs.len(), 1);
}

#[test]
fn invariant_entry_presence_and_no_nonzero_external_payload() {
    let src = ".extern TARGET\n.entry MAIN\nMAIN: add #7, TARGET\n";
    let r = run(src);
    assert!(r
        .first
        .symbols
        .find("MAIN")
        .unwrap()
        .attrs
        .contains(SymbolAttrs::ENTRY));
    let ent = r.ent.expect("MAIN should appear in .ent");
    assert!(ent.contains("MAIN"));
    for (_, word) in &r.second.code {
        if word.are() == 0b001 {
            assert_eq!(word.payload(), 0);
        }
    }
}

#[test]
fn invariant_base64_round_trip() {
    use asm24::base64::encode_word;
    for raw in [0u32, 1, 0x00FF_FFFF, 0x00AB_CDEF, 12345] {
        let encoded = encode_word(raw);
        let decoded = decode(&encoded);
        assert_eq!(decoded, raw & 0x00FF_FFFF);
    }
}

fn decode(s: &str) -> u32 {
    const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut raw = 0u32;
    for c in s.chars() {
        let idx = ALPHABET.find(c).unwrap() as u32;
        raw = (raw << 6) | idx;
    }
    raw
}
