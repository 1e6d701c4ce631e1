//! Artifact writer (spec §4.6): turns a [`SecondPassResult`] plus the
//! final symbol table into the `.ob`/`.ent`/`.ext` text files.
//!
//! Grounded on `original_source/include/output.h`'s three-file split;
//! the exact line formats are spec §4.6's.

use std::fmt::Write as _;
use std::path::Path;

use crate::error::AsmResult;
use crate::second_pass::SecondPassResult;
use crate::symbol::{SymbolAttrs, SymbolTable};

/// The rendered contents of the artifact files for one translation
/// unit. `.ent`/`.ext` are `None` when there is nothing to emit (spec
/// §4.6: "omit the file entirely").
pub struct Artifacts {
    pub ob: String,
    pub ent: Option<String>,
    pub ext: Option<String>,
}

/// Render the `.ob`/`.ent`/`.ext` contents. `ic_final`/`dc_final` are
/// the word counts used for the `.ob` header line.
pub fn render(
    second: &SecondPassResult,
    symbols: &SymbolTable,
    ic_final: u32,
    dc_final: u32,
) -> Artifacts {
    let mut ob = String::new();
    let _ = writeln!(ob, "{ic_final} {dc_final}");
    for (addr, word) in second.code.iter().chain(second.data.iter()) {
        let _ = writeln!(ob, "{:04} {}", addr, crate::base64::encode_word(word.raw()));
    }

    let mut ent = String::new();
    for sym in symbols.iter_in_order() {
        if sym.attrs.contains(SymbolAttrs::ENTRY) {
            let _ = writeln!(ent, "{} {:04}", sym.name, sym.value);
        }
    }

    let mut ext = String::new();
    for (name, addr) in &second.ext_refs {
        let _ = writeln!(ext, "{name} {addr:04}");
    }

    Artifacts {
        ob,
        ent: (!ent.is_empty()).then_some(ent),
        ext: (!ext.is_empty()).then_some(ext),
    }
}

/// Write the rendered artifacts to `<base>.ob` (always) and
/// `<base>.ent`/`<base>.ext` (only when present).
pub fn write_to_disk(base: &Path, artifacts: &Artifacts) -> AsmResult<()> {
    write_file(&base.with_extension("ob"), &artifacts.ob)?;
    if let Some(ent) = &artifacts.ent {
        write_file(&base.with_extension("ent"), ent)?;
    }
    if let Some(ext) = &artifacts.ext {
        write_file(&base.with_extension("ext"), ext)?;
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> AsmResult<()> {
    std::fs::write(path, contents).map_err(|source| crate::error::AsmError::Io {
        path: path.to_path_buf(),
        source,
    })
}
