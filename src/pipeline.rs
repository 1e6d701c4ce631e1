//! Per-translation-unit glue: macro expansion, first pass, second
//! pass, artifact writing, all driven from a single `.as` path.
//!
//! Grounded on `original_source/src/main.c`'s per-unit try/continue
//! loop: each unit is processed independently, and a failure in one
//! does not prevent the driver from attempting the rest (spec §5).

use std::path::{Path, PathBuf};

use log::{error, info};

use crate::error::{AsmError, Stage};
use crate::{first_pass, macro_expander, second_pass, writer};

/// Outcome of processing one `.as` file. `Ok` only when every stage
/// succeeded and artifacts were written; `Err` carries every
/// diagnostic collected across all stages that ran.
pub type UnitResult = Result<(), Vec<AsmError>>;

/// Run the full pipeline for `base` (a path with its extension
/// already stripped): read `<base>.as`, expand macros into
/// `<base>.am`, run both passes, and write `<base>.ob` plus the
/// conditional `<base>.ent`/`<base>.ext`.
pub fn process_unit(base: &Path) -> UnitResult {
    let file_label = base.display().to_string();
    let source_path = base.with_extension("as");

    let raw = std::fs::read_to_string(&source_path).map_err(|source| {
        error!("{}: {}: {source}", Stage::MacroExpand, source_path.display());
        vec![AsmError::Io {
            path: source_path.clone(),
            source,
        }]
    })?;

    let expanded = macro_expander::expand(&file_label, &raw).map_err(|e| {
        error!("{}: {e}", Stage::MacroExpand);
        vec![e]
    })?;

    let am_path = base.with_extension("am");
    std::fs::write(&am_path, &expanded).map_err(|source| {
        error!("{}: {}: {source}", Stage::Writer, am_path.display());
        vec![AsmError::Io {
            path: am_path.clone(),
            source,
        }]
    })?;

    let (mut first, fp_errs) = first_pass::run(&file_label, &expanded);
    if !fp_errs.is_empty() {
        for e in &fp_errs {
            error!("{}: {e}", Stage::FirstPass);
        }
        return Err(fp_errs);
    }

    let mut symbols = std::mem::take(&mut first.symbols);
    let (second, sp_errs) = second_pass::run(&file_label, &first.lines, first.ic_final, &mut symbols);
    if !sp_errs.is_empty() {
        for e in &sp_errs {
            error!("{}: {e}", Stage::SecondPass);
        }
        return Err(sp_errs);
    }

    let artifacts = writer::render(&second, &symbols, first.ic_final, first.dc_final);
    writer::write_to_disk(base, &artifacts).map_err(|e| {
        error!("{}: {e}", Stage::Writer);
        vec![e]
    })?;

    info!("{file_label}: IC={} DC={}", first.ic_final, first.dc_final);
    Ok(())
}

/// Strip a CLI-provided path's extension, per spec §6 ("each FILEn is
/// stripped of extension").
pub fn strip_extension(arg: &Path) -> PathBuf {
    arg.with_extension("")
}
