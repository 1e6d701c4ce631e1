//! Diagnostic types shared by every pipeline stage.
//!
//! Every error that can be attributed to a specific source line carries
//! the file name and line number so it can be rendered in the
//! `"Error in <file>, line <n>: <message>"` form the driver writes to
//! stderr.

use std::path::PathBuf;

use thiserror::Error;

/// The stage of the pipeline in which an error originated. Purely
/// informational — used for logging, not for dispatch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    MacroExpand,
    FirstPass,
    SecondPass,
    Writer,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::MacroExpand => "macro expansion",
            Stage::FirstPass => "first pass",
            Stage::SecondPass => "second pass",
            Stage::Writer => "artifact writer",
        };
        f.write_str(s)
    }
}

/// A single diagnostic, one per spec §7 error kind.
#[derive(Error, Debug)]
pub enum AsmError {
    #[error("Error in {file}, line {line}: {message}")]
    Lexical {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Error in {file}, line {line}: {message}")]
    Macro {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Error in {file}, line {line}: {message}")]
    DirectiveArity {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Error in {file}, line {line}: {message}")]
    SymbolConflict {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Error in {file}, line {line}: {message}")]
    UndefinedSymbol {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Error in {file}, line {line}: {message}")]
    InstructionArity {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Error in {file}, line {line}: {message}")]
    ImmediateParse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Error in {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type AsmResult<T> = Result<T, AsmError>;

macro_rules! err_ctor {
    ($fn_name:ident, $variant:ident) => {
        pub fn $fn_name(file: impl Into<String>, line: usize, message: impl Into<String>) -> AsmError {
            AsmError::$variant {
                file: file.into(),
                line,
                message: message.into(),
            }
        }
    };
}

err_ctor!(lexical, Lexical);
err_ctor!(macro_err, Macro);
err_ctor!(directive_arity, DirectiveArity);
err_ctor!(symbol_conflict, SymbolConflict);
err_ctor!(undefined_symbol, UndefinedSymbol);
err_ctor!(instruction_arity, InstructionArity);
err_ctor!(immediate_parse, ImmediateParse);
