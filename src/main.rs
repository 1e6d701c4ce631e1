use std::path::PathBuf;
use std::process::ExitCode;

use asm24::pipeline;
use clap::Parser;
use log::error;

/// A two-pass assembler for the 24-bit instructional machine.
#[derive(Parser, Debug)]
#[command(name = "asm24", version, about)]
struct Cli {
    /// Source files, with or without their `.as` extension.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let mut any_failed = false;
    for arg in &cli.files {
        let base = pipeline::strip_extension(arg);
        if let Err(errs) = pipeline::process_unit(&base) {
            any_failed = true;
            for e in &errs {
                eprintln!("{e}");
            }
            error!("{}: {} error(s), unit failed", base.display(), errs.len());
        }
    }

    if any_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
