//! `exprscript` binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    exprscript::cli::run(std::env::args().skip(1))
}
