//! Interactive read-eval-print loop.
//!
//! Each submission is evaluated against a fresh [`crate::evaluator::State`]:
//! the REPL never accumulates heap or stack state across lines, matching
//! `.eval`'s "fresh state" semantics — the core language has no top-level
//! `define` for a session to meaningfully persist.

use crate::runtime;
use crate::EvalConfig;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Runs the interactive loop until EOF (Ctrl-D) or an interrupt (Ctrl-C).
pub fn run() -> rustyline::Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("{} {}", "exprscript".bold(), crate::VERSION);
    println!("each line evaluates against a fresh heap; Ctrl-D to exit.");

    loop {
        match editor.readline("exprscript> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(trimmed);
                eval_and_report(trimmed);
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

fn eval_and_report(source: &str) {
    match runtime::run_source(source, EvalConfig::default()) {
        Ok(outcome) => {
            for (channel, payload) in &outcome.output_buffer {
                println!("{} [{channel}] {}", "send".dimmed(), format_payload(payload));
            }
            println!("{}", outcome.result.to_string().green());
        }
        Err(err) => eprintln!("{}", err.to_string().red()),
    }
}

fn format_payload(payload: &crate::evaluator::OutputPayload) -> String {
    match payload {
        crate::evaluator::OutputPayload::Number(n) => n.to_string(),
        crate::evaluator::OutputPayload::String(s) => s.clone(),
    }
}
