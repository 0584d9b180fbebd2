//! The `exprscript` command-line front end.
//!
//! ```text
//! exprscript <file>                 run a program from a file
//! exprscript -e/--eval <source>     run a program passed inline
//! exprscript -r/--repl              start an interactive session
//! exprscript --json-output ...      report the result as JSON instead of
//!                                    ExprScript's own display form
//! ```

pub mod lightweight_parser;

#[cfg(feature = "repl")]
pub mod repl;

use crate::evaluator::OutputPayload;
use crate::numeric::Rational;
use crate::runtime::{self, RunOutcome};
use crate::value::Value;
use crate::EvalConfig;
use lightweight_parser::{ArgDef, CliError, LightweightCli};
use serde::Serialize;
use std::fs;
use std::process::ExitCode;

fn cli_spec() -> LightweightCli {
    LightweightCli::new("exprscript")
        .version(crate::VERSION)
        .about("An interpreter for ExprScript")
        .arg(ArgDef::new("eval").short('e').long("eval").takes_value().value_name("SOURCE").help("Evaluate SOURCE directly instead of reading a file"))
        .arg(ArgDef::new("repl").short('r').long("repl").help("Start an interactive read-eval-print loop"))
        .arg(ArgDef::new("json-output").long("json-output").help("Report the result and output buffer as JSON"))
        .arg(ArgDef::new("file").index(0).value_name("FILE").help("A source file to run"))
}

/// Runs the CLI against `args` (excluding the program name), writing to
/// stdout/stderr and returning the process exit code.
pub fn run<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let cli = cli_spec();
    let parsed = match cli.parse(args) {
        Ok(parsed) => parsed,
        Err(CliError::HelpRequested) => {
            cli.print_help();
            return ExitCode::SUCCESS;
        }
        Err(CliError::VersionRequested) => {
            cli.print_version();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let json_output = parsed.get_flag("json-output");

    if parsed.get_flag("repl") {
        #[cfg(feature = "repl")]
        {
            return match repl::run() {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("{err}");
                    ExitCode::FAILURE
                }
            };
        }
        #[cfg(not(feature = "repl"))]
        {
            eprintln!("this build was compiled without the 'repl' feature");
            return ExitCode::FAILURE;
        }
    }

    let source = if let Some(inline) = parsed.get_one::<String>("eval") {
        inline.to_string()
    } else if let Some(path) = parsed.get_positional(0) {
        match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                eprintln!("couldn't read {path}: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        cli.print_help();
        return ExitCode::FAILURE;
    };

    match runtime::run_source(&source, EvalConfig::default()) {
        Ok(outcome) => {
            report(&outcome, json_output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[derive(Serialize)]
struct JsonOutputEntry {
    channel: String,
    payload: JsonPayload,
}

#[derive(Serialize)]
#[serde(tag = "type", content = "value")]
enum JsonPayload {
    Number(String),
    String(String),
}

#[derive(Serialize)]
struct JsonReport {
    result: String,
    output: Vec<JsonOutputEntry>,
}

fn report(outcome: &RunOutcome, json_output: bool) {
    if json_output {
        let report = JsonReport {
            result: outcome.result.to_string(),
            output: outcome
                .output_buffer
                .iter()
                .map(|(channel, payload)| JsonOutputEntry {
                    channel: channel.to_string(),
                    payload: match payload {
                        OutputPayload::Number(n) => JsonPayload::Number(n.to_string()),
                        OutputPayload::String(s) => JsonPayload::String(s.clone()),
                    },
                })
                .collect(),
        };
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(err) => eprintln!("failed to serialize result: {err}"),
        }
        return;
    }

    for (channel, payload) in &outcome.output_buffer {
        display_send(*channel, payload);
    }
    println!("{}", outcome.result);
}

fn display_send(channel: Rational, payload: &OutputPayload) {
    match payload {
        OutputPayload::Number(n) => println!("[{channel}] {n}"),
        OutputPayload::String(s) => println!("[{channel}] {s}"),
    }
}

/// Formats a value exactly the way the CLI's non-JSON report does, for
/// callers embedding the interpreter without going through `run`.
pub fn display_result(value: &Value) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_a_plain_result() {
        let outcome = runtime::run_source("(.+ 1 2)", EvalConfig::default()).unwrap();
        assert_eq!(display_result(&outcome.result), "3");
    }
}
