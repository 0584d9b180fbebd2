//! Wires the lexer, parser, and evaluator together into complete program
//! runs, and provides the fresh-heap entry point `.eval` calls into.

use crate::ast::Expr;
use crate::diagnostics::Result;
use crate::evaluator::{EvalConfig, OutputPayload, State};
use crate::numeric::Rational;
use crate::value::Value;
use crate::{lexer, parser};

/// The outcome of a complete program run: its final value plus whatever it
/// sent to the output buffer via `.send`.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The value the program's top-level expression evaluated to.
    pub result: Value,
    /// Every `(channel, payload)` pair sent via `.send`, in call order.
    pub output_buffer: Vec<(Rational, OutputPayload)>,
}

/// Parses and evaluates `source` from a fresh heap, discarding everything
/// but the final value. This is what `.eval` calls into: nested evaluation
/// never touches the caller's store, stack, or output buffer.
pub fn eval_fresh(source: &str, config: EvalConfig) -> Result<Value> {
    Ok(run_source(source, config)?.result)
}

/// Parses and evaluates `source` from a fresh heap, returning the final
/// value together with the output buffer accumulated along the way.
pub fn run_source(source: &str, config: EvalConfig) -> Result<RunOutcome> {
    let expr = parse_source(source)?;
    run_expr(expr, config)
}

/// Parses `source` into a single top-level expression without evaluating
/// it, surfacing lexer and parser errors.
pub fn parse_source(source: &str) -> Result<Expr> {
    let _ = lexer::tokenize(source)?;
    parser::parse(source)
}

/// Evaluates an already-parsed expression from a fresh heap.
pub fn run_expr(expr: Expr, config: EvalConfig) -> Result<RunOutcome> {
    let mut state = State::new(config);
    state.push_program(expr);
    let result = state.run()?;
    Ok(RunOutcome {
        result,
        output_buffer: state.output_buffer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_a_tail_recursive_sum_in_bounded_stack() {
        let source = "letrec (sum = lambda (n acc) { if (.== n 0) then acc else (sum (.- n 1) (.+ acc n)) }) { (sum 10000 0) }";
        let outcome = run_source(source, EvalConfig::default()).unwrap();
        assert_eq!(outcome.result.to_string(), "50005000");
    }

    #[test]
    fn gcd_via_mutual_recursion() {
        let source = "letrec (g = lambda (a b) { if (.== b 0) then a else (g b (.% a b)) }) { (g 45 60) }";
        let outcome = run_source(source, EvalConfig::default()).unwrap();
        assert_eq!(outcome.result.to_string(), "15");
    }

    #[test]
    fn call_cc_short_circuits_arithmetic() {
        let source = "(.+ 1 (.call/cc lambda (k) { (.+ (k 10) 100) }))";
        let outcome = run_source(source, EvalConfig::default()).unwrap();
        assert_eq!(outcome.result.to_string(), "11");
    }

    #[test]
    fn accumulator_closure_captures_lexical_state() {
        let source = "letrec (make = lambda () { letrec (total = 14) { lambda () { total } } }) { ((make)) }";
        let outcome = run_source(source, EvalConfig::default()).unwrap();
        assert_eq!(outcome.result.to_string(), "14");
    }

    #[test]
    fn rational_arithmetic_stays_exact() {
        let outcome = run_source("(./ (.+ 1/2 1/3) 5)", EvalConfig::default()).unwrap();
        assert_eq!(outcome.result.to_string(), "1/6");
    }

    #[test]
    fn eval_fresh_does_not_see_caller_bindings() {
        let source = "letrec (x = 5) { (.eval \"x\") }";
        assert!(run_source(source, EvalConfig::default()).is_err());
    }
}
