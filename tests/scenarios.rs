//! Integration-level scenarios exercising the full lexer → parser →
//! evaluator pipeline on complete programs.

use exprscript::{run_source, EvalConfig};

fn run(source: &str) -> String {
    run_source(source, EvalConfig::default())
        .unwrap_or_else(|e| panic!("{source:?} failed: {e}"))
        .result
        .to_string()
}

#[test]
fn gcd_by_mutual_recursion() {
    let source = "letrec (g = lambda (a b) { if (.== b 0) then a else (g b (.% a b)) }) { (g 45 60) }";
    assert_eq!(run(source), "15");
}

#[test]
fn closures_capture_their_defining_environment() {
    let source = "letrec (make = lambda () { letrec (total = 14) { lambda () { total } } }) { ((make)) }";
    assert_eq!(run(source), "14");
}

#[test]
fn call_cc_escapes_an_enclosing_computation() {
    let source = "(.+ 1 (.call/cc lambda (k) { (.+ (k 10) 100) }))";
    assert_eq!(run(source), "11");
}

#[test]
fn tail_recursive_sum_does_not_overflow_the_stack() {
    let source = "letrec (sum = lambda (n acc) { if (.== n 0) then acc else (sum (.- n 1) (.+ acc n)) }) { (sum 100000 0) }";
    assert_eq!(run(source), "5000050000");
}

#[test]
fn rational_arithmetic_stays_exact_through_division() {
    assert_eq!(run("(./ (.+ 1/2 1/3) 5)"), "1/6");
}

#[test]
fn a_closure_argument_can_be_applied_more_than_once() {
    let source = "letrec (twice = lambda (f x) { (f (f x)) }) { (twice (lambda (n) { (.+ n 1) }) 0) }";
    assert_eq!(run(source), "2");
}

#[test]
fn dynamic_scoping_resolves_at_the_call_site_not_the_definition_site() {
    // `Dynamic` is not in lexical scope where `f` is defined, but it is
    // bound on the live stack by the time `f` is called.
    let source = "letrec (f = lambda () { Dynamic }) { letrec (Dynamic = 99) { (f) } }";
    assert_eq!(run(source), "99");
}

#[test]
fn query_reports_whether_a_dynamic_name_is_bound() {
    let source = "letrec (Flag = 1) { (query Flag) }";
    assert_eq!(run(source), "1");
    assert_eq!(run("(query Flag)"), "0");
}

#[test]
fn access_reads_a_lexical_binding_out_of_a_closure() {
    let source = "letrec (x = 41) { (access x (lambda () { x })) }";
    assert_eq!(run(source), "41");
}

#[test]
fn string_operations_round_trip_through_quote_and_cut() {
    assert_eq!(run("(.strlen \"hello\")"), "5");
    assert_eq!(run("(.strcut \"hello\" 1 3)"), "el");
    assert_eq!(run("(.str+ \"foo\" \"bar\")"), "foobar");
}

#[test]
fn division_by_zero_is_reported_and_arity_errors_are_distinct() {
    assert!(run_source("(./ 1 0)", EvalConfig::default()).is_err());
    assert!(run_source("(.+ 1)", EvalConfig::default()).is_err());
}

#[test]
fn garbage_collection_survives_many_transient_closures() {
    let mut config = EvalConfig::default();
    config.initial_store_capacity = 8;
    let source = "letrec \
        (build = lambda (n) { if (.== n 0) then 0 else letrec (junk = lambda (x) { x }) { (build (.- n 1)) } }) \
        { (build 2000) }";
    let outcome = run_source(source, config).unwrap();
    assert_eq!(outcome.result.to_string(), "0");
}
