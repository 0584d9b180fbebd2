//! Built-in operations ("intrinsics"), invoked only through a `Call` whose
//! callee is a literal `Intrinsic` node — never resolved as a variable.
//!
//! `.call/cc` is dispatched directly by the evaluator (see
//! [`crate::evaluator::State`]) since it needs to manipulate the raw
//! evaluation stack; every other intrinsic is a pure function of its
//! already-evaluated argument values, routed through [`dispatch`].

pub mod host;

use crate::diagnostics::{Error, Result, SourceLocation};
use crate::evaluator::{OutputPayload, State};
use crate::numeric::Rational;
use crate::value::Value;
use host::HostArg;

/// Dispatches `name` against `args`, gathered left-to-right by the
/// evaluator, at call site `at`.
pub fn dispatch(name: &str, args: &[Value], at: SourceLocation, state: &mut State) -> Result<Value> {
    match name {
        ".+" => arith(args, at, Rational::add),
        ".-" => arith(args, at, Rational::sub),
        ".*" => arith(args, at, Rational::mul),
        "./" => {
            let (a, b) = two_numbers(args, at, name)?;
            Ok(Value::number(a.div(b, at)?))
        }
        ".%" => {
            let (a, b) = two_numbers(args, at, name)?;
            Ok(Value::number(a.modulo(b, at)?))
        }
        ".floor" => Ok(Value::number(one_number(args, at, name)?.floor())),
        ".ceil" => Ok(Value::number(one_number(args, at, name)?.ceil())),

        ".<" => compare(args, at, name, Rational::lt),
        ".<=" => compare(args, at, name, Rational::le),
        ".>" => compare(args, at, name, Rational::gt),
        ".>=" => compare(args, at, name, Rational::ge),
        ".==" => compare(args, at, name, Rational::num_eq),
        ".!=" => compare(args, at, name, Rational::num_ne),

        ".and" => {
            let (a, b) = two_numbers(args, at, name)?;
            Ok(Value::boolean(a.is_truthy() && b.is_truthy()))
        }
        ".or" => {
            let (a, b) = two_numbers(args, at, name)?;
            Ok(Value::boolean(a.is_truthy() || b.is_truthy()))
        }
        ".not" => Ok(Value::boolean(!one_number(args, at, name)?.is_truthy())),

        ".slen" | ".strlen" => {
            let s = one_string(args, at, name)?;
            Ok(Value::number(Rational::from_integer(s.chars().count() as i64)))
        }
        ".ssub" | ".strcut" => string_cut(args, at, name),
        ".s+" | ".str+" => {
            let (a, b) = two_strings(args, at, name)?;
            Ok(Value::string(format!("{a}{b}")))
        }
        ".s<" => string_compare(args, at, name, |a, b| a < b),
        ".s<=" => string_compare(args, at, name, |a, b| a <= b),
        ".s>" => string_compare(args, at, name, |a, b| a > b),
        ".s>=" => string_compare(args, at, name, |a, b| a >= b),
        ".s==" => string_compare(args, at, name, |a, b| a == b),
        ".s!=" => string_compare(args, at, name, |a, b| a != b),
        ".s->n" | ".strnum" => string_to_number(args, at, name),
        ".squote" | ".strquote" => {
            let s = one_string(args, at, name)?;
            Ok(Value::string(quote(s)))
        }

        ".v?" | ".void?" => Ok(Value::boolean(one_arg(args, at, name)?.is_void())),
        ".n?" | ".num?" => Ok(Value::boolean(one_arg(args, at, name)?.is_number())),
        ".s?" | ".str?" => Ok(Value::boolean(one_arg(args, at, name)?.is_string())),
        ".c?" | ".clo?" => Ok(Value::boolean(one_arg(args, at, name)?.is_closure())),
        ".cont?" => Ok(Value::boolean(one_arg(args, at, name)?.is_continuation())),

        ".getline" => getline(),
        ".put" => put(args),
        ".send" => send(args, at, name, state),

        ".eval" => eval_intrinsic(args, at, name, state),
        ".exit" => std::process::exit(0),
        ".void" => {
            expect_arity(args, 0, at, name)?;
            Ok(Value::void())
        }
        ".reg" => reg(args, at, name, state),
        ".py" => py(args, at, name, state),

        other => Err(Error::type_error(at, format!("unknown intrinsic {other}"))),
    }
}

fn expect_arity(args: &[Value], n: usize, at: SourceLocation, name: &str) -> Result<()> {
    if args.len() != n {
        return Err(Error::arity(
            at,
            format!("{name} expects {n} argument(s), got {}", args.len()),
        ));
    }
    Ok(())
}

fn one_arg<'a>(args: &'a [Value], at: SourceLocation, name: &str) -> Result<&'a Value> {
    expect_arity(args, 1, at, name)?;
    Ok(&args[0])
}

fn one_number(args: &[Value], at: SourceLocation, name: &str) -> Result<Rational> {
    expect_arity(args, 1, at, name)?;
    args[0].as_number(at)
}

fn two_numbers(args: &[Value], at: SourceLocation, name: &str) -> Result<(Rational, Rational)> {
    expect_arity(args, 2, at, name)?;
    Ok((args[0].as_number(at)?, args[1].as_number(at)?))
}

fn one_string<'a>(args: &'a [Value], at: SourceLocation, name: &str) -> Result<&'a str> {
    expect_arity(args, 1, at, name)?;
    args[0].as_string(at)
}

fn two_strings<'a>(args: &'a [Value], at: SourceLocation, name: &str) -> Result<(&'a str, &'a str)> {
    expect_arity(args, 2, at, name)?;
    Ok((args[0].as_string(at)?, args[1].as_string(at)?))
}

fn arith(args: &[Value], at: SourceLocation, op: fn(Rational, Rational) -> Rational) -> Result<Value> {
    let (a, b) = two_numbers(args, at, "arithmetic intrinsic")?;
    Ok(Value::number(op(a, b)))
}

fn compare(
    args: &[Value],
    at: SourceLocation,
    name: &str,
    op: fn(Rational, Rational) -> bool,
) -> Result<Value> {
    let (a, b) = two_numbers(args, at, name)?;
    Ok(Value::boolean(op(a, b)))
}

fn string_compare(
    args: &[Value],
    at: SourceLocation,
    name: &str,
    op: fn(&str, &str) -> bool,
) -> Result<Value> {
    let (a, b) = two_strings(args, at, name)?;
    Ok(Value::boolean(op(a, b)))
}

fn string_cut(args: &[Value], at: SourceLocation, name: &str) -> Result<Value> {
    expect_arity(args, 3, at, name)?;
    let s = args[0].as_string(at)?;
    let start = args[1].as_number(at)?;
    let end = args[2].as_number(at)?;
    if !start.is_integer() || !end.is_integer() {
        return Err(Error::domain(at, format!("{name} requires integer bounds")));
    }
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let (lo, hi) = (start.to_i64(), end.to_i64());
    if lo < 0 || hi > len || lo > hi {
        return Err(Error::domain(
            at,
            format!("{name} bounds [{lo}, {hi}) out of range for a string of length {len}"),
        ));
    }
    let cut: String = chars[lo as usize..hi as usize].iter().collect();
    Ok(Value::string(cut))
}

fn string_to_number(args: &[Value], at: SourceLocation, name: &str) -> Result<Value> {
    let s = one_string(args, at, name)?;
    parse_number_literal(s)
        .map(Value::number)
        .ok_or_else(|| Error::domain(at, format!("{s:?} is not a valid number literal")))
}

/// Parses the exact number-literal grammar from the language contract:
/// optional sign, then `0` or a non-zero-led digit run, optionally
/// followed by `/` and a positive denominator or `.` and a decimal tail.
fn parse_number_literal(s: &str) -> Option<Rational> {
    let s = s.trim();
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, s.strip_prefix('+').unwrap_or(s)),
    };
    if let Some((int_part, denom_part)) = rest.split_once('/') {
        let n: i64 = int_part.parse().ok()?;
        let d: i64 = denom_part.parse().ok()?;
        if d <= 0 || (int_part != "0" && int_part.starts_with('0')) {
            return None;
        }
        return Some(Rational::new(sign * n, d));
    }
    if let Some((int_part, frac_part)) = rest.split_once('.') {
        if int_part.is_empty() || frac_part.is_empty() || !frac_part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let n: i64 = int_part.parse().ok()?;
        let scale = 10i64.checked_pow(frac_part.len() as u32)?;
        let frac: i64 = frac_part.parse().ok()?;
        return Some(Rational::new(sign * (n * scale + frac), scale));
    }
    if rest.is_empty() || (rest != "0" && rest.starts_with('0')) || !rest.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let n: i64 = rest.parse().ok()?;
    Some(Rational::new(sign * n, 1))
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn getline() -> Result<Value> {
    let mut line = String::new();
    use std::io::BufRead;
    let bytes_read = std::io::stdin().lock().read_line(&mut line).unwrap_or(0);
    if bytes_read == 0 {
        return Ok(Value::void());
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Value::string(line))
}

fn put(args: &[Value]) -> Result<Value> {
    use std::io::Write;
    let mut stdout = std::io::stdout();
    for value in args {
        let _ = write!(stdout, "{value}");
    }
    let _ = stdout.flush();
    Ok(Value::void())
}

fn send(args: &[Value], at: SourceLocation, name: &str, state: &mut State) -> Result<Value> {
    expect_arity(args, 2, at, name)?;
    let channel = args[0].as_number(at)?;
    let payload = match args[1].kind() {
        crate::value::ValueKind::Number(n) => OutputPayload::Number(*n),
        crate::value::ValueKind::String(s) => OutputPayload::String(s.clone()),
        _ => {
            return Err(Error::type_error(
                at,
                format!("{name}'s payload must be a Number or String, found {}", args[1].type_name()),
            ))
        }
    };
    state.output_buffer.push((channel, payload));
    Ok(Value::void())
}

fn eval_intrinsic(args: &[Value], at: SourceLocation, name: &str, state: &State) -> Result<Value> {
    let source = one_string(args, at, name)?;
    crate::runtime::eval_fresh(source, state.config)
}

fn reg(args: &[Value], at: SourceLocation, name: &str, state: &mut State) -> Result<Value> {
    expect_arity(args, 2, at, name)?;
    let binding_name = args[0].as_string(at)?.to_string();
    let closure = args[1].as_closure(at)?.clone();
    let value = Value::closure(crate::value::ClosureData::new(
        closure.env.borrow().clone(),
        closure.fun.clone(),
        closure.defined_at,
    ));
    let loc = state.store.put(value);
    let global_env = state.stack[0].env.clone();
    crate::environment::push(&global_env, binding_name, loc);
    Ok(Value::void())
}

fn py(args: &[Value], at: SourceLocation, name: &str, state: &State) -> Result<Value> {
    if args.is_empty() {
        return Err(Error::arity(at, format!("{name} expects a function name argument")));
    }
    let fname = args[0].as_string(at)?;
    let mut host_args = Vec::with_capacity(args.len() - 1);
    for arg in &args[1..] {
        host_args.push(match arg.kind() {
            crate::value::ValueKind::Number(n) => HostArg::Number(*n),
            crate::value::ValueKind::String(s) => HostArg::String(s.clone()),
            _ => {
                return Err(Error::type_error(
                    at,
                    format!("{name} arguments must be Number or String, found {}", arg.type_name()),
                ))
            }
        });
    }
    match state.host.call(fname, &host_args, at)? {
        HostArg::Number(n) => Ok(Value::number(n)),
        HostArg::String(s) => Ok(Value::string(s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integers_fractions_and_decimals() {
        assert_eq!(parse_number_literal("42"), Some(Rational::from_integer(42)));
        assert_eq!(parse_number_literal("-7"), Some(Rational::from_integer(-7)));
        assert_eq!(parse_number_literal("1/6"), Some(Rational::new(1, 6)));
        assert_eq!(parse_number_literal("3.5"), Some(Rational::new(7, 2)));
        assert_eq!(parse_number_literal("abc"), None);
        assert_eq!(parse_number_literal("007"), None);
    }

    #[test]
    fn quote_escapes_backslashes_and_quotes() {
        assert_eq!(quote("a\"b\\c"), "\"a\\\"b\\\\c\"");
    }
}
