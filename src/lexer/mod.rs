//! Tokenizes ExprScript source text.
//!
//! The accepted character set is ASCII letters, digits, whitespace, and the
//! punctuation `` `~!@#$%^&*()-_=+[{]}\|;:'",<.>/? ``, matching the
//! language contract. Number literals: optional sign, then `0` or
//! `[1-9][0-9]*`, optionally followed by `/[1-9][0-9]*` or `.` plus a
//! digit run ending in a nonzero digit. String literals are `"…"` with
//! `\\`, `\"`, `\t`, `\n` escapes.

use crate::diagnostics::{Error, Result, SourceLocation};
use crate::numeric::Rational;

/// A lexical token paired with the source location it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The token's kind and payload.
    pub kind: TokenKind,
    /// Where it begins in the source text.
    pub span: SourceLocation,
}

/// The kinds of token the lexer produces.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `=`
    Equals,
    /// An already-normalised number literal.
    Number(Rational),
    /// A string literal with escapes decoded.
    String(String),
    /// An intrinsic name, e.g. `.+`, `.call/cc`.
    Intrinsic(String),
    /// A bare identifier: a keyword, or a lexical/dynamic variable name.
    Ident(String),
    /// End of input.
    Eof,
}

struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: i64,
    column: i64,
    _source: &'a str,
}

const PUNCTUATION: &str = "`~!@#$%^&*()-_=+[{]}\\|;:'\",<.>/?";

fn is_source_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || PUNCTUATION.contains(c)
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            _source: source,
        }
    }

    fn here(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: self.here(),
                });
                break;
            };
            if !is_source_char(c) {
                return Err(Error::lexer(self.here(), format!("unsupported character {c:?}")));
            }
            let start = self.here();
            let kind = match c {
                '(' => {
                    self.advance();
                    TokenKind::LParen
                }
                ')' => {
                    self.advance();
                    TokenKind::RParen
                }
                '{' => {
                    self.advance();
                    TokenKind::LBrace
                }
                '}' => {
                    self.advance();
                    TokenKind::RBrace
                }
                '=' => {
                    self.advance();
                    TokenKind::Equals
                }
                '"' => self.lex_string(start)?,
                '.' => self.lex_intrinsic(start)?,
                c if c == '+' || c == '-' || c.is_ascii_digit() => {
                    if (c == '+' || c == '-') && !matches!(self.peek_at(1), Some(d) if d.is_ascii_digit()) {
                        return Err(Error::lexer(start, format!("unexpected character {c:?}")));
                    }
                    self.lex_number(start)?
                }
                c if c.is_ascii_alphabetic() || c == '_' => self.lex_ident(start),
                other => return Err(Error::lexer(start, format!("unsupported character {other:?}"))),
            };
            tokens.push(Token { kind, span: start });
        }
        Ok(tokens)
    }

    fn lex_string(&mut self, start: SourceLocation) -> Result<TokenKind> {
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.advance() {
                None => return Err(Error::lexer(start, "unterminated string literal")),
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('\\') => s.push('\\'),
                    Some('"') => s.push('"'),
                    Some('t') => s.push('\t'),
                    Some('n') => s.push('\n'),
                    Some(other) => {
                        return Err(Error::lexer(start, format!("invalid escape \\{other}")))
                    }
                    None => return Err(Error::lexer(start, "unterminated string literal")),
                },
                Some(c) => s.push(c),
            }
        }
        Ok(TokenKind::String(s))
    }

    fn lex_intrinsic(&mut self, start: SourceLocation) -> Result<TokenKind> {
        let mut name = String::new();
        name.push(self.advance().unwrap()); // '.'
        while matches!(self.peek(), Some(c) if !c.is_whitespace() && c != '(' && c != ')' && c != '{' && c != '}') {
            name.push(self.advance().unwrap());
        }
        if name.len() < 2 {
            return Err(Error::lexer(start, "'.' with no intrinsic name"));
        }
        Ok(TokenKind::Intrinsic(name))
    }

    fn lex_number(&mut self, start: SourceLocation) -> Result<TokenKind> {
        let mut text = String::new();
        if matches!(self.peek(), Some('+') | Some('-')) {
            text.push(self.advance().unwrap());
        }
        self.lex_digit_run(&mut text, start)?;
        if self.peek() == Some('/') {
            text.push(self.advance().unwrap());
            self.lex_digit_run(&mut text, start)?;
        } else if self.peek() == Some('.') && matches!(self.peek_at(1), Some(d) if d.is_ascii_digit()) {
            text.push(self.advance().unwrap());
            let mut frac = String::new();
            while matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
                frac.push(self.advance().unwrap());
            }
            if !frac.ends_with(|c: char| c != '0') {
                return Err(Error::lexer(start, "decimal literal must not end in a trailing zero"));
            }
            text.push_str(&frac);
        }
        parse_literal(&text).ok_or_else(|| Error::lexer(start, format!("malformed number literal {text:?}")))
            .map(TokenKind::Number)
    }

    fn lex_digit_run(&mut self, text: &mut String, start: SourceLocation) -> Result<()> {
        let first = self.peek();
        match first {
            Some('0') => {
                text.push(self.advance().unwrap());
                if matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
                    return Err(Error::lexer(start, "a digit run cannot have a leading zero"));
                }
            }
            Some(d) if d.is_ascii_digit() => {
                while matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
                    text.push(self.advance().unwrap());
                }
            }
            _ => return Err(Error::lexer(start, "expected a digit")),
        }
        Ok(())
    }

    fn lex_ident(&mut self, start: SourceLocation) -> TokenKind {
        let mut name = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            name.push(self.advance().unwrap());
        }
        let _ = start;
        TokenKind::Ident(name)
    }
}

fn parse_literal(text: &str) -> Option<Rational> {
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, text.strip_prefix('+').unwrap_or(text)),
    };
    if let Some((n, d)) = rest.split_once('/') {
        return Some(Rational::new(sign * n.parse().ok()?, d.parse().ok()?));
    }
    if let Some((int_part, frac_part)) = rest.split_once('.') {
        let scale = 10i64.checked_pow(frac_part.len() as u32)?;
        let n: i64 = int_part.parse().ok()?;
        let frac: i64 = frac_part.parse().ok()?;
        return Some(Rational::new(sign * (n * scale + frac), scale));
    }
    Some(Rational::new(sign * rest.parse::<i64>().ok()?, 1))
}

/// Tokenizes a complete source string.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_a_call_expression() {
        let tokens = tokenize("(.+ 1 2)").unwrap();
        assert!(matches!(tokens[0].kind, TokenKind::LParen));
        assert!(matches!(&tokens[1].kind, TokenKind::Intrinsic(s) if s == ".+"));
        assert!(matches!(tokens[2].kind, TokenKind::Number(_)));
    }

    #[test]
    fn tokenizes_string_escapes() {
        let tokens = tokenize("\"a\\nb\"").unwrap();
        assert!(matches!(&tokens[0].kind, TokenKind::String(s) if s == "a\nb"));
    }

    #[test]
    fn rejects_a_leading_zero_integer() {
        assert!(tokenize("007").is_err());
    }

    #[test]
    fn parses_a_fraction_literal() {
        let tokens = tokenize("1/6").unwrap();
        assert!(matches!(tokens[0].kind, TokenKind::Number(n) if n == Rational::new(1, 6)));
    }
}
