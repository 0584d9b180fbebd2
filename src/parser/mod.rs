//! Recursive-descent parser producing [`crate::ast::Expr`] trees.
//!
//! Surface grammar (in addition to tokens in [`crate::lexer`]):
//!
//! ```text
//! expr       := NUMBER | STRING | lambda | letrec | if | query | access | call | IDENT
//! lambda     := 'lambda' '(' IDENT* ')' block
//! letrec     := 'letrec' '(' (IDENT '=' expr)* ')' block
//! block      := '{' expr+ '}'              -- a lone expr is returned unwrapped
//! if         := 'if' expr 'then' expr 'else' expr
//! call       := '(' (INTRINSIC | expr) expr* ')'
//! query      := '(' 'query' IDENT [expr] ')'
//! access     := '(' 'access' IDENT expr ')'
//! ```
//!
//! `query` and `access` are reserved words; they cannot be used as ordinary
//! variable names.

use crate::ast::{Binding, Expr, Lambda, Node, Spanned};
use crate::diagnostics::{Error, Result, SourceLocation};
use crate::lexer::{self, Token, TokenKind};
use std::rc::Rc;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn span(&self) -> SourceLocation {
        self.tokens[self.pos].span
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token> {
        if self.peek() == kind {
            Ok(self.advance())
        } else {
            Err(Error::parser(self.span(), format!("expected {what}, found {:?}", self.peek())))
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<()> {
        match self.peek().clone() {
            TokenKind::Ident(name) if name == expected => {
                self.advance();
                Ok(())
            }
            other => Err(Error::parser(
                self.span(),
                format!("expected keyword '{expected}', found {other:?}"),
            )),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        let start = self.span();
        match self.peek().clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(spanned(Node::Number(n), start))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(spanned(Node::String(s), start))
            }
            TokenKind::Ident(name) => {
                self.advance();
                match name.as_str() {
                    "lambda" => self.parse_lambda(start),
                    "letrec" => self.parse_letrec(start),
                    "if" => self.parse_if(start),
                    "query" | "access" | "then" | "else" => Err(Error::parser(
                        start,
                        format!("'{name}' is reserved and cannot stand alone as an expression"),
                    )),
                    _ => Ok(spanned(Node::Variable(name), start)),
                }
            }
            TokenKind::LParen => self.parse_parenthesized(start),
            other => Err(Error::parser(start, format!("unexpected token {other:?}"))),
        }
    }

    fn parse_lambda(&mut self, start: SourceLocation) -> Result<Expr> {
        self.expect(&TokenKind::LParen, "'(' after 'lambda'")?;
        let mut params = Vec::new();
        while !matches!(self.peek(), TokenKind::RParen) {
            match self.peek().clone() {
                TokenKind::Ident(name) => {
                    self.advance();
                    params.push(name);
                }
                other => return Err(Error::parser(self.span(), format!("expected a parameter name, found {other:?}"))),
            }
        }
        self.advance(); // ')'
        let body = self.parse_block()?;
        Ok(spanned(Node::Lambda(Rc::new(Lambda { params, body })), start))
    }

    fn parse_letrec(&mut self, start: SourceLocation) -> Result<Expr> {
        self.expect(&TokenKind::LParen, "'(' after 'letrec'")?;
        let mut bindings = Vec::new();
        while !matches!(self.peek(), TokenKind::RParen) {
            let name = match self.peek().clone() {
                TokenKind::Ident(name) => {
                    self.advance();
                    name
                }
                other => return Err(Error::parser(self.span(), format!("expected a binding name, found {other:?}"))),
            };
            self.expect(&TokenKind::Equals, "'=' in letrec binding")?;
            let expr = self.parse_expr()?;
            bindings.push(Binding { name, expr });
        }
        self.advance(); // ')'
        let body = self.parse_block()?;
        Ok(spanned(Node::Letrec(bindings, body), start))
    }

    fn parse_if(&mut self, start: SourceLocation) -> Result<Expr> {
        let cond = self.parse_expr()?;
        self.expect_ident("then")?;
        let conseq = self.parse_expr()?;
        self.expect_ident("else")?;
        let alt = self.parse_expr()?;
        Ok(spanned(Node::If(cond, conseq, alt), start))
    }

    fn parse_block(&mut self) -> Result<Expr> {
        let start = self.span();
        self.expect(&TokenKind::LBrace, "'{' to open a block")?;
        let mut exprs = Vec::new();
        while !matches!(self.peek(), TokenKind::RBrace) {
            exprs.push(self.parse_expr()?);
        }
        self.advance(); // '}'
        if exprs.is_empty() {
            return Err(Error::parser(start, "a block must contain at least one expression"));
        }
        if exprs.len() == 1 {
            Ok(exprs.into_iter().next().unwrap())
        } else {
            Ok(spanned(Node::Sequence(exprs), start))
        }
    }

    fn parse_parenthesized(&mut self, start: SourceLocation) -> Result<Expr> {
        self.advance(); // '('
        if let TokenKind::Ident(name) = self.peek().clone() {
            if name == "query" {
                self.advance();
                return self.parse_query(start);
            }
            if name == "access" {
                self.advance();
                return self.parse_access(start);
            }
        }
        let callee = match self.peek().clone() {
            TokenKind::Intrinsic(name) => {
                let span = self.span();
                self.advance();
                spanned(Node::Intrinsic(name), span)
            }
            _ => self.parse_expr()?,
        };
        let mut args = Vec::new();
        while !matches!(self.peek(), TokenKind::RParen) {
            args.push(self.parse_expr()?);
        }
        self.advance(); // ')'
        Ok(spanned(Node::Call(callee, args), start))
    }

    fn parse_query(&mut self, start: SourceLocation) -> Result<Expr> {
        let name = match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                name
            }
            other => return Err(Error::parser(self.span(), format!("expected a variable name, found {other:?}"))),
        };
        let closure_expr = if matches!(self.peek(), TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&TokenKind::RParen, "')' to close query")?;
        if Node::is_dynamic_name(&name) && closure_expr.is_some() {
            return Err(Error::parser(start, "a dynamic query takes no closure expression"));
        }
        if Node::is_lexical_name(&name) && closure_expr.is_none() {
            return Err(Error::parser(start, "a lexical query requires a closure expression"));
        }
        Ok(spanned(Node::Query(name, closure_expr), start))
    }

    fn parse_access(&mut self, start: SourceLocation) -> Result<Expr> {
        let name = match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                name
            }
            other => return Err(Error::parser(self.span(), format!("expected a variable name, found {other:?}"))),
        };
        if Node::is_dynamic_name(&name) {
            return Err(Error::parser(start, "'access' only reads lexical bindings"));
        }
        let closure_expr = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "')' to close access")?;
        Ok(spanned(Node::Access(name, closure_expr), start))
    }
}

fn spanned(node: Node, span: SourceLocation) -> Expr {
    Rc::new(Spanned::new(node, span))
}

/// Parses a complete program: exactly one expression, then end of input.
pub fn parse(source: &str) -> Result<Expr> {
    let tokens = lexer::tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    if !matches!(parser.peek(), TokenKind::Eof) {
        return Err(Error::parser(parser.span(), format!("unexpected trailing token {:?}", parser.peek())));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;

    #[test]
    fn parses_a_call() {
        let expr = parse("(.+ 1 2)").unwrap();
        assert!(matches!(&expr.node, Node::Call(_, args) if args.len() == 2));
    }

    #[test]
    fn parses_letrec_with_mutual_recursion() {
        let expr = parse(
            "letrec (g = lambda (a b) { if (.< b 1) then a else (g b (.% a b)) }) { (g 45 60) }",
        )
        .unwrap();
        assert!(matches!(&expr.node, Node::Letrec(bindings, _) if bindings.len() == 1));
    }

    #[test]
    fn rejects_an_empty_block() {
        assert!(parse("lambda () { }").is_err());
    }

    #[test]
    fn parses_a_dynamic_query_without_closure_expr() {
        let expr = parse("(query X)").unwrap();
        assert!(matches!(&expr.node, Node::Query(name, None) if name == "X"));
    }

    #[test]
    fn requires_a_closure_expr_for_a_lexical_query() {
        assert!(parse("(query x)").is_err());
    }

    #[test]
    fn parses_an_access() {
        let expr = parse("(access x (lambda () { x }))").unwrap();
        assert!(matches!(&expr.node, Node::Access(name, _) if name == "x"));
    }
}
