//! Boolean condition expressions
//!
//! Liberty `when` attributes restrict a characterization group to the input
//! states in which it applies. The expression tree owns its subexpressions;
//! dropping the root releases the whole tree.
//!
//! # Syntax
//!
//! - `!A`, `A'` - negation
//! - `A & B`, `A * B`, `A B` - and
//! - `A ^ B` - xor
//! - `A | B`, `A + B` - or
//! - `0`, `1` - constants
//!
//! Precedence from loosest to tightest: or, and, xor, negation.

use crate::error::{LibertyError, Result};
use std::fmt;

/// Boolean function of cell ports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FuncExpr {
    Port(String),
    Not(Box<FuncExpr>),
    And(Box<FuncExpr>, Box<FuncExpr>),
    Or(Box<FuncExpr>, Box<FuncExpr>),
    Xor(Box<FuncExpr>, Box<FuncExpr>),
    One,
    Zero,
}

impl FuncExpr {
    pub fn port(name: &str) -> Self {
        FuncExpr::Port(name.to_string())
    }

    pub fn not(expr: FuncExpr) -> Self {
        FuncExpr::Not(Box::new(expr))
    }

    pub fn and(lhs: FuncExpr, rhs: FuncExpr) -> Self {
        FuncExpr::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn or(lhs: FuncExpr, rhs: FuncExpr) -> Self {
        FuncExpr::Or(Box::new(lhs), Box::new(rhs))
    }

    pub fn xor(lhs: FuncExpr, rhs: FuncExpr) -> Self {
        FuncExpr::Xor(Box::new(lhs), Box::new(rhs))
    }

    /// Parse a Liberty function string
    pub fn parse(source: &str) -> Result<Self> {
        let mut parser = ExprParser::new(source);
        let expr = parser.parse_or()?;
        parser.skip_whitespace();
        if !parser.is_eof() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(expr)
    }

    /// Port names referenced by the expression, in first-use order
    pub fn ports(&self) -> Vec<&str> {
        let mut ports = Vec::new();
        self.collect_ports(&mut ports);
        ports
    }

    fn collect_ports<'a>(&'a self, ports: &mut Vec<&'a str>) {
        match self {
            FuncExpr::Port(name) => {
                if !ports.contains(&name.as_str()) {
                    ports.push(name);
                }
            }
            FuncExpr::Not(expr) => expr.collect_ports(ports),
            FuncExpr::And(lhs, rhs) | FuncExpr::Or(lhs, rhs) | FuncExpr::Xor(lhs, rhs) => {
                lhs.collect_ports(ports);
                rhs.collect_ports(ports);
            }
            FuncExpr::One | FuncExpr::Zero => {}
        }
    }

    /// Evaluate with the given port values; unknown ports read as false
    pub fn eval(&self, value_of: &impl Fn(&str) -> Option<bool>) -> bool {
        match self {
            FuncExpr::Port(name) => value_of(name).unwrap_or(false),
            FuncExpr::Not(expr) => !expr.eval(value_of),
            FuncExpr::And(lhs, rhs) => lhs.eval(value_of) && rhs.eval(value_of),
            FuncExpr::Or(lhs, rhs) => lhs.eval(value_of) || rhs.eval(value_of),
            FuncExpr::Xor(lhs, rhs) => lhs.eval(value_of) ^ rhs.eval(value_of),
            FuncExpr::One => true,
            FuncExpr::Zero => false,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            FuncExpr::Or(..) => 1,
            FuncExpr::And(..) => 2,
            FuncExpr::Xor(..) => 3,
            _ => 4,
        }
    }

    fn fmt_operand(&self, parent: u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.precedence() < parent {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for FuncExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = self.precedence();
        match self {
            FuncExpr::Port(name) => f.write_str(name),
            FuncExpr::Not(expr) => {
                f.write_str("!")?;
                expr.fmt_operand(4, f)
            }
            FuncExpr::And(lhs, rhs) => {
                lhs.fmt_operand(prec, f)?;
                f.write_str(" & ")?;
                rhs.fmt_operand(prec + 1, f)
            }
            FuncExpr::Or(lhs, rhs) => {
                lhs.fmt_operand(prec, f)?;
                f.write_str(" | ")?;
                rhs.fmt_operand(prec + 1, f)
            }
            FuncExpr::Xor(lhs, rhs) => {
                lhs.fmt_operand(prec, f)?;
                f.write_str(" ^ ")?;
                rhs.fmt_operand(prec + 1, f)
            }
            FuncExpr::One => f.write_str("1"),
            FuncExpr::Zero => f.write_str("0"),
        }
    }
}

struct ExprParser<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> ExprParser<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn parse_or(&mut self) -> Result<FuncExpr> {
        let mut lhs = self.parse_and()?;
        loop {
            self.skip_whitespace();
            match self.peek_char() {
                Some('|') | Some('+') => {
                    self.advance();
                    let rhs = self.parse_and()?;
                    lhs = FuncExpr::or(lhs, rhs);
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn parse_and(&mut self) -> Result<FuncExpr> {
        let mut lhs = self.parse_xor()?;
        loop {
            self.skip_whitespace();
            match self.peek_char() {
                Some('&') | Some('*') => {
                    self.advance();
                    let rhs = self.parse_xor()?;
                    lhs = FuncExpr::and(lhs, rhs);
                }
                // Juxtaposition is an implicit and
                Some(c) if starts_operand(c) => {
                    let rhs = self.parse_xor()?;
                    lhs = FuncExpr::and(lhs, rhs);
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn parse_xor(&mut self) -> Result<FuncExpr> {
        let mut lhs = self.parse_unary()?;
        loop {
            self.skip_whitespace();
            if self.peek_char() == Some('^') {
                self.advance();
                let rhs = self.parse_unary()?;
                lhs = FuncExpr::xor(lhs, rhs);
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_unary(&mut self) -> Result<FuncExpr> {
        self.skip_whitespace();
        let mut expr = match self.peek_char() {
            Some('!') => {
                self.advance();
                FuncExpr::not(self.parse_unary()?)
            }
            Some('(') => {
                self.advance();
                let inner = self.parse_or()?;
                self.skip_whitespace();
                if self.peek_char() != Some(')') {
                    return Err(self.error("expected ')'"));
                }
                self.advance();
                inner
            }
            Some(c) if is_name_char(c) => {
                let name = self.parse_name();
                match name.as_str() {
                    "0" => FuncExpr::Zero,
                    "1" => FuncExpr::One,
                    _ => FuncExpr::Port(name),
                }
            }
            Some(c) => return Err(self.error(&format!("unexpected '{}'", c))),
            None => return Err(self.error("unexpected end of expression")),
        };

        // Postfix negation binds to the operand just read
        loop {
            self.skip_whitespace();
            if self.peek_char() != Some('\'') {
                break;
            }
            self.advance();
            expr = FuncExpr::not(expr);
        }
        Ok(expr)
    }

    fn parse_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek_char() {
            if is_name_char(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        name
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn error(&self, message: &str) -> LibertyError {
        LibertyError::InvalidExpression {
            expr: self.source.to_string(),
            message: format!("{} at offset {}", message, self.pos),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '[' | ']' | '.')
}

fn starts_operand(c: char) -> bool {
    is_name_char(c) || c == '!' || c == '('
}
