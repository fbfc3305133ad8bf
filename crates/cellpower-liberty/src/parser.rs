//! Liberty File Parser
//!
//! Turns Liberty source text into a tree of generic groups and attributes.
//! The parser knows nothing about cells or tables; [`crate::reader`] walks
//! the tree and builds the library.
//!
//! # Syntax
//!
//! ```text
//! group_kind (arg, ...) { statements }
//! simple_attribute : value ;
//! complex_attribute (arg, ...) ;
//! ```
//!
//! Block (`/* */`) and line (`//`) comments are skipped, as are backslash
//! line continuations inside argument lists.

use crate::error::{LibertyError, Result};

/// Value of an attribute statement
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// `name : value ;`
    Simple(String),
    /// `name (arg, ...) ;`
    Complex(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibertyAttribute {
    pub name: String,
    pub value: AttrValue,
    pub line: usize,
}

/// A `kind (args) { ... }` group with its statements in source order
#[derive(Debug, Clone, PartialEq)]
pub struct LibertyGroup {
    pub kind: String,
    pub args: Vec<String>,
    pub attributes: Vec<LibertyAttribute>,
    pub groups: Vec<LibertyGroup>,
    pub line: usize,
}

impl LibertyGroup {
    /// First group argument, usually the group's name
    pub fn name(&self) -> Option<&str> {
        self.args.first().map(|s| s.as_str())
    }

    /// Last value given for a simple attribute
    pub fn simple(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .rev()
            .find_map(|attr| match &attr.value {
                AttrValue::Simple(value) if attr.name == name => Some(value.as_str()),
                _ => None,
            })
    }

    /// Last argument list given for a complex attribute
    pub fn complex(&self, name: &str) -> Option<&[String]> {
        self.attributes
            .iter()
            .rev()
            .find_map(|attr| match &attr.value {
                AttrValue::Complex(args) if attr.name == name => Some(args.as_slice()),
                _ => None,
            })
    }

    pub fn attribute(&self, name: &str) -> Option<&LibertyAttribute> {
        self.attributes.iter().rev().find(|attr| attr.name == name)
    }

    /// Subgroups of one kind, in source order
    pub fn groups_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a LibertyGroup> {
        self.groups.iter().filter(move |group| group.kind == kind)
    }
}

/// Parse a complete Liberty source; it must hold exactly one top-level group
pub fn parse(content: &str) -> Result<LibertyGroup> {
    let mut parser = LibertyParser::new(content);
    parser.parse()
}

struct LibertyParser<'a> {
    content: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> LibertyParser<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            content,
            pos: 0,
            line: 1,
        }
    }

    fn parse(&mut self) -> Result<LibertyGroup> {
        self.skip_whitespace();
        let line = self.line();
        let kind = self.parse_identifier()?;
        if !self.consume_char('(') {
            return Err(self.error("Expected '('"));
        }
        let args = self.parse_args()?;
        if !self.consume_char('{') {
            return Err(self.error("Expected '{'"));
        }
        let group = self.parse_group_body(kind, args, line)?;

        self.skip_whitespace();
        if !self.is_eof() {
            return Err(self.error("Unexpected content after top-level group"));
        }
        Ok(group)
    }

    fn parse_group_body(
        &mut self,
        kind: String,
        args: Vec<String>,
        line: usize,
    ) -> Result<LibertyGroup> {
        let mut group = LibertyGroup {
            kind,
            args,
            attributes: Vec::new(),
            groups: Vec::new(),
            line,
        };

        loop {
            self.skip_whitespace();

            match self.peek_char() {
                Some('}') => {
                    self.advance();
                    break;
                }
                Some(';') => {
                    // Stray separator
                    self.advance();
                    continue;
                }
                None => return Err(self.error("Unexpected end of file in group")),
                _ => {}
            }

            let line = self.line();
            let name = self.parse_identifier()?;

            if self.consume_char(':') {
                let value = self.parse_value()?;
                self.consume_char(';');
                group.attributes.push(LibertyAttribute {
                    name,
                    value: AttrValue::Simple(value),
                    line,
                });
            } else if self.consume_char('(') {
                let args = self.parse_args()?;
                if self.consume_char('{') {
                    let sub = self.parse_group_body(name, args, line)?;
                    group.groups.push(sub);
                } else {
                    self.consume_char(';');
                    group.attributes.push(LibertyAttribute {
                        name,
                        value: AttrValue::Complex(args),
                        line,
                    });
                }
            } else {
                return Err(self.error(&format!("Expected ':' or '(' after '{}'", name)));
            }
        }

        Ok(group)
    }

    /// Comma separated arguments up to the matching ')'.
    ///
    /// Commas inside quotes do not split; quotes are removed.
    fn parse_args(&mut self) -> Result<Vec<String>> {
        let mut args = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut quoted = false;

        loop {
            let c = match self.peek_char() {
                Some(c) => c,
                None => return Err(self.error("Unexpected end of file in parentheses")),
            };
            self.advance();

            match c {
                '"' => {
                    in_quotes = !in_quotes;
                    quoted = true;
                }
                // Line continuation
                '\\' => {}
                ',' if !in_quotes => {
                    args.push(current.trim().to_string());
                    current.clear();
                    quoted = false;
                }
                ')' if !in_quotes => {
                    let last = current.trim();
                    if !last.is_empty() || quoted || !args.is_empty() {
                        args.push(last.to_string());
                    }
                    return Ok(args);
                }
                '\n' if !in_quotes => current.push(' '),
                _ => current.push(c),
            }
        }
    }

    fn parse_identifier(&mut self) -> Result<String> {
        let mut result = String::new();

        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                result.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if result.is_empty() {
            Err(self.error("Expected identifier"))
        } else {
            Ok(result)
        }
    }

    fn parse_value(&mut self) -> Result<String> {
        self.skip_whitespace();

        let mut result = String::new();

        if self.peek_char() == Some('"') {
            self.advance();
            loop {
                match self.peek_char() {
                    Some('"') => {
                        self.advance();
                        break;
                    }
                    Some(c) => {
                        result.push(c);
                        self.advance();
                    }
                    None => return Err(self.error("Unterminated string")),
                }
            }
        } else {
            while let Some(c) = self.peek_char() {
                if c == ';' || c == '{' || c == '}' || c == '\n' {
                    break;
                }
                result.push(c);
                self.advance();
            }
            let trimmed = result.trim_end().len();
            result.truncate(trimmed);
        }

        if result.is_empty() {
            return Err(self.error("Expected attribute value"));
        }
        Ok(result)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || c == '\\' {
                self.advance();
            } else if c == '/' && self.content[self.pos..].starts_with("/*") {
                let end = match self.content[self.pos + 2..].find("*/") {
                    Some(end) => self.pos + end + 4,
                    None => self.content.len(),
                };
                self.jump_to(end);
            } else if c == '/' && self.content[self.pos..].starts_with("//") {
                let end = match self.content[self.pos..].find('\n') {
                    Some(end) => self.pos + end + 1,
                    None => self.content.len(),
                };
                self.jump_to(end);
            } else {
                break;
            }
        }
    }

    fn consume_char(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.content[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
            }
        }
    }

    /// Skip ahead to `end`, counting the newlines passed over
    fn jump_to(&mut self, end: usize) {
        self.line += self.content[self.pos..end].matches('\n').count();
        self.pos = end;
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.content.len()
    }

    fn line(&self) -> usize {
        self.line
    }

    fn error(&self, message: &str) -> LibertyError {
        LibertyError::Parse {
            message: message.to_string(),
            line: self.line(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_groups() {
        let content = r#"
            library(test_lib) {
                time_unit : "1ns";
                capacitive_load_unit (1, pf);

                cell(INV_X1) {
                    area : 1.0;
                    pin(A) {
                        direction : input;
                    }
                }
            }
        "#;

        let lib = parse(content).unwrap();
        assert_eq!(lib.kind, "library");
        assert_eq!(lib.name(), Some("test_lib"));
        assert_eq!(lib.simple("time_unit"), Some("1ns"));
        assert_eq!(
            lib.complex("capacitive_load_unit"),
            Some(&["1".to_string(), "pf".to_string()][..])
        );

        let cell = lib.groups_of("cell").next().unwrap();
        assert_eq!(cell.name(), Some("INV_X1"));
        assert_eq!(cell.simple("area"), Some("1.0"));
        assert_eq!(cell.line, 6);
        let pin = cell.groups_of("pin").next().unwrap();
        assert_eq!(pin.simple("direction"), Some("input"));
    }

    #[test]
    fn test_parse_empty_args_and_quoted_lists() {
        let content = r#"
            library(l) {
                cell(C) {
                    pin(Y) {
                        internal_power () {
                            related_pin : "A B";
                            rise_power (tmpl) {
                                index_1 ("0.1, 0.2");
                                values ("1.0, 2.0", \
                                        "3.0, 4.0");
                            }
                        }
                    }
                }
            }
        "#;

        let lib = parse(content).unwrap();
        let power = lib.groups[0].groups[0].groups[0].clone();
        assert_eq!(power.kind, "internal_power");
        assert!(power.args.is_empty());
        assert_eq!(power.simple("related_pin"), Some("A B"));

        let rise = power.groups_of("rise_power").next().unwrap();
        assert_eq!(rise.name(), Some("tmpl"));
        assert_eq!(rise.complex("index_1"), Some(&["0.1, 0.2".to_string()][..]));
        assert_eq!(
            rise.complex("values"),
            Some(&["1.0, 2.0".to_string(), "3.0, 4.0".to_string()][..])
        );
    }

    #[test]
    fn test_parse_with_comments() {
        let content = r#"
            /* Block comment */
            library(test_lib) {
                // Line comment
                time_unit : "1ns";

                /* Another
                   multiline
                   comment */
                cell(BUF) {
                    area : 1.5;
                }
            }
        "#;

        let lib = parse(content).unwrap();
        assert_eq!(lib.groups_of("cell").count(), 1);
    }

    #[test]
    fn test_line_numbers_across_comments() {
        let content = "library(l) {\n  /* one\n     two */\n  // three\n  cell(A) {\n  }\n  cell(B) { area : 1.0; }\n}\n";

        let lib = parse(content).unwrap();
        let lines: Vec<usize> = lib.groups.iter().map(|group| group.line).collect();
        assert_eq!(lines, vec![5, 7]);
        assert_eq!(lib.groups[1].attribute("area").unwrap().line, 7);

        let err = parse("library(l) {\n/* open\n\n").unwrap_err();
        assert!(matches!(err, LibertyError::Parse { line: 4, .. }));
    }

    #[test]
    fn test_last_attribute_wins() {
        let lib = parse("library(l) { nom_voltage : 1.0; nom_voltage : 1.2; }").unwrap();
        assert_eq!(lib.simple("nom_voltage"), Some("1.2"));
        assert_eq!(lib.attribute("nom_voltage").unwrap().line, 1);
    }

    #[test]
    fn test_parse_errors() {
        let err = parse("library(l) {\n  cell(C) {\n").unwrap_err();
        assert!(matches!(err, LibertyError::Parse { line: 3, .. }));

        assert!(parse("library(l) { area 1.0; }").is_err());
        assert!(parse("library l { }").is_err());
        assert!(parse("library(l) { } extra").is_err());
        assert!(parse("library(l) { time_unit : \"1ns; }").is_err());
    }
}
