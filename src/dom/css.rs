//! CSS identifier escaping and a parser for the selector subset produced by
//! the selector generator: compound selectors (`tag`, `*`, `.class`, `#id`,
//! `:nth-child(n)`) joined by the child combinator `>`.

use crate::error::{BrowserError, Result};
use std::fmt::Write;

/// Escape a string for use as a CSS identifier, following the CSSOM
/// `CSS.escape()` algorithm.
pub fn escape_identifier(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1f}' | '\u{7f}' => push_hex_escape(&mut out, c),
            '0'..='9' if i == 0 || (i == 1 && chars[0] == '-') => push_hex_escape(&mut out, c),
            '-' if i == 0 && chars.len() == 1 => out.push_str("\\-"),
            c if c as u32 >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }

    out
}

fn push_hex_escape(out: &mut String, c: char) {
    let _ = write!(out, "\\{:x} ", c as u32);
}

/// One compound selector: every part must match the same element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompoundSelector {
    /// Lowercase tag name, `None` for `*` or when omitted
    pub tag: Option<String>,
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    /// 1-based `:nth-child()` position
    pub nth_child: Option<usize>,
}

/// Compound selectors joined by child combinators, leftmost first
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorChain {
    compounds: Vec<CompoundSelector>,
}

impl SelectorChain {
    /// Parse a selector string
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = Parser::new(input);
        parser.skip_whitespace();
        let mut compounds = vec![parser.compound()?];

        loop {
            parser.skip_whitespace();
            match parser.peek() {
                None => break,
                Some('>') => {
                    parser.bump();
                    parser.skip_whitespace();
                    compounds.push(parser.compound()?);
                }
                Some(c) => return Err(parser.error(format!("unsupported character '{}'", c))),
            }
        }

        Ok(Self { compounds })
    }

    pub fn compounds(&self) -> &[CompoundSelector] {
        &self.compounds
    }

    /// The compound that must match the selected element itself
    pub fn subject(&self) -> &CompoundSelector {
        // parse() never produces an empty chain
        &self.compounds[self.compounds.len() - 1]
    }
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn error(&self, reason: impl Into<String>) -> BrowserError {
        BrowserError::invalid_selector(self.input, format!("{} at offset {}", reason.into(), self.pos))
    }

    fn compound(&mut self) -> Result<CompoundSelector> {
        let mut compound = CompoundSelector::default();
        let mut empty = true;

        if self.peek() == Some('*') {
            self.bump();
            empty = false;
        } else if self.starts_identifier() {
            compound.tag = Some(self.identifier()?.to_ascii_lowercase());
            empty = false;
        }

        loop {
            match self.peek() {
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.identifier()?);
                }
                Some('#') => {
                    self.bump();
                    compound.ids.push(self.identifier()?);
                }
                Some(':') => {
                    self.bump();
                    compound.nth_child = Some(self.nth_child()?);
                }
                _ => break,
            }
            empty = false;
        }

        if empty {
            return Err(self.error("expected a selector"));
        }
        Ok(compound)
    }

    fn nth_child(&mut self) -> Result<usize> {
        let name = self.identifier()?;
        if !name.eq_ignore_ascii_case("nth-child") {
            return Err(self.error(format!("unsupported pseudo-class ':{}'", name)));
        }
        if self.bump() != Some('(') {
            return Err(self.error("expected '('"));
        }
        self.skip_whitespace();

        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        let position: usize = digits
            .parse()
            .map_err(|_| self.error("expected a child position"))?;

        self.skip_whitespace();
        if self.bump() != Some(')') {
            return Err(self.error("expected ')'"));
        }
        if position == 0 {
            return Err(self.error("child positions start at 1"));
        }
        Ok(position)
    }

    fn starts_identifier(&self) -> bool {
        let first = self.peek();
        let second = self.chars.get(self.pos + 1).copied();
        match first {
            Some('-') => matches!(second, Some(c) if is_name_start(c) || c == '-' || c == '\\'),
            Some('\\') => true,
            Some(c) => is_name_start(c),
            None => false,
        }
    }

    fn identifier(&mut self) -> Result<String> {
        if !self.starts_identifier() {
            return Err(self.error("expected an identifier"));
        }

        let mut out = String::new();
        loop {
            match self.peek() {
                Some('\\') => out.push(self.escape()?),
                Some(c) if is_name_char(c) => {
                    out.push(c);
                    self.bump();
                }
                _ => break,
            }
        }
        Ok(out)
    }

    fn escape(&mut self) -> Result<char> {
        self.bump();
        match self.peek() {
            None => Err(self.error("dangling escape")),
            Some('\n') | Some('\r') | Some('\u{c}') => Err(self.error("escaped newline")),
            Some(c) if c.is_ascii_hexdigit() => {
                let start = self.pos;
                while self.pos - start < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                    self.pos += 1;
                }
                let hex: String = self.chars[start..self.pos].iter().collect();
                if self.peek().is_some_and(char::is_whitespace) {
                    self.pos += 1;
                }
                let code = u32::from_str_radix(&hex, 16).unwrap_or(0xFFFD);
                Ok(match char::from_u32(code) {
                    Some('\0') | None => '\u{FFFD}',
                    Some(c) => c,
                })
            }
            Some(c) => {
                self.bump();
                Ok(c)
            }
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c as u32 >= 0x80
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_identifiers() {
        assert_eq!(escape_identifier("btn-primary"), "btn-primary");
        assert_eq!(escape_identifier("_private"), "_private");
        assert_eq!(escape_identifier("ünï"), "ünï");
    }

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(escape_identifier("md:flex"), "md\\:flex");
        assert_eq!(escape_identifier("w-1/2"), "w-1\\/2");
        assert_eq!(escape_identifier("a.b"), "a\\.b");
        assert_eq!(escape_identifier("-"), "\\-");
    }

    #[test]
    fn test_escape_leading_digits() {
        assert_eq!(escape_identifier("1col"), "\\31 col");
        assert_eq!(escape_identifier("-2x"), "-\\32 x");
        assert_eq!(escape_identifier("a1"), "a1");
    }

    #[test]
    fn test_parse_chain() {
        let chain = SelectorChain::parse("#app > ul.menu.open > li:nth-child(3)").unwrap();
        let compounds = chain.compounds();

        assert_eq!(compounds.len(), 3);
        assert_eq!(compounds[0].ids, vec!["app"]);
        assert_eq!(compounds[1].tag.as_deref(), Some("ul"));
        assert_eq!(compounds[1].classes, vec!["menu", "open"]);
        assert_eq!(chain.subject().tag.as_deref(), Some("li"));
        assert_eq!(chain.subject().nth_child, Some(3));
    }

    #[test]
    fn test_parse_round_trips_escaped_identifiers() {
        for raw in ["md:flex", "1col", "w-1/2", "-", "a b", "-2x"] {
            let selector = format!("div.{}", escape_identifier(raw));
            let chain = SelectorChain::parse(&selector).unwrap();
            assert_eq!(chain.subject().classes, vec![raw.to_string()], "selector {}", selector);
        }
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        for bad in ["", "div.", ".1col", "div >", "a b", "li:hover", "li:nth-child(0)", "div.x\\"] {
            let err = SelectorChain::parse(bad).unwrap_err();
            assert!(matches!(err, BrowserError::InvalidSelector { .. }), "{} parsed", bad);
        }
    }

    #[test]
    fn test_parse_universal_and_case() {
        let chain = SelectorChain::parse("*.Card > DIV").unwrap();
        assert_eq!(chain.compounds()[0].tag, None);
        assert_eq!(chain.compounds()[0].classes, vec!["Card"]);
        assert_eq!(chain.subject().tag.as_deref(), Some("div"));
    }
}
