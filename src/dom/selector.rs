//! Compound CSS selectors.
//!
//! Supports the subset the extractors need: selector lists of compound
//! selectors built from a type selector (or `*`), `#id`, `.class`, `[attr]`
//! and `[attr=value]`. Combinators are rejected.
//!
//! # Example
//!
//! ```
//! use page_relay::dom::Selector;
//!
//! let selector = Selector::parse(r#"main, [role="main"], .post-content"#).unwrap();
//! assert_eq!(selector.len(), 3);
//! assert!(Selector::parse("div > p").is_err());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::{Error, Result};

use super::document::{Document, ElementData, NodeId};

// ============================================================================
// Types
// ============================================================================

/// One condition of a compound selector.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Id(String),
    Class(String),
    HasAttr(String),
    AttrEquals(String, String),
}

/// A compound selector such as `a[href]` or `div.content#main`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound {
    /// Lowercase tag, `None` for `*` or no type selector.
    tag: Option<String>,
    conditions: Vec<Condition>,
}

impl Compound {
    fn matches(&self, element: &ElementData) -> bool {
        if let Some(tag) = &self.tag
            && tag != element.tag()
        {
            return false;
        }

        self.conditions.iter().all(|condition| match condition {
            Condition::Id(id) => element.attribute("id") == Some(id.as_str()),
            Condition::Class(class) => element.has_class(class),
            Condition::HasAttr(name) => element.attribute(name).is_some(),
            Condition::AttrEquals(name, value) => element.attribute(name) == Some(value.as_str()),
        })
    }
}

// ============================================================================
// Selector
// ============================================================================

/// A parsed selector list. An element matches if any compound matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    compounds: Vec<Compound>,
}

impl Selector {
    /// Parses a selector list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] on empty input, combinators, or
    /// malformed attribute brackets.
    pub fn parse(source: &str) -> Result<Self> {
        let compounds = source
            .split(',')
            .map(|part| parse_compound(source, part.trim()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source: source.to_string(),
            compounds,
        })
    }

    /// Number of compound selectors in the list.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.compounds.len()
    }

    /// Always `false`; parsing rejects empty lists.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.compounds.is_empty()
    }

    /// Source text of the selector.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns `true` if element `id` of `document` matches.
    #[must_use]
    pub fn matches(&self, document: &Document, id: NodeId) -> bool {
        document
            .element(id)
            .is_some_and(|element| self.compounds.iter().any(|c| c.matches(element)))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

// ============================================================================
// Parsing
// ============================================================================

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn read_ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }
    ident
}

fn parse_compound(source: &str, part: &str) -> Result<Compound> {
    let fail = |reason: &str| Error::invalid_selector(source, reason);

    if part.is_empty() {
        return Err(fail("empty compound selector"));
    }

    let mut chars = part.chars().peekable();
    let mut compound = Compound {
        tag: None,
        conditions: Vec::new(),
    };

    match chars.peek() {
        Some(&'*') => {
            chars.next();
        }
        Some(&c) if is_ident_char(c) => {
            compound.tag = Some(read_ident(&mut chars).to_ascii_lowercase());
        }
        _ => {}
    }

    while let Some(c) = chars.next() {
        match c {
            '#' | '.' => {
                let ident = read_ident(&mut chars);
                if ident.is_empty() {
                    return Err(fail("expected a name after '#' or '.'"));
                }
                compound.conditions.push(if c == '#' {
                    Condition::Id(ident)
                } else {
                    Condition::Class(ident)
                });
            }
            '[' => {
                let condition = parse_attribute(&mut chars).map_err(fail)?;
                compound.conditions.push(condition);
            }
            c if c.is_whitespace() || matches!(c, '>' | '+' | '~') => {
                return Err(fail("combinators are not supported"));
            }
            _ => return Err(fail("unexpected character")),
        }
    }

    Ok(compound)
}

fn parse_attribute(
    chars: &mut Peekable<Chars<'_>>,
) -> std::result::Result<Condition, &'static str> {
    let name = read_ident(chars).to_ascii_lowercase();
    if name.is_empty() {
        return Err("expected an attribute name");
    }

    match chars.next() {
        Some(']') => Ok(Condition::HasAttr(name)),
        Some('=') => {
            let value = match chars.peek() {
                Some(&quote @ ('"' | '\'')) => {
                    chars.next();
                    let mut value = String::new();
                    loop {
                        match chars.next() {
                            Some(c) if c == quote => break,
                            Some(c) => value.push(c),
                            None => return Err("unterminated attribute value"),
                        }
                    }
                    value
                }
                _ => read_ident(chars),
            };
            match chars.next() {
                Some(']') => Ok(Condition::AttrEquals(name, value)),
                _ => Err("expected ']'"),
            }
        }
        _ => Err("expected ']' or '='"),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    fn doc() -> Document {
        let root = Element::new("html").child(Element::new("body").children([
            Element::new("div").class("main-content wide").id("x"),
            Element::new("div").attr("role", "main"),
            Element::new("a").attr("href", "/a"),
            Element::new("a"),
            Element::new("META")
                .attr("name", "description")
                .attr("content", "d"),
        ]));
        Document::new("https://example.com/", root).expect("valid document")
    }

    #[test]
    fn test_parse_list() {
        let selector = Selector::parse("script, style, nav, header, footer").expect("parse");
        assert_eq!(selector.len(), 5);
        assert_eq!(selector.to_string(), "script, style, nav, header, footer");
    }

    #[test]
    fn test_class_and_id() {
        let doc = doc();
        assert_eq!(doc.count(".main-content").expect("selector"), 1);
        assert_eq!(doc.count(".wide#x").expect("selector"), 1);
        assert_eq!(doc.count("div.content").expect("selector"), 0);
    }

    #[test]
    fn test_attribute_forms() {
        let doc = doc();
        assert_eq!(doc.count(r#"[role="main"]"#).expect("selector"), 1);
        assert_eq!(doc.count("[role='main']").expect("selector"), 1);
        assert_eq!(doc.count("[role=main]").expect("selector"), 1);
        assert_eq!(doc.count("a[href]").expect("selector"), 1);
        assert_eq!(
            doc.count(r#"meta[name="description"]"#).expect("selector"),
            1
        );
    }

    #[test]
    fn test_universal() {
        let doc = doc();
        assert_eq!(doc.count("*").expect("selector"), 7);
    }

    #[test]
    fn test_rejects_invalid() {
        for bad in ["", "div p", "a >b", "[href", "[=x]", ".", "div,", "a[href=\"x]"] {
            assert!(
                matches!(Selector::parse(bad), Err(Error::InvalidSelector { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
