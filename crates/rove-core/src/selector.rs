//! A small CSS selector engine used to find candidate elements.
//!
//! The supported grammar is the subset that navigable regions actually use:
//!
//! | Form | Example |
//! |------|---------|
//! | type / universal | `button`, `*` |
//! | id / class | `#menu`, `.tour-card` |
//! | attribute | `[role]`, `[role=option]`, `[class~=a]`, `[href^="/"]`, `[src$=png]`, `[title*=tour]` |
//! | pseudo-class | `:first-child`, `:last-child`, `:focus`, `:not(.disabled)` |
//! | combinators | `ul li` (descendant), `ul > li` (child) |
//! | lists | `a, button` |
//!
//! Parsing errors carry the byte offset at which they were detected and are
//! never recovered from: a query with a bad selector fails as a whole.
//!
//! Matching walks ancestors right to left.  Each (compound, node) pair is
//! evaluated at most once per match, so long descendant chains such as
//! `div div div span` stay linear in the tree depth for each compound.

use crate::dom::{Document, NodeId};
use std::collections::HashMap;

/// Errors produced while parsing a selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// The selector contained nothing but whitespace.
    #[error("empty selector")]
    Empty,
    /// A character that cannot appear at this position.
    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },
    /// The input ended while more tokens were required.
    #[error("unexpected end of selector at offset {offset}")]
    UnexpectedEnd { offset: usize },
    /// A pseudo-class this engine does not know.
    #[error("unknown pseudo-class `:{name}` at offset {offset}")]
    UnknownPseudo { name: String, offset: usize },
    /// A `>` combinator with nothing on its right-hand side.
    #[error("combinator at offset {offset} has no right-hand side")]
    DanglingCombinator { offset: usize },
    /// A quoted string or attribute block that never closes.
    #[error("unterminated {what} starting at offset {offset}")]
    Unterminated { what: &'static str, offset: usize },
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    // combinators[i] joins compounds[i] and compounds[i + 1]
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Id(String),
    Class(String),
    Attribute { name: String, op: AttrOp },
    FirstChild,
    LastChild,
    Focus,
    Not(Box<Compound>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Includes(String),
    Prefix(String),
    Suffix(String),
    Substring(String),
}

impl Selector {
    /// Parse a selector list.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        Parser::new(input).parse_list()
    }

    /// Return whether `node` matches any selector in the list.
    pub fn matches(&self, document: &Document, node: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|complex| complex.matches(document, node))
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Complex {
    fn matches(&self, document: &Document, node: NodeId) -> bool {
        let mut seen = HashMap::new();
        self.matches_at(document, node, self.compounds.len() - 1, &mut seen)
    }

    fn matches_at(
        &self,
        document: &Document,
        node: NodeId,
        index: usize,
        seen: &mut HashMap<(usize, NodeId), bool>,
    ) -> bool {
        if let Some(known) = seen.get(&(index, node)) {
            return *known;
        }
        let matched = self.compounds[index].matches(document, node)
            && (index == 0 || self.ancestors_match(document, node, index, seen));
        seen.insert((index, node), matched);
        matched
    }

    fn ancestors_match(
        &self,
        document: &Document,
        node: NodeId,
        index: usize,
        seen: &mut HashMap<(usize, NodeId), bool>,
    ) -> bool {
        match self.combinators[index - 1] {
            Combinator::Child => document
                .parent(node)
                .is_some_and(|parent| self.matches_at(document, parent, index - 1, seen)),
            Combinator::Descendant => {
                let mut current = document.parent(node);
                while let Some(ancestor) = current {
                    if self.matches_at(document, ancestor, index - 1, seen) {
                        return true;
                    }
                    current = document.parent(ancestor);
                }
                false
            }
        }
    }
}

impl Compound {
    fn matches(&self, document: &Document, node: NodeId) -> bool {
        let Some(data) = document.node(node) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if data.tag() != tag.as_str() {
                return false;
            }
        }
        self.conditions.iter().all(|condition| match condition {
            Condition::Id(id) => data.id() == Some(id.as_str()),
            Condition::Class(class) => data.has_class(class),
            Condition::Attribute { name, op } => match data.attribute(name) {
                None => false,
                Some(value) => op.accepts(value),
            },
            Condition::FirstChild => document
                .parent(node)
                .and_then(|p| document.children(p).first().copied())
                == Some(node),
            Condition::LastChild => document
                .parent(node)
                .and_then(|p| document.children(p).last().copied())
                == Some(node),
            Condition::Focus => document.active_element() == Some(node),
            Condition::Not(inner) => !inner.matches(document, node),
        })
    }
}

impl AttrOp {
    fn accepts(&self, value: &str) -> bool {
        match self {
            AttrOp::Exists => true,
            AttrOp::Equals(expected) => value == expected.as_str(),
            AttrOp::Includes(expected) => value.split_whitespace().any(|word| word == expected.as_str()),
            AttrOp::Prefix(expected) => !expected.is_empty() && value.starts_with(expected.as_str()),
            AttrOp::Suffix(expected) => !expected.is_empty() && value.ends_with(expected.as_str()),
            AttrOp::Substring(expected) => !expected.is_empty() && value.contains(expected.as_str()),
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip whitespace, returning whether any was consumed.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos != start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(found) => SelectorError::UnexpectedChar {
                found,
                offset: self.pos,
            },
            None => SelectorError::UnexpectedEnd { offset: self.pos },
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), SelectorError> {
        if self.peek() == Some(expected) {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_list(mut self) -> Result<Selector, SelectorError> {
        self.skip_ws();
        if self.peek().is_none() {
            return Err(SelectorError::Empty);
        }
        let mut alternatives = Vec::new();
        loop {
            alternatives.push(self.parse_complex()?);
            self.skip_ws();
            match self.peek() {
                None => break,
                Some(',') => {
                    self.bump();
                    self.skip_ws();
                }
                Some(_) => return Err(self.unexpected()),
            }
        }
        Ok(Selector { alternatives })
    }

    fn parse_complex(&mut self) -> Result<Complex, SelectorError> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    let offset = self.pos;
                    self.bump();
                    self.skip_ws();
                    if matches!(self.peek(), None | Some(',') | Some('>')) {
                        return Err(SelectorError::DanglingCombinator { offset });
                    }
                    Combinator::Child
                }
                Some(_) if had_ws => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let start = self.pos;
        let mut compound = Compound::default();

        match self.peek() {
            Some('*') => {
                self.bump();
            }
            Some(c) if is_ident_start(c) => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.conditions.push(Condition::Id(self.ident()?));
                }
                Some('.') => {
                    self.bump();
                    compound.conditions.push(Condition::Class(self.ident()?));
                }
                Some('[') => {
                    let condition = self.attribute()?;
                    compound.conditions.push(condition);
                }
                Some(':') => {
                    let condition = self.pseudo()?;
                    compound.conditions.push(condition);
                }
                _ => break,
            }
        }

        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        match self.peek() {
            Some(c) if is_ident_start(c) => {}
            _ => return Err(self.unexpected()),
        }
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn attribute(&mut self) -> Result<Condition, SelectorError> {
        let open = self.pos;
        self.bump();
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();

        let op: fn(String) -> AttrOp = match self.peek() {
            Some(']') => {
                self.bump();
                return Ok(Condition::Attribute {
                    name,
                    op: AttrOp::Exists,
                });
            }
            Some('=') => {
                self.bump();
                AttrOp::Equals
            }
            Some(c @ ('~' | '^' | '$' | '*')) => {
                self.bump();
                self.expect('=')?;
                match c {
                    '~' => AttrOp::Includes,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    _ => AttrOp::Substring,
                }
            }
            None => {
                return Err(SelectorError::Unterminated {
                    what: "attribute selector",
                    offset: open,
                })
            }
            Some(_) => return Err(self.unexpected()),
        };

        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => self.quoted(quote)?,
            Some(c) if is_ident_char(c) => {
                let start = self.pos;
                while self.peek().is_some_and(is_ident_char) {
                    self.bump();
                }
                self.input[start..self.pos].to_string()
            }
            _ => return Err(self.unexpected()),
        };
        self.skip_ws();

        match self.peek() {
            Some(']') => {
                self.bump();
                Ok(Condition::Attribute {
                    name,
                    op: op(value),
                })
            }
            None => Err(SelectorError::Unterminated {
                what: "attribute selector",
                offset: open,
            }),
            Some(_) => Err(self.unexpected()),
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        let open = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(SelectorError::Unterminated {
                        what: "string",
                        offset: open,
                    })
                }
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => {
                        return Err(SelectorError::Unterminated {
                            what: "string",
                            offset: open,
                        })
                    }
                },
                Some(c) if c == quote => return Ok(value),
                Some(c) => value.push(c),
            }
        }
    }

    fn pseudo(&mut self) -> Result<Condition, SelectorError> {
        let offset = self.pos;
        self.bump();
        let name = self.ident()?.to_ascii_lowercase();
        match name.as_str() {
            "first-child" => Ok(Condition::FirstChild),
            "last-child" => Ok(Condition::LastChild),
            "focus" => Ok(Condition::Focus),
            "not" => {
                self.expect('(')?;
                self.skip_ws();
                let inner = self.parse_compound()?;
                self.skip_ws();
                self.expect(')')?;
                Ok(Condition::Not(Box::new(inner)))
            }
            _ => Err(SelectorError::UnknownPseudo { name, offset }),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    fn menu() -> (Document, NodeId, Vec<NodeId>) {
        let mut doc = Document::new();
        let nav = doc
            .append(doc.root(), Element::new("nav").id("menu").class("tours"))
            .unwrap();
        let ul = doc.append(nav, Element::new("ul")).unwrap();
        let items = vec![
            doc.append(ul, Element::new("li").class("item").attr("role", "option").text("Paris"))
                .unwrap(),
            doc.append(
                ul,
                Element::new("li")
                    .class("item")
                    .class("disabled")
                    .attr("role", "option")
                    .text("Rome"),
            )
            .unwrap(),
            doc.append(ul, Element::new("li").class("item").attr("data-city", "lisbon-old").text("Lisbon"))
                .unwrap(),
        ];
        (doc, nav, items)
    }

    #[test]
    fn parses_simple_forms() {
        for input in [
            "button",
            "*",
            "#menu",
            ".item",
            "li.item.disabled",
            "[role]",
            "[role=option]",
            "[role = \"option\"]",
            "[data-city^=lis]",
            "ul > li:not(.disabled)",
            "nav li, button",
            ":focus",
        ] {
            assert!(Selector::parse(input).is_ok(), "failed to parse {input:?}");
        }
    }

    #[test]
    fn empty_selector_is_an_error() {
        assert_eq!(Selector::parse(""), Err(SelectorError::Empty));
        assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
    }

    #[test]
    fn reports_offsets() {
        assert_eq!(
            Selector::parse("li!"),
            Err(SelectorError::UnexpectedChar {
                found: '!',
                offset: 2
            })
        );
        assert_eq!(
            Selector::parse("ul >"),
            Err(SelectorError::DanglingCombinator { offset: 3 })
        );
        assert_eq!(
            Selector::parse("li:hover"),
            Err(SelectorError::UnknownPseudo {
                name: "hover".into(),
                offset: 2
            })
        );
        assert_eq!(
            Selector::parse("[role"),
            Err(SelectorError::Unterminated {
                what: "attribute selector",
                offset: 0
            })
        );
        assert_eq!(
            Selector::parse("[title='open"),
            Err(SelectorError::Unterminated {
                what: "string",
                offset: 7
            })
        );
        assert_eq!(
            Selector::parse("li,"),
            Err(SelectorError::UnexpectedEnd { offset: 3 })
        );
    }

    #[test]
    fn leading_combinator_is_rejected() {
        assert!(matches!(
            Selector::parse("> li"),
            Err(SelectorError::UnexpectedChar { found: '>', .. })
        ));
    }

    #[test]
    fn matches_type_class_and_attributes() {
        let (doc, _, items) = menu();
        let by_class = Selector::parse(".item").unwrap();
        assert!(items.iter().all(|n| by_class.matches(&doc, *n)));

        let options = Selector::parse("li[role=option]:not(.disabled)").unwrap();
        assert!(options.matches(&doc, items[0]));
        assert!(!options.matches(&doc, items[1]));
        assert!(!options.matches(&doc, items[2]));

        let prefix = Selector::parse("[data-city^=lis]").unwrap();
        assert!(prefix.matches(&doc, items[2]));
        let suffix = Selector::parse("[data-city$=old]").unwrap();
        assert!(suffix.matches(&doc, items[2]));
        let contains = Selector::parse("[data-city*=bon]").unwrap();
        assert!(contains.matches(&doc, items[2]));
        let includes = Selector::parse("[class~=disabled]").unwrap();
        assert!(includes.matches(&doc, items[1]));
    }

    #[test]
    fn tag_names_are_case_insensitive() {
        let (doc, _, items) = menu();
        assert!(Selector::parse("LI").unwrap().matches(&doc, items[0]));
    }

    #[test]
    fn combinators_walk_ancestors() {
        let (doc, _, items) = menu();
        assert!(Selector::parse("#menu li").unwrap().matches(&doc, items[0]));
        assert!(Selector::parse("ul > li").unwrap().matches(&doc, items[0]));
        assert!(!Selector::parse("nav > li").unwrap().matches(&doc, items[0]));
        assert!(Selector::parse("body nav ul > li").unwrap().matches(&doc, items[1]));
    }

    #[test]
    fn structural_pseudo_classes() {
        let (doc, _, items) = menu();
        let first = Selector::parse("li:first-child").unwrap();
        let last = Selector::parse("li:last-child").unwrap();
        assert!(first.matches(&doc, items[0]));
        assert!(!first.matches(&doc, items[1]));
        assert!(last.matches(&doc, items[2]));
    }

    #[test]
    fn focus_pseudo_class_reads_active_element() {
        let (mut doc, _, items) = menu();
        let focused = Selector::parse("li:focus").unwrap();
        assert!(!focused.matches(&doc, items[1]));
        doc.focus(items[1]);
        assert!(focused.matches(&doc, items[1]));
    }

    #[test]
    fn long_descendant_chains_on_deep_trees() {
        let mut doc = Document::new();
        let mut parent = doc.root();
        for _ in 0..60 {
            parent = doc.append(parent, Element::new("div")).unwrap();
        }
        let leaf = doc.append(parent, Element::new("span")).unwrap();

        // No `.missing` ancestor exists, so every way of placing the twelve
        // `div`s along the chain has to be ruled out.
        let chain = format!(".missing {}span", "div ".repeat(12));
        let never = Selector::parse(&chain).unwrap();
        assert!(!never.matches(&doc, leaf));

        let chain = format!("body {}span", "div ".repeat(12));
        let deep = Selector::parse(&chain).unwrap();
        assert!(deep.matches(&doc, leaf));
    }

    fn offset(err: &SelectorError) -> Option<usize> {
        match err {
            SelectorError::Empty => None,
            SelectorError::UnexpectedChar { offset, .. }
            | SelectorError::UnexpectedEnd { offset }
            | SelectorError::UnknownPseudo { offset, .. }
            | SelectorError::DanglingCombinator { offset }
            | SelectorError::Unterminated { offset, .. } => Some(*offset),
        }
    }

    proptest::proptest! {
        #[test]
        fn errors_point_inside_the_input(input in "[a-z#.\\[\\]=~^$*:() >,'\"-]{0,24}") {
            if let Err(err) = Selector::parse(&input) {
                if let Some(at) = offset(&err) {
                    proptest::prop_assert!(at <= input.len(), "{err} for {input:?}");
                    proptest::prop_assert!(input.is_char_boundary(at));
                }
            }
        }
    }
}
