//! Minimal CSS selector matching: compound selectors (`tag`, `#id`, `.class`, `[attr]`,
//! `[attr="value"]`) joined by the descendant combinator. Enough for tests and for locating
//! template-owned nodes; not a general selector engine.

use std::iter::Peekable;
use std::str::Chars;

use super::{Dom, NodeId};

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    /// Outermost compound first.
    parts: Vec<Compound>,
}

impl Selector {
    pub fn parse(input: &str) -> Option<Selector> {
        let parts = split_compounds(input)?
            .into_iter()
            .map(|c| parse_compound(&c))
            .collect::<Option<Vec<_>>>()?;
        if parts.is_empty() {
            return None;
        }
        Some(Selector { parts })
    }

    /// Matches `node` against the selector; ancestors are only searched up to `scope`
    /// (exclusive).
    pub fn matches(&self, dom: &Dom, node: NodeId, scope: NodeId) -> bool {
        let Some((last, rest)) = self.parts.split_last() else {
            return false;
        };
        if !last.matches(dom, node) {
            return false;
        }
        let mut current = dom.parent(node);
        for compound in rest.iter().rev() {
            loop {
                match current {
                    Some(n) if n != scope => {
                        current = dom.parent(n);
                        if compound.matches(dom, n) {
                            break;
                        }
                    }
                    _ => return false,
                }
            }
        }
        true
    }
}

impl Compound {
    fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        let Some(tag) = dom.tag(node) else {
            return false;
        };
        if self.tag.as_deref().is_some_and(|t| t != tag) {
            return false;
        }
        if self.id.as_deref().is_some_and(|id| dom.attr(node, "id") != Some(id)) {
            return false;
        }
        if !self.classes.iter().all(|c| dom.has_class(node, c)) {
            return false;
        }
        self.attrs.iter().all(|(name, value)| match value {
            Some(v) => dom.attr(node, name) == Some(v.as_str()),
            None => dom.attr(node, name).is_some(),
        })
    }
}

/// Splits on whitespace outside of `[...]`.
fn split_compounds(input: &str) -> Option<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;
    let mut quote: Option<char> = None;
    for c in input.trim().chars() {
        match c {
            '"' | '\'' if in_brackets => {
                match quote {
                    Some(q) if q == c => quote = None,
                    None => quote = Some(c),
                    _ => {}
                }
                current.push(c);
            }
            '[' if quote.is_none() => {
                in_brackets = true;
                current.push(c);
            }
            ']' if quote.is_none() => {
                in_brackets = false;
                current.push(c);
            }
            c if c.is_whitespace() && !in_brackets => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if in_brackets || quote.is_some() {
        return None;
    }
    if !current.is_empty() {
        parts.push(current);
    }
    Some(parts)
}

fn ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut s = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            s.push(c);
            chars.next();
        } else {
            break;
        }
    }
    s
}

fn parse_compound(input: &str) -> Option<Compound> {
    let mut compound = Compound::default();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            '#' => {
                chars.next();
                compound.id = Some(ident(&mut chars)).filter(|s| !s.is_empty());
                compound.id.as_ref()?;
            }
            '.' => {
                chars.next();
                let class = ident(&mut chars);
                if class.is_empty() {
                    return None;
                }
                compound.classes.push(class);
            }
            '[' => {
                chars.next();
                let body: String = chars.by_ref().take_while(|c| *c != ']').collect();
                let (name, value) = match body.split_once('=') {
                    Some((n, v)) => (
                        n.trim().to_string(),
                        Some(v.trim().trim_matches(['"', '\'']).to_string()),
                    ),
                    None => (body.trim().to_string(), None),
                };
                if name.is_empty() {
                    return None;
                }
                compound.attrs.push((name, value));
            }
            '*' => {
                chars.next();
            }
            c if c.is_alphanumeric() => {
                compound.tag = Some(ident(&mut chars).to_ascii_lowercase());
            }
            _ => return None,
        }
    }
    Some(compound)
}
