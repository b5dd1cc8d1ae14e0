//! Binding expressions: the `data-bind` mini-language.
//!
//! Two forms are accepted:
//! - a scalar path, `basic.name` or `education.0.school`;
//! - an array map, ``education.map(item => `<div>${item.school}</div>`)``.
//!
//! Placeholders inside an item template are restricted to `${item}`, `${item.<field>}` or
//! `${<field>}`. Nothing is ever evaluated as code; anything outside that grammar is a
//! [`BindingError::Malformed`].

pub mod resolve;

use thiserror::Error;

use crate::dom::decode_entities;

pub use resolve::{resolve_array_map, resolve_path, resolve_scalar};

/// Attribute that carries a binding expression.
pub const BIND_ATTR: &str = "data-bind";

#[derive(Debug, Error, PartialEq)]
pub enum BindingError {
    #[error("malformed binding expression '{expression}': {reason}")]
    Malformed { expression: String, reason: String },

    #[error("unknown list '{0}' in array-map expression")]
    UnknownList(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BindingExpression {
    /// Dotted path into the document.
    Path(Vec<String>),
    /// Expands a list through an item template.
    ArrayMap { list: String, template: ItemTemplate },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemTemplate {
    pub(crate) segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Placeholder {
    /// The placeholder body as written, e.g. `item.time`.
    pub(crate) source: String,
    /// `None` refers to the item itself.
    pub(crate) field: Option<String>,
}

impl BindingExpression {
    /// Parses a raw attribute value. Character references such as `=&gt;` are decoded first,
    /// so expressions survive markup that was escaped twice.
    pub fn parse(raw: &str) -> Result<BindingExpression, BindingError> {
        let decoded = decode_entities(raw);
        let input = decoded.trim();
        let malformed = |reason: &str| BindingError::Malformed {
            expression: input.to_string(),
            reason: reason.to_string(),
        };

        if input.is_empty() {
            return Err(malformed("empty expression"));
        }

        let Some(map_at) = input.find(".map(") else {
            let segments: Vec<String> = input.split('.').map(str::to_string).collect();
            if segments.iter().any(|s| !is_path_segment(s)) {
                return Err(malformed("path segments must be identifiers or indices"));
            }
            return Ok(BindingExpression::Path(segments));
        };

        let list = input[..map_at].trim();
        if !is_identifier(list) {
            return Err(malformed("list name must be an identifier"));
        }

        let rest = input[map_at + ".map(".len()..].trim_start();
        let (param, rest) = take_param(rest).ok_or_else(|| malformed("missing item parameter"))?;
        let rest = rest
            .trim_start()
            .strip_prefix("=>")
            .ok_or_else(|| malformed("expected '=>'"))?
            .trim_start();
        let body = rest
            .strip_prefix('`')
            .ok_or_else(|| malformed("item template must be a backtick literal"))?;
        let close = body
            .rfind('`')
            .ok_or_else(|| malformed("unterminated item template"))?;
        let (body, tail) = (&body[..close], &body[close + 1..]);

        let tail = tail.trim();
        let tail = tail
            .strip_prefix(')')
            .ok_or_else(|| malformed("expected ')' after item template"))?
            .trim();
        if !tail.is_empty() && !matches!(tail, ".join('')" | ".join(\"\")" | ".join(``)") {
            return Err(malformed("unexpected trailing input"));
        }

        let template = ItemTemplate::parse(body, param).map_err(|reason| malformed(&reason))?;
        Ok(BindingExpression::ArrayMap {
            list: list.to_string(),
            template,
        })
    }

    pub fn is_array_map(&self) -> bool {
        matches!(self, BindingExpression::ArrayMap { .. })
    }
}

impl ItemTemplate {
    /// Parses a template body; `param` is the arrow-function parameter name.
    pub fn parse(body: &str, param: &str) -> Result<ItemTemplate, String> {
        let mut segments = Vec::new();
        let mut rest = body;
        while let Some(open) = rest.find("${") {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 2..];
            let close = after
                .find('}')
                .ok_or_else(|| "unterminated '${' placeholder".to_string())?;
            let source = after[..close].trim();
            let field = if source == param {
                None
            } else if let Some(field) = source.strip_prefix(param).and_then(|s| s.strip_prefix('.'))
            {
                if !is_identifier(field) {
                    return Err(format!("unsupported placeholder '{source}'"));
                }
                Some(field.to_string())
            } else if is_identifier(source) {
                Some(source.to_string())
            } else {
                return Err(format!("unsupported placeholder '{source}'"));
            };
            segments.push(Segment::Placeholder(Placeholder {
                source: source.to_string(),
                field,
            }));
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        Ok(ItemTemplate { segments })
    }
}

fn take_param(input: &str) -> Option<(&str, &str)> {
    let (inner, rest) = match input.strip_prefix('(') {
        Some(after) => {
            let close = after.find(')')?;
            (after[..close].trim(), &after[close + 1..])
        }
        None => {
            let end = input
                .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
                .unwrap_or(input.len());
            (&input[..end], &input[end..])
        }
    };
    is_identifier(inner).then_some((inner, rest))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn is_path_segment(s: &str) -> bool {
    is_identifier(s) || (!s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalar_path() {
        assert_eq!(
            BindingExpression::parse(" basic.name ").unwrap(),
            BindingExpression::Path(vec!["basic".to_string(), "name".to_string()])
        );
    }

    #[test]
    fn test_parse_indexed_path() {
        let expr = BindingExpression::parse("education.0.school").unwrap();
        assert_eq!(
            expr,
            BindingExpression::Path(vec!["education".into(), "0".into(), "school".into()])
        );
    }

    #[test]
    fn test_parse_array_map() {
        let expr =
            BindingExpression::parse("education.map(item => `<h3>${item.school}</h3>`)").unwrap();
        let BindingExpression::ArrayMap { list, template } = expr else {
            panic!("expected array map");
        };
        assert_eq!(list, "education");
        assert_eq!(template.segments.len(), 3);
        assert_eq!(
            template.segments[1],
            Segment::Placeholder(Placeholder {
                source: "item.school".to_string(),
                field: Some("school".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_array_map_with_encoded_arrow_and_parens() {
        let expr = BindingExpression::parse("work.map((w) =&gt; `<p>${w.company}</p>`).join('')");
        assert!(expr.unwrap().is_array_map());
    }

    #[test]
    fn test_parse_bare_field_and_whole_item_placeholders() {
        let expr = BindingExpression::parse("skills.map(s => `<li>${name}${s}</li>`)").unwrap();
        let BindingExpression::ArrayMap { template, .. } = expr else {
            panic!("expected array map");
        };
        assert!(template.segments.contains(&Segment::Placeholder(Placeholder {
            source: "s".to_string(),
            field: None,
        })));
    }

    #[test]
    fn test_parse_rejects_code_in_placeholders() {
        let err = BindingExpression::parse("education.map(item => `${item.school.toUpperCase()}`)")
            .unwrap_err();
        assert!(matches!(err, BindingError::Malformed { .. }));
        let err = BindingExpression::parse("education.map(item => `${alert(1)}`)").unwrap_err();
        assert!(matches!(err, BindingError::Malformed { .. }));
    }

    #[test]
    fn test_parse_rejects_broken_map_syntax() {
        for raw in [
            "education.map(item => <div></div>)",
            "education.map(item `x`)",
            "education.map(item => `x`",
            "education.map(item => `${item.school`)",
            "edu cation.map(item => `x`)",
            "",
            "basic..name",
            "basic.name()",
        ] {
            assert!(BindingExpression::parse(raw).is_err(), "should reject {raw:?}");
        }
    }
}
