//! Resolution of binding expressions against the JSON view of a resume.
//!
//! A missing path is an expected outcome (new resumes are mostly empty) and resolves to
//! `None` / empty text, never to an error.

use serde_json::Value;

use crate::binding::{BindingError, ItemTemplate, Placeholder, Segment};
use crate::dom::escape_html;
use crate::models::resume::{value_to_text, ListKind};

/// Walks `path` (dot-separated; numeric segments index into lists). Returns `None` as soon
/// as an intermediate value is missing or `null`.
pub fn resolve_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, segment| {
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }?;
        (!next.is_null()).then_some(next)
    })
}

/// Text for a scalar binding. Records and lists render as empty text.
pub fn resolve_scalar(doc: &Value, path: &str) -> String {
    resolve_path(doc, path).map(value_to_text).unwrap_or_default()
}

/// Expands `list_name` through `template`, one markup fragment per item in display order.
///
/// The list is looked up under its canonical key and every alias; the first non-empty one
/// wins. An empty list yields exactly one "no data" placeholder fragment. Substituted values
/// are HTML-escaped.
pub fn resolve_array_map(
    doc: &Value,
    list_name: &str,
    template: &ItemTemplate,
) -> Result<Vec<String>, BindingError> {
    let kind =
        ListKind::from_name(list_name).ok_or_else(|| BindingError::UnknownList(list_name.into()))?;

    let items = std::iter::once(kind.canonical())
        .chain(kind.aliases().iter().copied())
        .filter_map(|key| doc.get(key).and_then(Value::as_array))
        .find(|items| !items.is_empty());

    match items {
        Some(items) => Ok(items.iter().map(|item| template.render(item)).collect()),
        None => Ok(vec![empty_placeholder(kind)]),
    }
}

/// Markup shown in place of an empty list.
pub fn empty_placeholder(kind: ListKind) -> String {
    format!(
        r#"<div class="empty-placeholder" data-empty="{}">{}</div>"#,
        kind.canonical(),
        escape_html(kind.empty_notice())
    )
}

impl ItemTemplate {
    /// Substitutes every placeholder with the item's value.
    pub fn render(&self, item: &Value) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(p) => out.push_str(&escape_html(&p.evaluate(item))),
            }
        }
        out
    }
}

impl Placeholder {
    /// A placeholder mentioning `time` shows the item's date range when both ends are set;
    /// otherwise the named field is used, defaulting to empty text.
    fn evaluate(&self, item: &Value) -> String {
        if self.source.contains("time") {
            if let Some(range) = date_range(item) {
                return range;
            }
        }
        match &self.field {
            Some(field) => item.get(field).map(value_to_text).unwrap_or_default(),
            None => value_to_text(item),
        }
    }
}

/// `"<startDate> - <endDate>"` when both dates are non-empty.
pub fn date_range(item: &Value) -> Option<String> {
    let start = item.get("startDate").map(value_to_text).unwrap_or_default();
    let end = item.get("endDate").map(value_to_text).unwrap_or_default();
    (!start.trim().is_empty() && !end.trim().is_empty()).then(|| format!("{start} - {end}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingExpression;
    use serde_json::json;

    fn template(expr: &str) -> ItemTemplate {
        match BindingExpression::parse(expr).unwrap() {
            BindingExpression::ArrayMap { template, .. } => template,
            other => panic!("expected array map, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_path_walks_nested_records() {
        let doc = json!({ "basic": { "name": "张三" } });
        assert_eq!(resolve_path(&doc, "basic.name"), Some(&json!("张三")));
    }

    #[test]
    fn test_resolve_path_missing_is_none() {
        let doc = json!({ "basic": null });
        assert_eq!(resolve_path(&doc, "basic.name"), None);
        assert_eq!(resolve_path(&doc, "invalid.expression"), None);
        assert_eq!(resolve_path(&json!({}), "a.b.c"), None);
    }

    #[test]
    fn test_resolve_path_indexes_lists() {
        let doc = json!({ "education": [{ "school": "A" }, { "school": "B" }] });
        assert_eq!(resolve_scalar(&doc, "education.1.school"), "B");
        assert_eq!(resolve_scalar(&doc, "education.9.school"), "");
    }

    #[test]
    fn test_resolve_scalar_of_record_is_empty() {
        let doc = json!({ "basic": { "name": "A" }, "age": 25 });
        assert_eq!(resolve_scalar(&doc, "basic"), "");
        assert_eq!(resolve_scalar(&doc, "age"), "25");
    }

    #[test]
    fn test_array_map_substitutes_fields() {
        let doc = json!({ "education": [
            { "school": "清华大学", "major": "计算机科学", "degree": "本科" }
        ]});
        let t = template("education.map(item => `<p>${item.major} - ${item.degree}</p>`)");
        assert_eq!(
            resolve_array_map(&doc, "education", &t).unwrap(),
            vec!["<p>计算机科学 - 本科</p>"]
        );
    }

    #[test]
    fn test_array_map_joins_time_range() {
        let doc = json!({ "education": [{ "startDate": "2018.9", "endDate": "2022.6" }] });
        let t = template("education.map(item => `<span>${item.time}</span>`)");
        assert_eq!(
            resolve_array_map(&doc, "education", &t).unwrap(),
            vec!["<span>2018.9 - 2022.6</span>"]
        );
    }

    #[test]
    fn test_array_map_time_without_both_dates_uses_field() {
        let doc = json!({ "work": [{ "startDate": "2022", "endDate": "", "time": "2022-至今" }] });
        let t = template("work.map(item => `<span>${item.time}</span>`)");
        assert_eq!(
            resolve_array_map(&doc, "work", &t).unwrap(),
            vec!["<span>2022-至今</span>"]
        );
    }

    #[test]
    fn test_array_map_missing_field_renders_empty() {
        let doc = json!({ "skills": [{ "name": "Rust" }] });
        let t = template("skills.map(item => `<i>${item.level}</i>`)");
        assert_eq!(resolve_array_map(&doc, "skills", &t).unwrap(), vec!["<i></i>"]);
    }

    #[test]
    fn test_array_map_escapes_values() {
        let doc = json!({ "awards": [{ "name": "<script>x</script>" }] });
        let t = template("awards.map(a => `<li>${a.name}</li>`)");
        assert_eq!(
            resolve_array_map(&doc, "awards", &t).unwrap(),
            vec!["<li>&lt;script&gt;x&lt;/script&gt;</li>"]
        );
    }

    #[test]
    fn test_array_map_empty_list_yields_placeholder() {
        let t = template("education.map(item => `<p>${item.school}</p>`)");
        let out = resolve_array_map(&json!({ "education": [] }), "education", &t).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].contains("No education entries yet"));
        let out = resolve_array_map(&json!({}), "education", &t).unwrap();
        assert_eq!(out, vec![empty_placeholder(ListKind::Education)]);
    }

    #[test]
    fn test_array_map_reads_whichever_alias_is_populated() {
        let t = template("education.map(item => `<p>${item.school}</p>`)");
        let doc = json!({ "education": [], "educationList": [{ "school": "北京大学" }] });
        assert_eq!(
            resolve_array_map(&doc, "education", &t).unwrap(),
            vec!["<p>北京大学</p>"]
        );
        let doc = json!({ "education": [{ "school": "清华大学" }] });
        assert_eq!(
            resolve_array_map(&doc, "educationList", &t).unwrap(),
            vec!["<p>清华大学</p>"]
        );
    }

    #[test]
    fn test_array_map_unknown_list_is_error() {
        let t = template("invalid.map(item => `<div>${item}</div>`)");
        assert_eq!(
            resolve_array_map(&json!({}), "invalid", &t),
            Err(BindingError::UnknownList("invalid".to_string()))
        );
    }

    #[test]
    fn test_array_map_whole_item_placeholder() {
        let doc = json!({ "skills": ["Rust", "Go"] });
        let t = template("skills.map(s => `<li>${s}</li>`)");
        assert_eq!(
            resolve_array_map(&doc, "skills", &t).unwrap(),
            vec!["<li>Rust</li>", "<li>Go</li>"]
        );
    }
}
