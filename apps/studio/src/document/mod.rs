//! Normalization of untrusted resume input into a canonical [`ResumeDocument`].
//!
//! `validate` never rejects a document. Legacy shapes are folded onto the canonical one,
//! unknown keys are dropped by the closed schema, and soft field checks only produce
//! warnings.

pub mod checks;
pub mod merge;

use serde_json::{Map, Value};
use tracing::warn;

use crate::models::resume::{ListKind, ResumeDocument};

pub use checks::ValidationWarning;
pub use merge::merge_optimized;

/// Separators tried, in order, when splitting a legacy combined date range.
const RANGE_SEPARATORS: &[&str] = &["~", " - ", "-", "至"];

/// Normalizes `raw` into a fully-shaped document plus any soft validation warnings.
pub fn validate(raw: Value) -> (ResumeDocument, Vec<ValidationWarning>) {
    let Value::Object(mut root) = raw else {
        if !raw.is_null() {
            warn!("resume input is not an object; using an empty document");
        }
        return (ResumeDocument::default(), Vec::new());
    };

    fold_avatar(&mut root);
    for kind in ListKind::ALL {
        fold_list_aliases(&mut root, kind);
        split_legacy_ranges(&mut root, kind);
    }

    let doc: ResumeDocument = match serde_json::from_value(Value::Object(root)) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "resume input could not be read; using an empty document");
            ResumeDocument::default()
        }
    };

    let warnings = checks::check_fields(&doc);
    for w in &warnings {
        warn!(field = %w.field, value = %w.value, "{}", w.reason);
    }
    (doc, warnings)
}

/// Some payloads carry the avatar at the top level instead of under `basic`.
fn fold_avatar(root: &mut Map<String, Value>) {
    let Some(avatar) = root.remove("avatar") else {
        return;
    };
    if !avatar.is_string() {
        return;
    }
    let basic = root
        .entry("basic")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(basic) = basic {
        let current = basic.get("avatar").and_then(Value::as_str).unwrap_or("");
        if current.trim().is_empty() {
            basic.insert("avatar".to_string(), avatar);
        }
    }
}

/// Moves the first populated alias list onto the canonical key when the canonical list is
/// missing or empty.
fn fold_list_aliases(root: &mut Map<String, Value>, kind: ListKind) {
    let mut populated = !is_empty_list(root.get(kind.canonical()));
    for alias in kind.aliases() {
        let Some(list) = root.remove(*alias) else {
            continue;
        };
        if !populated && !is_empty_list(Some(&list)) {
            root.insert(kind.canonical().to_string(), list);
            populated = true;
        }
    }
}

fn is_empty_list(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Array(items)) => items.is_empty(),
        _ => true,
    }
}

/// Splits a combined `time` string into `startDate` / `endDate` when the item has neither.
fn split_legacy_ranges(root: &mut Map<String, Value>, kind: ListKind) {
    let keys = kind.legacy_time_keys();
    if keys.is_empty() {
        return;
    }
    let Some(Value::Array(items)) = root.get_mut(kind.canonical()) else {
        return;
    };
    for item in items.iter_mut() {
        let Value::Object(item) = item else {
            continue;
        };
        let has_dates = ["startDate", "endDate"].iter().any(|k| {
            item.get(*k)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.trim().is_empty())
        });
        if has_dates {
            continue;
        }
        let legacy = keys
            .iter()
            .filter_map(|k| item.get(*k).and_then(Value::as_str))
            .find(|s| !s.trim().is_empty())
            .map(str::to_string);
        let Some(legacy) = legacy else {
            continue;
        };
        let (start, end) = split_range(&legacy);
        item.insert("startDate".to_string(), Value::String(start));
        item.insert("endDate".to_string(), Value::String(end));
    }
}

/// Splits `"2018.9 - 2022.6"` style ranges. A string without a usable separator becomes the
/// start date alone.
pub fn split_range(raw: &str) -> (String, String) {
    for sep in RANGE_SEPARATORS {
        if let Some((start, end)) = raw.split_once(sep) {
            let (start, end) = (start.trim(), end.trim());
            if !start.is_empty() && !end.is_empty() {
                return (start.to_string(), end.to_string());
            }
        }
    }
    (raw.trim().to_string(), String::new())
}
