//! Soft field checks. A failed check is reported, never enforced.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::models::resume::ResumeDocument;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationWarning {
    /// Dotted path of the offending field, e.g. `basic.phone`.
    pub field: String,
    pub value: String,
    pub reason: &'static str,
}

static PHONE: OnceLock<Option<Regex>> = OnceLock::new();
static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
static AGE: OnceLock<Option<Regex>> = OnceLock::new();

fn pattern(cell: &'static OnceLock<Option<Regex>>, source: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(source).ok()).as_ref()
}

/// Mainland mobile numbers, optionally with a `+86` prefix and separators.
fn phone_ok(value: &str) -> bool {
    let digits: String = value
        .trim()
        .trim_start_matches("+86")
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    pattern(&PHONE, r"^1[3-9]\d{9}$").map_or(true, |re| re.is_match(&digits))
}

fn email_ok(value: &str) -> bool {
    pattern(&EMAIL, r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .map_or(true, |re| re.is_match(value.trim()))
}

fn age_ok(value: &str) -> bool {
    pattern(&AGE, r"^\d{1,3}\s*岁?$").map_or(true, |re| re.is_match(value.trim()))
}

/// Checks the pattern-constrained fields. Empty values are not checked.
pub fn check_fields(doc: &ResumeDocument) -> Vec<ValidationWarning> {
    let checks: [(&str, &str, fn(&str) -> bool, &'static str); 3] = [
        ("basic.phone", &doc.basic.phone, phone_ok, "phone number does not look valid"),
        ("basic.email", &doc.basic.email, email_ok, "email address does not look valid"),
        ("basic.age", &doc.basic.age, age_ok, "age does not look valid"),
    ];
    checks
        .into_iter()
        .filter(|&(_, value, ok, _)| !value.trim().is_empty() && !ok(value))
        .map(|(field, value, _, reason)| ValidationWarning {
            field: field.to_string(),
            value: value.to_string(),
            reason,
        })
        .collect()
}
