//! Stylesheet scoping: rewrites every rule so it only applies below the template's root
//! class. Document-level selectors (`:root`, `html`, `body`) are mapped onto the root
//! class itself.

/// At-rules whose block holds nested rules that must be scoped too.
const GROUPING_AT_RULES: &[&str] = &["@media", "@supports", "@container", "@layer"];

const DOCUMENT_SELECTORS: &[&str] = &[":root", "html", "body"];

pub fn scope_css(css: &str, class: &str) -> String {
    let scope = format!(".{class}");
    let mut out = String::with_capacity(css.len() + css.len() / 4);
    scope_rules(css, &scope, &mut out);
    out
}

fn scope_rules(css: &str, scope: &str, out: &mut String) {
    let mut rest = css;
    loop {
        rest = skip_trivia(rest);
        if rest.is_empty() {
            return;
        }

        if rest.starts_with('@') {
            let Some(split) = find_outside_strings(rest, |c| c == '{' || c == ';') else {
                out.push_str(rest);
                return;
            };
            if rest.as_bytes()[split] == b';' {
                out.push_str(rest[..=split].trim());
                out.push('\n');
                rest = &rest[split + 1..];
                continue;
            }
            let prelude = rest[..split].trim();
            let Some(close) = matching_brace(rest, split) else {
                out.push_str(rest);
                return;
            };
            let body = &rest[split + 1..close];
            let name = prelude.split_whitespace().next().unwrap_or("");
            if GROUPING_AT_RULES.contains(&name) {
                out.push_str(prelude);
                out.push_str(" {\n");
                scope_rules(body, scope, out);
                out.push_str("}\n");
            } else {
                // keyframes, font-face, page: selectors inside are not element selectors
                out.push_str(&rest[..=close]);
                out.push('\n');
            }
            rest = &rest[close + 1..];
            continue;
        }

        let Some(open) = find_outside_strings(rest, |c| c == '{') else {
            return;
        };
        let Some(close) = matching_brace(rest, open) else {
            return;
        };
        let selectors = rest[..open]
            .split(',')
            .map(|s| scope_selector(s.trim(), scope))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&selectors);
        out.push_str(" {");
        out.push_str(&rest[open + 1..close]);
        out.push_str("}\n");
        rest = &rest[close + 1..];
    }
}

fn scope_selector(selector: &str, scope: &str) -> String {
    if selector.is_empty() {
        return String::new();
    }
    if selector == scope
        || selector
            .strip_prefix(scope)
            .is_some_and(|tail| !tail.starts_with(is_ident_char))
    {
        return selector.to_string();
    }
    for doc in DOCUMENT_SELECTORS {
        if let Some(tail) = selector.strip_prefix(doc) {
            if !tail.starts_with(is_ident_char) {
                return format!("{scope}{tail}");
            }
        }
    }
    format!("{scope} {selector}")
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn skip_trivia(mut s: &str) -> &str {
    loop {
        s = s.trim_start();
        if let Some(after) = s.strip_prefix("/*") {
            s = match after.find("*/") {
                Some(end) => &after[end + 2..],
                None => "",
            };
        } else {
            return s;
        }
    }
}

/// Byte offset of the first char matching `pred` that is outside a quoted string.
fn find_outside_strings(s: &str, pred: impl Fn(char) -> bool) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if pred(c) => return Some(i),
            None => {}
        }
    }
    None
}

/// Offset of the `}` closing the `{` at `open`.
fn matching_brace(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in s[open..].char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(open + i);
                    }
                }
                _ => {}
            },
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_prefixes_plain_rules() {
        let out = scope_css(".resume-name { color: red; }\nh2, .section-title{margin:0}", "modern");
        assert!(out.contains(".modern .resume-name { color: red; }"));
        assert!(out.contains(".modern h2, .modern .section-title {margin:0}"));
    }

    #[test]
    fn test_scope_maps_document_selectors() {
        let out = scope_css(":root { --gap: 4px; } body .x { } html{} body.dark p {}", "classic");
        assert!(out.contains(".classic { --gap: 4px; }"));
        assert!(out.contains(".classic .x {"));
        assert!(out.contains(".classic {}"));
        assert!(out.contains(".classic.dark p {"));
    }

    #[test]
    fn test_scope_leaves_already_scoped_and_bodyish_names() {
        let out = scope_css(".classic .a {} .classical {} bodyguard {}", "classic");
        assert!(out.contains(".classic .a {}"));
        assert!(out.contains(".classic .classical {}"));
        assert!(out.contains(".classic bodyguard {}"));
    }

    #[test]
    fn test_scope_recurses_into_media() {
        let out = scope_css("@media print { .page { margin: 0 } }", "standard");
        assert!(out.starts_with("@media print {"));
        assert!(out.contains(".standard .page { margin: 0 }"));
    }

    #[test]
    fn test_scope_keeps_keyframes_and_statements() {
        let css = "@import url('a.css');\n@keyframes fade { from { opacity: 0 } to { opacity: 1 } }";
        let out = scope_css(css, "creative");
        assert!(out.contains("@import url('a.css');"));
        assert!(out.contains("@keyframes fade { from { opacity: 0 } to { opacity: 1 } }"));
        assert!(!out.contains(".creative from"));
    }

    #[test]
    fn test_scope_ignores_braces_in_strings_and_comments() {
        let out = scope_css("/* { */ .a::before { content: \"}\"; }", "t");
        assert!(out.contains(".t .a::before { content: \"}\"; }"));
    }

    #[test]
    fn test_scope_unterminated_rule_is_dropped() {
        assert_eq!(scope_css(".a { color: red", "t"), "");
    }
}
