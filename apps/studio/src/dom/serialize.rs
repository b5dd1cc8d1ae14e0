use super::{Dom, NodeId, NodeKind, RAW_TEXT_ELEMENTS, VOID_ELEMENTS};

pub(super) fn inner_html(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    let raw = dom.tag(id).is_some_and(|t| RAW_TEXT_ELEMENTS.contains(&t));
    if dom.tag(id) == Some("textarea") {
        if let Some(value) = dom.value(id) {
            push_escaped_text(&mut out, value);
            return out;
        }
    }
    for child in dom.children(id) {
        write_node(dom, *child, raw, &mut out);
    }
    out
}

pub(super) fn outer_html(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, id, false, &mut out);
    out
}

/// Form-control values are reflected into the markup so a serialized preview shows what
/// the user sees.
fn write_node(dom: &Dom, id: NodeId, raw_text: bool, out: &mut String) {
    match dom.kind(id) {
        Some(NodeKind::Text(text)) => {
            if raw_text {
                out.push_str(text);
            } else {
                push_escaped_text(out, text);
            }
        }
        Some(NodeKind::Element(el)) => {
            out.push('<');
            out.push_str(&el.tag);
            let reflect_value = el.tag == "input" && el.value.is_some();
            for (name, value) in &el.attrs {
                if reflect_value && name == "value" {
                    continue;
                }
                push_attr(out, name, value);
            }
            if reflect_value {
                if let Some(value) = &el.value {
                    push_attr(out, "value", value);
                }
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                return;
            }
            out.push_str(&inner_html(dom, id));
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
        None => {}
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out.push('"');
}

fn push_escaped_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

/// Escapes a value for interpolation into markup, text or quoted attribute position.
pub(crate) fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_round_trips_simple_markup() {
        let mut dom = Dom::new();
        let div = dom.create_element("div");
        dom.set_inner_html(div, r#"<h1 class="resume-name">Name</h1><img src="a.png">"#);
        assert_eq!(
            dom.inner_html(div),
            r#"<h1 class="resume-name">Name</h1><img src="a.png">"#
        );
    }

    #[test]
    fn test_serialize_escapes_attribute_values() {
        let mut dom = Dom::new();
        let div = dom.create_element("div");
        dom.set_attr(div, "data-bind", r#"a.map(i => `<p title="x">`)"#);
        assert_eq!(
            dom.outer_html(div),
            r#"<div data-bind="a.map(i =&gt; `&lt;p title=&quot;x&quot;&gt;`)"></div>"#
        );
    }

    #[test]
    fn test_serialize_reflects_form_values() {
        let mut dom = Dom::new();
        let input = dom.create_element("input");
        dom.set_attr(input, "value", "stale");
        dom.set_value(input, "fresh");
        assert_eq!(dom.outer_html(input), r#"<input value="fresh">"#);

        let area = dom.create_element("textarea");
        dom.set_value(area, "a < b");
        assert_eq!(dom.outer_html(area), "<textarea>a &lt; b</textarea>");
    }

    #[test]
    fn test_serialize_style_text_unescaped() {
        let mut dom = Dom::new();
        let style = dom.create_element("style");
        dom.set_text_content(style, ".a > .b {}");
        assert_eq!(dom.outer_html(style), "<style>.a > .b {}</style>");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">'&'"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;");
    }
}
