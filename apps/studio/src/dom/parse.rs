//! Lenient HTML fragment parser.
//!
//! Handles what template markup and item fragments actually contain: nested elements,
//! quoted/unquoted attributes, void elements, raw-text `<style>`/`<script>`, comments and
//! character references. Malformed input never fails; stray end tags are dropped and
//! unclosed elements are closed at end of input.

use super::{Dom, NodeId, RAW_TEXT_ELEMENTS, VOID_ELEMENTS};

pub(super) fn parse_fragment(dom: &mut Dom, html: &str) -> Vec<NodeId> {
    let mut parser = Parser {
        input: html,
        pos: 0,
        roots: Vec::new(),
        open: Vec::new(),
    };
    parser.run(dom);
    parser.roots
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    roots: Vec<NodeId>,
    open: Vec<(String, NodeId)>,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn run(&mut self, dom: &mut Dom) {
        while self.pos < self.input.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.pos += rest.find("-->").map(|i| i + 3).unwrap_or(rest.len());
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.pos += rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
            } else if rest.starts_with("</") {
                self.end_tag();
            } else if starts_tag(rest) {
                self.start_tag(dom);
            } else {
                self.text(dom);
            }
        }
    }

    fn insert(&mut self, dom: &mut Dom, node: NodeId) {
        match self.open.last() {
            Some((_, parent)) => dom.append_child(*parent, node),
            None => self.roots.push(node),
        }
    }

    fn text(&mut self, dom: &mut Dom) {
        let rest = self.rest();
        // The first byte is part of the text even when it is a lone '<'.
        let mut end = rest.len();
        for (i, _) in rest.char_indices().skip(1) {
            let tail = &rest[i..];
            if tail.starts_with("</") || tail.starts_with("<!") || starts_tag(tail) {
                end = i;
                break;
            }
        }
        let raw = &rest[..end];
        self.pos += end;
        let node = dom.create_text(&decode_entities(raw));
        self.insert(dom, node);
    }

    fn end_tag(&mut self) {
        let rest = self.rest();
        let close = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
        let name = rest[2..close]
            .trim_end_matches('>')
            .trim()
            .to_ascii_lowercase();
        self.pos += close;
        if let Some(depth) = self.open.iter().rposition(|(tag, _)| *tag == name) {
            self.open.truncate(depth);
        }
    }

    fn start_tag(&mut self, dom: &mut Dom) {
        self.pos += 1;
        let name = self.take_while(|c| !c.is_whitespace() && c != '>' && c != '/');
        let name = name.to_ascii_lowercase();
        let element = dom.create_element(&name);

        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                break;
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                self_closing = true;
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }
            let attr_name =
                self.take_while(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/');
            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.attr_value()
            } else {
                String::new()
            };
            if !attr_name.is_empty() && dom.attr(element, &attr_name.to_ascii_lowercase()).is_none()
            {
                dom.set_attr(element, &attr_name, &value);
            }
        }

        self.insert(dom, element);

        if VOID_ELEMENTS.contains(&name.as_str()) || self_closing {
            return;
        }
        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            self.raw_text(dom, element, &name);
            return;
        }
        self.open.push((name, element));
    }

    fn raw_text(&mut self, dom: &mut Dom, element: NodeId, name: &str) {
        let rest = self.rest();
        let needle = format!("</{name}");
        let end = rest
            .to_ascii_lowercase()
            .find(&needle)
            .unwrap_or(rest.len());
        let content = &rest[..end];
        if !content.is_empty() {
            let text = dom.create_text(content);
            dom.append_child(element, text);
        }
        self.pos += end;
        let rest = self.rest();
        if !rest.is_empty() {
            self.pos += rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
        }
    }

    fn attr_value(&mut self) -> String {
        let rest = self.rest();
        let quote = match rest.chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => {
                let raw = self.take_while(|c| !c.is_whitespace() && c != '>');
                return decode_entities(&raw);
            }
        };
        let body = &rest[1..];
        let end = body.find(quote).unwrap_or(body.len());
        let value = decode_entities(&body[..end]);
        self.pos += 1 + end + usize::from(end < body.len());
        value
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|(_, c)| !pred(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += end;
        rest[..end].to_string()
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }
}

fn starts_tag(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// Decodes the character references that show up in hand-written markup.
/// Unknown references are kept verbatim.
pub(crate) fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &rest[1..semi];
            decode_entity(entity).map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}
