//! In-memory preview DOM.
//!
//! A small arena tree that plays the role of the browser document for a single editing
//! session: one `<html>` root with a `<head>` (template-owned `<style>` elements live here)
//! and a `<body>` (the preview container lives here).
//!
//! The API is lenient: every accessor tolerates stale or detached `NodeId`s and degrades to
//! `None` / no-op instead of panicking. A render pass must never be aborted by unexpected
//! tree state.

mod parse;
mod selector;
mod serialize;

pub(crate) use parse::decode_entities;
pub use selector::Selector;
pub(crate) use serialize::escape_html;

/// Handle to a node in a [`Dom`]. Becomes stale once the node is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    /// Live `value` property of form controls. Distinct from the `value` attribute.
    pub value: Option<String>,
    /// Source an `<img>` falls back to when loading its current source fails.
    pub fallback_src: Option<String>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Elements that never have children.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose content is kept as unparsed, unescaped text.
pub(crate) const RAW_TEXT_ELEMENTS: &[&str] = &["style", "script"];

#[derive(Debug)]
pub struct Dom {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        let mut dom = Dom {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            head: NodeId {
                index: 0,
                generation: 0,
            },
            body: NodeId {
                index: 0,
                generation: 0,
            },
        };
        let root = dom.create_element("html");
        let head = dom.create_element("head");
        let body = dom.create_element("body");
        dom.append_child(root, head);
        dom.append_child(root, body);
        dom.root = root;
        dom.head = head;
        dom.body = body;
        dom
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    // ────────────────────────────────────────────────────────────────────────
    // Arena
    // ────────────────────────────────────────────────────────────────────────

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let node = Node {
            parent: None,
            children: Vec::new(),
            kind,
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index: (self.slots.len() - 1) as u32,
                generation: 0,
            }
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id)?.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    /// Returns true while `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live nodes, attached or not.
    pub fn live_nodes(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    /// Detaches `id` and frees it together with its whole subtree.
    /// Handles to any node of the subtree become stale.
    pub fn discard(&mut self, id: NodeId) {
        if id == self.root || id == self.head || id == self.body {
            return;
        }
        self.detach(id);
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(slot) = self.slots.get_mut(current.index as usize) else {
                continue;
            };
            if slot.generation != current.generation {
                continue;
            }
            if let Some(node) = slot.node.take() {
                pending.extend(node.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Construction and structure
    // ────────────────────────────────────────────────────────────────────────

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            value: None,
            fallback_src: None,
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    /// Appends `child` as the last child of `parent`, moving it if it is already attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return;
        }
        if self.is_inclusive_ancestor(child, parent) {
            return;
        }
        self.detach(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    /// Inserts `child` as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.append_child(parent, child);
        if let Some(node) = self.node_mut(parent) {
            if let Some(pos) = node.children.iter().position(|c| *c == child) {
                let c = node.children.remove(pos);
                node.children.insert(0, c);
            }
        }
    }

    /// Removes `id` from its parent without freeing it.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
    }

    /// Detaches all children of `id` and returns them, still alive.
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = match self.node_mut(id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return Vec::new(),
        };
        for child in &children {
            if let Some(n) = self.node_mut(*child) {
                n.parent = None;
            }
        }
        children
    }

    /// Discards every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        for child in self.take_children(id) {
            self.discard(child);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
            .collect()
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    /// True when `ancestor` is `id` itself or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// All nodes below `id` in document order, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    // ────────────────────────────────────────────────────────────────────────
    // Element accessors
    // ────────────────────────────────────────────────────────────────────────

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(el) = self.element_mut(id) else {
            return;
        };
        let name = name.to_ascii_lowercase();
        match el.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => el.attrs.push((name, value.to_string())),
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attrs.retain(|(k, _)| k != name);
        }
    }

    pub fn classes(&self, id: NodeId) -> Vec<String> {
        self.attr(id, "class")
            .map(|c| c.split_whitespace().map(String::from).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|c| c.split_whitespace().any(|x| x == class))
    }

    /// Adds `class`; returns false if it was already present.
    pub fn add_class(&mut self, id: NodeId, class: &str) -> bool {
        if !self.is_element(id) || self.has_class(id, class) {
            return false;
        }
        let mut classes = self.classes(id);
        classes.push(class.to_string());
        self.set_attr(id, "class", &classes.join(" "));
        true
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            return;
        }
        let classes: Vec<String> = self
            .classes(id)
            .into_iter()
            .filter(|c| c != class)
            .collect();
        if classes.is_empty() {
            self.remove_attr(id, "class");
        } else {
            self.set_attr(id, "class", &classes.join(" "));
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        match self.kind(id) {
            Some(NodeKind::Text(t)) => t.clone(),
            Some(NodeKind::Element(_)) => self
                .descendants(id)
                .into_iter()
                .filter_map(|n| match self.kind(n) {
                    Some(NodeKind::Text(t)) => Some(t.as_str()),
                    _ => None,
                })
                .collect(),
            None => String::new(),
        }
    }

    /// Replaces all children with a single text node (none for empty text).
    /// The text is never interpreted as markup.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        if !self.is_element(id) {
            if let Some(node) = self.node_mut(id) {
                node.kind = NodeKind::Text(text.to_string());
            }
            return;
        }
        self.clear_children(id);
        if !text.is_empty() {
            let t = self.create_text(text);
            self.append_child(id, t);
        }
    }

    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.element(id)?.value.as_deref()
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.value = Some(value.to_string());
        }
    }

    /// Installs the source an image switches to when its current source fails to load.
    pub fn set_image_fallback(&mut self, id: NodeId, src: &str) {
        if let Some(el) = self.element_mut(id) {
            el.fallback_src = Some(src.to_string());
        }
    }

    /// Reports that the image at `id` failed to load. Applies the installed fallback and
    /// returns true if the source changed.
    pub fn dispatch_image_error(&mut self, id: NodeId) -> bool {
        let Some(fallback) = self.element(id).and_then(|el| el.fallback_src.clone()) else {
            return false;
        };
        if self.attr(id, "src") == Some(fallback.as_str()) {
            return false;
        }
        self.set_attr(id, "src", &fallback);
        true
    }

    // ────────────────────────────────────────────────────────────────────────
    // Queries
    // ────────────────────────────────────────────────────────────────────────

    /// First attached element whose `id` attribute equals `element_id`.
    pub fn element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|n| self.attr(*n, "id") == Some(element_id))
    }

    /// Elements below `scope` matching `selector`, in document order.
    /// An unparseable selector matches nothing.
    pub fn query_selector_all(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        let Some(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        self.descendants(scope)
            .into_iter()
            .filter(|n| self.is_element(*n) && selector.matches(self, *n, scope))
            .collect()
    }

    pub fn query_selector(&self, scope: NodeId, selector: &str) -> Option<NodeId> {
        self.query_selector_all(scope, selector).into_iter().next()
    }

    /// Value of one declaration in the element's inline `style` attribute.
    pub fn style_property(&self, id: NodeId, property: &str) -> Option<String> {
        self.attr(id, "style")?.split(';').find_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            (name.trim() == property).then(|| value.trim().to_string())
        })
    }

    // ────────────────────────────────────────────────────────────────────────
    // Markup
    // ────────────────────────────────────────────────────────────────────────

    /// Parses `html` into detached nodes and returns the top-level ones.
    pub fn parse_fragment(&mut self, html: &str) -> Vec<NodeId> {
        parse::parse_fragment(self, html)
    }

    /// Parses `html` and returns its first element, discarding everything else.
    pub fn parse_single_element(&mut self, html: &str) -> Option<NodeId> {
        let nodes = self.parse_fragment(html);
        let mut found = None;
        for node in nodes {
            if found.is_none() && self.is_element(node) {
                found = Some(node);
            } else {
                self.discard(node);
            }
        }
        found
    }

    /// Replaces the children of `id` with the parsed `html`.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) {
        self.clear_children(id);
        for node in self.parse_fragment(html) {
            self.append_child(id, node);
        }
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        serialize::inner_html(self, id)
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        serialize::outer_html(self, id)
    }
}
