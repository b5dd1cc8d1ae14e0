//! Template Renderer: projects a [`ResumeDocument`] into the bound elements of a preview
//! subtree.
//!
//! The renderer keeps no per-element state between passes. Everything it needs is read
//! from the `data-bind` attributes and the document, so re-running it after a template
//! switch or an edit simply rescans the current tree.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::binding::{resolve_array_map, resolve_scalar, BindingError, BindingExpression, BIND_ATTR};
use crate::dom::{Dom, NodeId};
use crate::models::resume::ResumeDocument;

/// Image shown when an avatar is missing or fails to load.
pub const DEFAULT_AVATAR: &str = "/images/default-avatar.png";

/// Outcome of one render pass.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RenderReport {
    pub scalars: usize,
    pub lists: usize,
    /// Bound elements whose expression could not be applied; they were left empty.
    pub failures: usize,
}

/// Applies `doc` to every bound element below `container`.
///
/// Elements below an array-bound element belong to its generated content and are not
/// scanned. A failing binding is logged and emptied; the rest of the pass continues.
pub fn render(dom: &mut Dom, container: NodeId, doc: &ResumeDocument) -> RenderReport {
    let data = doc.to_value();
    let mut report = RenderReport::default();

    let mut stack: Vec<NodeId> = dom.element_children(container).into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        let Some(raw) = dom.attr(node, BIND_ATTR).map(str::to_string) else {
            stack.extend(dom.element_children(node).into_iter().rev());
            continue;
        };

        match apply_binding(dom, node, &raw, &data) {
            Ok(Applied::Scalar) => {
                report.scalars += 1;
                stack.extend(dom.element_children(node).into_iter().rev());
            }
            Ok(Applied::List(count)) => {
                debug!(expression = %raw, fragments = count, "expanded list binding");
                report.lists += 1;
            }
            Err(e) => {
                warn!(error = %e, "binding skipped");
                dom.clear_children(node);
                report.failures += 1;
            }
        }
    }

    report
}

enum Applied {
    Scalar,
    List(usize),
}

fn apply_binding(
    dom: &mut Dom,
    node: NodeId,
    raw: &str,
    data: &Value,
) -> Result<Applied, BindingError> {
    match BindingExpression::parse(raw)? {
        BindingExpression::ArrayMap { list, template } => {
            let fragments = resolve_array_map(data, &list, &template)?;
            dom.clear_children(node);
            let mut appended = 0;
            for fragment in fragments {
                if let Some(element) = dom.parse_single_element(&fragment) {
                    dom.append_child(node, element);
                    appended += 1;
                }
            }
            Ok(Applied::List(appended))
        }
        BindingExpression::Path(segments) => {
            let value = resolve_scalar(data, &segments.join("."));
            apply_scalar(dom, node, &value);
            Ok(Applied::Scalar)
        }
    }
}

fn apply_scalar(dom: &mut Dom, node: NodeId, value: &str) {
    match dom.tag(node) {
        Some("img") => {
            let src = if value.trim().is_empty() {
                DEFAULT_AVATAR
            } else {
                value
            };
            dom.set_attr(node, "src", src);
            dom.set_image_fallback(node, DEFAULT_AVATAR);
        }
        Some("input") | Some("textarea") => dom.set_value(node, value),
        _ => dom.set_text_content(node, value),
    }
}
