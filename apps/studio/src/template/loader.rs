use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dom::{Dom, NodeId};
use crate::models::resume::ResumeDocument;
use crate::models::template::TemplateDescriptor;
use crate::render::{render, RenderReport};
use crate::template::scope::scope_css;
use crate::template::{bundled, TemplateError, TemplateSource};

/// Id of the one `<style>` element in `<head>` this loader owns.
pub const STYLE_ELEMENT_ID: &str = "template-style";

/// Accent colour used when a catalog entry carries an unusable one.
pub const DEFAULT_PRIMARY_COLOR: &str = "#2196F3";

struct ActiveTemplate {
    descriptor: TemplateDescriptor,
    color: String,
    /// Scoped stylesheet without the colour rule.
    css: String,
}

/// Installs templates into a preview container and removes them again.
///
/// Everything it adds is tracked: the owned style element, the classes it put on the
/// container, and the container's original children, which are kept detached while a
/// template is installed.
pub struct TemplateLoader {
    source: Arc<dyn TemplateSource>,
    catalog: Option<Vec<TemplateDescriptor>>,
    style_cache: HashMap<String, String>,
    active: Option<ActiveTemplate>,
    original_children: Option<Vec<NodeId>>,
    added_classes: Vec<String>,
}

impl TemplateLoader {
    pub fn new(source: Arc<dyn TemplateSource>) -> Self {
        Self {
            source,
            catalog: None,
            style_cache: HashMap::new(),
            active: None,
            original_children: None,
            added_classes: Vec::new(),
        }
    }

    pub fn active(&self) -> Option<&TemplateDescriptor> {
        self.active.as_ref().map(|a| &a.descriptor)
    }

    pub fn active_color(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.color.as_str())
    }

    /// The template catalog, loaded once per loader.
    pub async fn list_templates(&mut self) -> Vec<TemplateDescriptor> {
        if let Some(catalog) = &self.catalog {
            return catalog.clone();
        }
        let templates = load_catalog(self.source.as_ref()).await;
        self.catalog = Some(templates.clone());
        templates
    }

    /// Installs template `id` into `container` and renders `doc` into it.
    ///
    /// An unknown id fails with [`TemplateError::NotFound`] before anything is touched.
    /// Fetch failures fall back to placeholder markup and the built-in stylesheet.
    pub async fn set_template(
        &mut self,
        dom: &mut Dom,
        container: NodeId,
        doc: &ResumeDocument,
        id: &str,
    ) -> Result<RenderReport, TemplateError> {
        let descriptor = self
            .list_templates()
            .await
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))?;

        let (markup, (css, fresh)) = tokio::join!(
            self.fetch_markup(&descriptor),
            self.fetch_stylesheet(&descriptor)
        );
        if fresh {
            self.style_cache.insert(descriptor.id.clone(), css.clone());
        }

        self.uninstall_artifacts(dom, container);

        if self.original_children.is_none() {
            self.original_children = Some(dom.take_children(container));
        } else {
            dom.clear_children(container);
        }
        dom.set_inner_html(container, &markup);
        if dom.add_class(container, &descriptor.id) {
            self.added_classes.push(descriptor.id.clone());
        }

        let active = ActiveTemplate {
            color: descriptor.primary_color.clone(),
            css: scope_css(&css, &descriptor.id),
            descriptor,
        };
        install_style(dom, &active);
        info!(template = %active.descriptor.id, "template installed");
        self.active = Some(active);

        Ok(render(dom, container, doc))
    }

    /// Changes the accent colour of the active template without refetching anything.
    pub fn set_color(&mut self, dom: &mut Dom, color: &str) -> Result<(), TemplateError> {
        let color = color.trim();
        if !is_safe_color(color) {
            return Err(TemplateError::InvalidColor(color.to_string()));
        }
        let active = self.active.as_mut().ok_or(TemplateError::NoActiveTemplate)?;
        active.color = color.to_string();
        install_style(dom, active);
        debug!(template = %active.descriptor.id, color, "theme colour updated");
        Ok(())
    }

    /// Removes every template artifact and restores the container's pre-template children.
    /// Classes that were on the container before any template was installed are kept.
    pub fn reset_to_default(&mut self, dom: &mut Dom, container: NodeId) {
        self.uninstall_artifacts(dom, container);
        if let Some(original) = self.original_children.take() {
            dom.clear_children(container);
            for child in original {
                dom.append_child(container, child);
            }
        }
        self.active = None;
    }

    /// Container markup with the active stylesheet inlined in front of it, for export.
    pub fn rendered_html(&self, dom: &Dom, container: NodeId) -> String {
        let body = dom.outer_html(container);
        match &self.active {
            Some(active) => format!("<style>{}</style>{body}", stylesheet_text(active)),
            None => body,
        }
    }

    fn uninstall_artifacts(&mut self, dom: &mut Dom, container: NodeId) {
        remove_owned_styles(dom);
        for class in self.added_classes.drain(..) {
            dom.remove_class(container, &class);
        }
    }

    async fn fetch_markup(&self, descriptor: &TemplateDescriptor) -> String {
        match self.source.markup(descriptor).await {
            Ok(markup) => markup,
            Err(e) => {
                warn!(template = %descriptor.id, error = %e, "failed to load template markup; using placeholder");
                bundled::PLACEHOLDER_MARKUP.to_string()
            }
        }
    }

    /// The raw stylesheet, and whether it was freshly fetched (and so should be cached).
    /// Fallback styles are never cached.
    async fn fetch_stylesheet(&self, descriptor: &TemplateDescriptor) -> (String, bool) {
        if let Some(css) = self.style_cache.get(&descriptor.id) {
            return (css.clone(), false);
        }
        match self.source.stylesheet(descriptor).await {
            Ok(css) => (css, true),
            Err(e) => {
                warn!(template = %descriptor.id, error = %e, "failed to load template stylesheet; using built-in styles");
                (bundled::FALLBACK_STYLESHEET.to_string(), false)
            }
        }
    }
}

/// Reads the catalog from `source`. Entries whose id cannot be used as a class name are
/// dropped and unsafe accent colours are replaced. An unreadable or empty catalog falls
/// back to the bundled one.
pub async fn load_catalog(source: &dyn TemplateSource) -> Vec<TemplateDescriptor> {
    let templates = match source.catalog().await {
        Ok(catalog) => sanitize_catalog(catalog.templates),
        Err(e) => {
            warn!(error = %e, "failed to load template catalog; using bundled templates");
            return bundled::catalog().templates;
        }
    };
    if templates.is_empty() {
        warn!("template catalog is empty; using bundled templates");
        return bundled::catalog().templates;
    }
    templates
}

fn sanitize_catalog(templates: Vec<TemplateDescriptor>) -> Vec<TemplateDescriptor> {
    templates
        .into_iter()
        .filter_map(|mut t| {
            if !is_safe_template_id(&t.id) {
                warn!(template = %t.id, "dropping catalog entry with an unusable id");
                return None;
            }
            let color = t.primary_color.trim();
            if !is_safe_color(color) {
                warn!(template = %t.id, color, "catalog colour rejected; using the default");
                t.primary_color = DEFAULT_PRIMARY_COLOR.to_string();
            } else if color.len() != t.primary_color.len() {
                t.primary_color = color.to_string();
            }
            Some(t)
        })
        .collect()
}

/// Ids become a class name, a CSS selector and a path segment.
fn is_safe_template_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && !id.starts_with('-')
        && id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
}

fn stylesheet_text(active: &ActiveTemplate) -> String {
    format!(
        "{}\n.{} {{ --primary-color: {}; }}\n",
        active.css, active.descriptor.id, active.color
    )
}

fn remove_owned_styles(dom: &mut Dom) {
    let selector = format!("#{STYLE_ELEMENT_ID}");
    for node in dom.query_selector_all(dom.head(), &selector) {
        dom.discard(node);
    }
}

fn install_style(dom: &mut Dom, active: &ActiveTemplate) {
    remove_owned_styles(dom);
    let style = dom.create_element("style");
    dom.set_attr(style, "id", STYLE_ELEMENT_ID);
    dom.set_text_content(style, &stylesheet_text(active));
    dom.append_child(dom.head(), style);
}

/// Accepts colour values that cannot terminate the declaration they are written into.
fn is_safe_color(color: &str) -> bool {
    !color.is_empty()
        && color.len() <= 64
        && color
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '#' | '(' | ')' | ',' | '.' | '%' | ' ' | '-'))
}
