use serde::{Deserialize, Serialize};

/// A named bundle of markup + stylesheet + accent colour. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub primary_color: String,
    /// Markup file, relative to the template's own directory.
    #[serde(default = "default_markup_ref", alias = "htmlPath")]
    pub markup_ref: String,
    /// Stylesheet file, relative to the template's own directory.
    #[serde(default = "default_style_ref", alias = "cssPath")]
    pub style_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

fn default_markup_ref() -> String {
    "template.html".to_string()
}

fn default_style_ref() -> String {
    "style.css".to_string()
}

impl TemplateDescriptor {
    /// File name part of `markup_ref`; older catalogs carry absolute paths.
    pub fn markup_file(&self) -> &str {
        file_name(&self.markup_ref)
    }

    pub fn style_file(&self) -> &str {
        file_name(&self.style_ref)
    }
}

fn file_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// Wire shape of `GET /templates/templates.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateCatalog {
    #[serde(default)]
    pub templates: Vec<TemplateDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_defaults_file_refs() {
        let d: TemplateDescriptor = serde_json::from_value(json!({
            "id": "modern", "name": "Modern", "primaryColor": "#4CAF50"
        }))
        .unwrap();
        assert_eq!(d.markup_file(), "template.html");
        assert_eq!(d.style_file(), "style.css");
    }

    #[test]
    fn test_descriptor_accepts_legacy_paths() {
        let catalog: TemplateCatalog = serde_json::from_value(json!({ "templates": [{
            "id": "classic", "name": "经典模板", "primaryColor": "#9C27B0",
            "htmlPath": "/templates/classic/template.html",
            "cssPath": "/templates/classic/template.css"
        }]}))
        .unwrap();
        assert_eq!(catalog.templates[0].markup_file(), "template.html");
        assert_eq!(catalog.templates[0].style_file(), "template.css");
    }
}
