//! Resume Controller: owns one resume document, its preview DOM and the template loader,
//! and sequences load → render → edit → re-render for a single editing session.
//!
//! Every change to the document is tagged with a generation. Asynchronous work that was
//! started against an older generation (a reload, an optimize call) is discarded when it
//! comes back, so a slow response can never overwrite newer content.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::document::checks::check_fields;
use crate::document::{merge_optimized, validate, ValidationWarning};
use crate::dom::{Dom, NodeId};
use crate::editor::{apply_commit, EditError, FieldCommit};
use crate::models::resume::{ResumeDocument, TemplateState};
use crate::models::template::TemplateDescriptor;
use crate::render::{render, RenderReport};
use crate::sources::resume::{DataOrigin, LoadedResume};
use crate::template::{TemplateError, TemplateLoader, TemplateSource};

pub const PREVIEW_ID: &str = "resumePreview";

/// Layout shown before any template is applied, and again after a reset.
const DEFAULT_LAYOUT: &str = r#"<div class="resume-default">
  <h1 class="resume-name" data-bind="basic.name"></h1>
  <p class="resume-position" data-bind="basic.position"></p>
  <p class="resume-contact"><span data-bind="basic.phone"></span> <span data-bind="basic.email"></span></p>
  <div class="education-list" data-bind="education.map(item => `<div class='education-item'>${item.school} ${item.major} <span class='item-time'>${item.time}</span></div>`)"></div>
  <div class="work-list" data-bind="work.map(item => `<div class='work-item'>${item.company} ${item.position} <span class='item-time'>${item.time}</span></div>`)"></div>
  <p class="resume-summary" data-bind="summary"></p>
</div>"#;

/// Proof that a change was started at a given generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub resume_id: String,
    pub document: ResumeDocument,
    pub template: Option<TemplateDescriptor>,
    pub color: Option<String>,
    pub origin: DataOrigin,
    pub warnings: Vec<ValidationWarning>,
    pub generation: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct ResumeController {
    resume_id: String,
    dom: Dom,
    container: NodeId,
    doc: ResumeDocument,
    warnings: Vec<ValidationWarning>,
    loader: TemplateLoader,
    default_template: Option<String>,
    generation: u64,
    origin: DataOrigin,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ResumeController {
    /// A controller with an empty document rendered into the default layout.
    pub fn new(
        resume_id: impl Into<String>,
        templates: Arc<dyn TemplateSource>,
        default_template: Option<String>,
    ) -> Self {
        let mut dom = Dom::new();
        let container = dom.create_element("div");
        dom.set_attr(container, "id", PREVIEW_ID);
        dom.set_attr(container, "class", "resume-preview");
        dom.set_inner_html(container, DEFAULT_LAYOUT);
        dom.append_child(dom.body(), container);

        let doc = ResumeDocument::default();
        render(&mut dom, container, &doc);

        let now = Utc::now();
        Self {
            resume_id: resume_id.into(),
            dom,
            container,
            doc,
            warnings: Vec::new(),
            loader: TemplateLoader::new(templates),
            default_template: default_template.filter(|id| !id.is_empty()),
            generation: 0,
            origin: DataOrigin::Empty,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn resume_id(&self) -> &str {
        &self.resume_id
    }

    pub fn document(&self) -> &ResumeDocument {
        &self.doc
    }

    /// Time of the last accepted change.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn active_template_id(&self) -> Option<&str> {
        self.loader.active().map(|t| t.id.as_str())
    }

    /// Starts a change. Any ticket handed out earlier becomes stale.
    pub fn begin_change(&mut self) -> Ticket {
        self.generation += 1;
        Ticket(self.generation)
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.generation
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Replaces the document with freshly loaded data and re-renders.
    ///
    /// Returns `None` without touching anything when `ticket` is stale. The template
    /// recorded in the data wins over the one currently shown, which wins over the
    /// configured default.
    pub async fn apply_loaded(&mut self, ticket: Ticket, loaded: LoadedResume) -> Option<RenderReport> {
        if !self.is_current(ticket) {
            debug!(resume_id = %self.resume_id, "discarding stale load result");
            return None;
        }
        let (doc, warnings) = validate(loaded.data);
        self.doc = doc;
        self.warnings = warnings;
        self.origin = loaded.origin;
        self.touch();

        let recorded = self.doc.template.clone();
        let target = Some(recorded.current_id.clone())
            .filter(|id| !id.is_empty())
            .or_else(|| self.active_template_id().map(str::to_string))
            .or_else(|| self.default_template.clone());

        let Some(id) = target else {
            return Some(self.rerender());
        };
        match self.set_template(&id).await {
            Ok(report) => {
                if !recorded.primary_color.is_empty() && recorded.current_id == id {
                    if let Err(e) = self.set_color(&recorded.primary_color) {
                        warn!(resume_id = %self.resume_id, error = %e, "ignoring stored theme colour");
                    }
                }
                Some(report)
            }
            Err(e) => {
                warn!(resume_id = %self.resume_id, template = %id, error = %e, "stored template unavailable; keeping current layout");
                Some(self.rerender())
            }
        }
    }

    /// Switches the preview to template `id`; the theme colour resets to the template's own.
    pub async fn set_template(&mut self, id: &str) -> Result<RenderReport, TemplateError> {
        let report = self
            .loader
            .set_template(&mut self.dom, self.container, &self.doc, id)
            .await?;
        self.sync_template_state();
        self.touch();
        Ok(report)
    }

    pub fn set_color(&mut self, color: &str) -> Result<(), TemplateError> {
        self.loader.set_color(&mut self.dom, color)?;
        self.sync_template_state();
        self.touch();
        Ok(())
    }

    /// Drops the active template and renders the document into the default layout.
    pub fn reset_template(&mut self) -> RenderReport {
        self.loader.reset_to_default(&mut self.dom, self.container);
        self.doc.template = TemplateState::default();
        self.touch();
        info!(resume_id = %self.resume_id, "template reset to default layout");
        self.rerender()
    }

    /// Applies one field edit. The document is fully updated before the re-render starts.
    pub fn commit(&mut self, commit: &FieldCommit) -> Result<RenderReport, EditError> {
        apply_commit(&mut self.doc, commit)?;
        self.begin_change();
        self.warnings = check_fields(&self.doc);
        self.touch();
        debug!(resume_id = %self.resume_id, section = %commit.section, field = %commit.field, "field committed");
        Ok(self.rerender())
    }

    /// Overlays an optimizer's proposal onto the document, unless the document changed
    /// since `ticket` was taken.
    pub fn apply_optimized(&mut self, ticket: Ticket, overlay: &Value) -> Option<RenderReport> {
        if !self.is_current(ticket) {
            debug!(resume_id = %self.resume_id, "discarding stale optimize result");
            return None;
        }
        let (doc, warnings) = merge_optimized(&self.doc, overlay);
        self.doc = doc;
        self.warnings = warnings;
        self.begin_change();
        self.touch();
        Some(self.rerender())
    }

    /// Preview markup with the active stylesheet inlined.
    pub fn preview_html(&self) -> String {
        self.loader.rendered_html(&self.dom, self.container)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            resume_id: self.resume_id.clone(),
            document: self.doc.clone(),
            template: self.loader.active().cloned(),
            color: self.loader.active_color().map(str::to_string),
            origin: self.origin,
            warnings: self.warnings.clone(),
            generation: self.generation,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn rerender(&mut self) -> RenderReport {
        render(&mut self.dom, self.container, &self.doc)
    }

    fn sync_template_state(&mut self) {
        self.doc.template = TemplateState {
            current_id: self.active_template_id().unwrap_or_default().to_string(),
            primary_color: self.loader.active_color().unwrap_or_default().to_string(),
        };
    }
}
