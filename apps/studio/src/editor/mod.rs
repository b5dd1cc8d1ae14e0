//! Field Editor bridge: the write-back contract between an editing surface and the
//! resume document.
//!
//! A commit names a section (canonical or alias key), an optional list index and a field.
//! The mutation completes before the caller re-renders.

pub mod fields;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::resume::{
    AwardItem, CampusItem, EducationItem, ListKind, ProjectItem, ResumeDocument, SkillItem,
    WorkItem,
};

pub use fields::{form_fields, FormField, InputKind};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCommit {
    pub section: String,
    /// `None` targets a scalar section (`basic`, `intention`, `summary`).
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub field: String,
    pub value: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error("unknown section '{0}'")]
    UnknownSection(String),

    #[error("section '{section}' has no field '{field}'")]
    UnknownField { section: String, field: String },

    #[error("section '{0}' is a list; an item index is required")]
    IndexRequired(String),

    #[error("section '{0}' is not a list")]
    NotAList(String),

    #[error("index {index} is out of range for '{section}' ({len} items)")]
    IndexOutOfRange {
        section: String,
        index: usize,
        len: usize,
    },

    #[error("edited document could not be read back: {0}")]
    Rejected(String),
}

/// A resolved commit target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Section {
    Basic,
    Intention,
    Summary,
    List(ListKind),
}

impl Section {
    pub fn from_key(key: &str) -> Option<Section> {
        match key {
            "basic" => Some(Section::Basic),
            "intention" => Some(Section::Intention),
            "summary" => Some(Section::Summary),
            other => ListKind::from_name(other).map(Section::List),
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Section::Basic => "basic",
            Section::Intention => "intention",
            Section::Summary => "summary",
            Section::List(kind) => kind.canonical(),
        }
    }
}

/// Writes `commit` into `doc`.
///
/// An index equal to the list length appends one empty item first; anything past that is
/// rejected so lists never get gaps. Values are trimmed.
pub fn apply_commit(doc: &mut ResumeDocument, commit: &FieldCommit) -> Result<(), EditError> {
    let section = Section::from_key(&commit.section)
        .ok_or_else(|| EditError::UnknownSection(commit.section.clone()))?;
    let value = commit.value.trim().to_string();

    let mut root = doc.to_value();
    let target = match (section, commit.index) {
        (Section::Summary, None) => {
            if !matches!(commit.field.as_str(), "" | "summary") {
                return Err(unknown_field(section, &commit.field));
            }
            root["summary"] = Value::String(value);
            return store(doc, root);
        }
        (Section::Basic | Section::Intention | Section::Summary, Some(_)) => {
            return Err(EditError::NotAList(section.key().to_string()));
        }
        (Section::Basic | Section::Intention, None) => &mut root[section.key()],
        (Section::List(_), None) => return Err(EditError::IndexRequired(section.key().to_string())),
        (Section::List(kind), Some(index)) => {
            let Some(items) = root[kind.canonical()].as_array_mut() else {
                return Err(EditError::UnknownSection(commit.section.clone()));
            };
            let len = items.len();
            if index > len {
                return Err(EditError::IndexOutOfRange {
                    section: kind.canonical().to_string(),
                    index,
                    len,
                });
            }
            if index == len {
                items.push(empty_item(kind));
            }
            &mut items[index]
        }
    };

    let Some(record) = target.as_object_mut() else {
        return Err(unknown_field(section, &commit.field));
    };
    match record.get_mut(&commit.field) {
        Some(slot) => *slot = Value::String(value),
        None => return Err(unknown_field(section, &commit.field)),
    }
    store(doc, root)
}

fn unknown_field(section: Section, field: &str) -> EditError {
    EditError::UnknownField {
        section: section.key().to_string(),
        field: field.to_string(),
    }
}

/// Replaces `doc` with the edited JSON. On failure `doc` is left as it was.
fn store(doc: &mut ResumeDocument, root: Value) -> Result<(), EditError> {
    *doc = serde_json::from_value(root).map_err(|e| EditError::Rejected(e.to_string()))?;
    Ok(())
}

/// The canonical empty record for a list, with every key present.
pub fn empty_item(kind: ListKind) -> Value {
    let item = match kind {
        ListKind::Education => serde_json::to_value(EducationItem::default()),
        ListKind::Work => serde_json::to_value(WorkItem::default()),
        ListKind::Project => serde_json::to_value(ProjectItem::default()),
        ListKind::Campus => serde_json::to_value(CampusItem::default()),
        ListKind::Awards => serde_json::to_value(AwardItem::default()),
        ListKind::Skills => serde_json::to_value(SkillItem::default()),
    };
    item.unwrap_or_else(|_| Value::Object(Default::default()))
}
