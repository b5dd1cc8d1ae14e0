//! The canonical resume document.
//!
//! Every record field is a plain string and every field is always present after
//! deserialization: missing keys default to `""`, scalar values of the wrong JSON type are
//! coerced to text, and legacy key spellings are accepted as serde aliases. Unknown keys
//! are dropped (the schema is closed). Presentation state lives only in [`TemplateState`].

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeDocument {
    #[serde(deserialize_with = "lenient_record")]
    pub basic: BasicInfo,
    #[serde(deserialize_with = "lenient_record")]
    pub intention: JobIntention,
    #[serde(deserialize_with = "lenient_string")]
    pub summary: String,
    #[serde(deserialize_with = "lenient_list")]
    pub education: Vec<EducationItem>,
    #[serde(deserialize_with = "lenient_list")]
    pub work: Vec<WorkItem>,
    #[serde(deserialize_with = "lenient_list")]
    pub project: Vec<ProjectItem>,
    #[serde(deserialize_with = "lenient_list")]
    pub campus: Vec<CampusItem>,
    #[serde(deserialize_with = "lenient_list")]
    pub awards: Vec<AwardItem>,
    #[serde(deserialize_with = "lenient_list")]
    pub skills: Vec<SkillItem>,
    #[serde(deserialize_with = "lenient_record")]
    pub template: TemplateState,
}

impl ResumeDocument {
    /// JSON view used by the binding resolver. Serialization of plain string records cannot
    /// fail; an empty object is returned if it ever does.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicInfo {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    /// URI, server path or `data:` URI.
    #[serde(deserialize_with = "lenient_string")]
    pub avatar: String,
    #[serde(deserialize_with = "lenient_string")]
    pub position: String,
    #[serde(deserialize_with = "lenient_string")]
    pub gender: String,
    #[serde(deserialize_with = "lenient_string")]
    pub age: String,
    #[serde(alias = "political", deserialize_with = "lenient_string")]
    pub political_status: String,
    #[serde(deserialize_with = "lenient_string")]
    pub education_level: String,
    #[serde(alias = "experience", deserialize_with = "lenient_string")]
    pub experience_years: String,
    #[serde(alias = "status", deserialize_with = "lenient_string")]
    pub job_status: String,
    #[serde(deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobIntention {
    #[serde(alias = "jobPosition", deserialize_with = "lenient_string")]
    pub position: String,
    #[serde(deserialize_with = "lenient_string")]
    pub city: String,
    #[serde(deserialize_with = "lenient_string")]
    pub salary: String,
    #[serde(deserialize_with = "lenient_string")]
    pub entry_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationItem {
    #[serde(deserialize_with = "lenient_string")]
    pub school: String,
    #[serde(deserialize_with = "lenient_string")]
    pub major: String,
    #[serde(deserialize_with = "lenient_string")]
    pub degree: String,
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub gpa: String,
    #[serde(deserialize_with = "lenient_string")]
    pub rank: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkItem {
    #[serde(deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(deserialize_with = "lenient_string")]
    pub department: String,
    #[serde(alias = "workPosition", deserialize_with = "lenient_string")]
    pub position: String,
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectItem {
    #[serde(alias = "projectName", deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(alias = "projectRole", deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(alias = "projectLink", deserialize_with = "lenient_string")]
    pub link: String,
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampusItem {
    #[serde(alias = "campusOrg", deserialize_with = "lenient_string")]
    pub organization: String,
    #[serde(alias = "campusRole", deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(rename = "type", alias = "campusType", deserialize_with = "lenient_string")]
    pub activity_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AwardItem {
    #[serde(alias = "awardName", deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(alias = "awardDate", deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillItem {
    #[serde(alias = "skillName", deserialize_with = "lenient_string")]
    pub name: String,
    /// Proficiency, usually a percentage such as `"90"`.
    #[serde(alias = "skillLevel", deserialize_with = "lenient_string")]
    pub level: String,
    #[serde(alias = "skillDetail", deserialize_with = "lenient_string")]
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateState {
    #[serde(alias = "current", deserialize_with = "lenient_string")]
    pub current_id: String,
    #[serde(alias = "color", deserialize_with = "lenient_string")]
    pub primary_color: String,
}

// ────────────────────────────────────────────────────────────────────────────
// List sections and their alias table
// ────────────────────────────────────────────────────────────────────────────

/// The ordered list sections of a resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListKind {
    Education,
    Work,
    Project,
    Campus,
    Awards,
    Skills,
}

impl ListKind {
    pub const ALL: [ListKind; 6] = [
        ListKind::Education,
        ListKind::Work,
        ListKind::Project,
        ListKind::Campus,
        ListKind::Awards,
        ListKind::Skills,
    ];

    /// Field name in [`ResumeDocument`].
    pub fn canonical(self) -> &'static str {
        match self {
            ListKind::Education => "education",
            ListKind::Work => "work",
            ListKind::Project => "project",
            ListKind::Campus => "campus",
            ListKind::Awards => "awards",
            ListKind::Skills => "skills",
        }
    }

    /// Other key spellings that template variants and older payloads use for the list.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            ListKind::Education => &["educationList", "educations"],
            ListKind::Work => &["workList", "workExperience", "experience", "works"],
            ListKind::Project => &["projectList", "projects"],
            ListKind::Campus => &["campusList", "campusExperience"],
            ListKind::Awards => &["awardList", "awardsList", "award"],
            ListKind::Skills => &["skillList", "skillsList", "skill"],
        }
    }

    /// Looks a list up by canonical name or alias.
    pub fn from_name(name: &str) -> Option<ListKind> {
        ListKind::ALL
            .into_iter()
            .find(|k| k.canonical() == name || k.aliases().contains(&name))
    }

    /// Legacy single-string date range keys for items of this list.
    pub fn legacy_time_keys(self) -> &'static [&'static str] {
        match self {
            ListKind::Education => &["time", "eduTime"],
            ListKind::Work => &["time", "workTime"],
            ListKind::Project => &["time", "projectTime"],
            ListKind::Campus => &["time", "campusTime"],
            ListKind::Awards | ListKind::Skills => &[],
        }
    }

    /// Human-readable notice shown when the list has no items.
    pub fn empty_notice(self) -> &'static str {
        match self {
            ListKind::Education => "No education entries yet",
            ListKind::Work => "No work experience yet",
            ListKind::Project => "No project experience yet",
            ListKind::Campus => "No campus experience yet",
            ListKind::Awards => "No awards yet",
            ListKind::Skills => "No skills yet",
        }
    }
}

/// A record with legacy key spellings. Each `(alias, canonical)` pair is folded before
/// deserializing so a record carrying both spellings still reads; the canonical key wins
/// unless it is blank.
pub trait Record: DeserializeOwned + Default {
    const KEY_ALIASES: &'static [(&'static str, &'static str)] = &[];
}

/// Implemented by list items so a bare string element can still become an item.
pub trait ListItem: Record {
    /// Key a bare string element is stored under.
    const TEXT_FIELD: &'static str;
}

impl Record for BasicInfo {
    const KEY_ALIASES: &'static [(&'static str, &'static str)] = &[
        ("political", "politicalStatus"),
        ("experience", "experienceYears"),
        ("status", "jobStatus"),
    ];
}
impl Record for JobIntention {
    const KEY_ALIASES: &'static [(&'static str, &'static str)] = &[("jobPosition", "position")];
}
impl Record for TemplateState {
    const KEY_ALIASES: &'static [(&'static str, &'static str)] =
        &[("current", "currentId"), ("color", "primaryColor")];
}
impl Record for EducationItem {}
impl Record for WorkItem {
    const KEY_ALIASES: &'static [(&'static str, &'static str)] = &[("workPosition", "position")];
}
impl Record for ProjectItem {
    const KEY_ALIASES: &'static [(&'static str, &'static str)] = &[
        ("projectName", "name"),
        ("projectRole", "role"),
        ("projectLink", "link"),
    ];
}
impl Record for CampusItem {
    const KEY_ALIASES: &'static [(&'static str, &'static str)] = &[
        ("campusOrg", "organization"),
        ("campusRole", "role"),
        ("campusType", "type"),
    ];
}
impl Record for AwardItem {
    const KEY_ALIASES: &'static [(&'static str, &'static str)] =
        &[("awardName", "name"), ("awardDate", "date")];
}
impl Record for SkillItem {
    const KEY_ALIASES: &'static [(&'static str, &'static str)] = &[
        ("skillName", "name"),
        ("skillLevel", "level"),
        ("skillDetail", "detail"),
    ];
}

impl ListItem for EducationItem {
    const TEXT_FIELD: &'static str = "school";
}
impl ListItem for WorkItem {
    const TEXT_FIELD: &'static str = "company";
}
impl ListItem for ProjectItem {
    const TEXT_FIELD: &'static str = "name";
}
impl ListItem for CampusItem {
    const TEXT_FIELD: &'static str = "organization";
}
impl ListItem for AwardItem {
    const TEXT_FIELD: &'static str = "name";
}
impl ListItem for SkillItem {
    const TEXT_FIELD: &'static str = "name";
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient deserializers
// ────────────────────────────────────────────────────────────────────────────

/// Scalar text: strings pass through, numbers and booleans are printed, anything else is empty.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(&value))
}

fn lenient_record<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Record,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(record) = value else {
        return Ok(T::default());
    };
    Ok(read_record(record))
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: ListItem,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(record) => Some(read_record(record)),
            Value::String(s) if !s.trim().is_empty() => {
                let mut record = Map::new();
                record.insert(T::TEXT_FIELD.to_string(), Value::String(s));
                Some(read_record(record))
            }
            _ => None,
        })
        .collect())
}

fn read_record<T: Record>(mut record: Map<String, Value>) -> T {
    fold_key_aliases(&mut record, T::KEY_ALIASES);
    match serde_json::from_value(Value::Object(record)) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(
                record = std::any::type_name::<T>(),
                error = %e,
                "record could not be read; using an empty one"
            );
            T::default()
        }
    }
}

/// Moves each alias value onto its canonical key. A non-blank canonical value is kept and
/// the alias is dropped.
fn fold_key_aliases(record: &mut Map<String, Value>, aliases: &[(&str, &str)]) {
    for (alias, canonical) in aliases {
        let Some(value) = record.remove(*alias) else {
            continue;
        };
        let canonical_blank = record
            .get(*canonical)
            .map_or(true, |v| value_to_text(v).trim().is_empty());
        if canonical_blank {
            record.insert(canonical.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_default_to_empty() {
        let doc: ResumeDocument = serde_json::from_value(json!({})).unwrap();
        assert_eq!(doc, ResumeDocument::default());
        assert_eq!(doc.basic.name, "");
    }

    #[test]
    fn test_item_always_has_every_key() {
        let doc: ResumeDocument =
            serde_json::from_value(json!({ "education": [{ "school": "北京大学" }] })).unwrap();
        let value = doc.to_value();
        let item = value["education"][0].as_object().unwrap();
        for key in [
            "school",
            "major",
            "degree",
            "startDate",
            "endDate",
            "gpa",
            "rank",
            "description",
        ] {
            assert!(item.contains_key(key), "missing {key}");
        }
        assert_eq!(item["school"], "北京大学");
        assert_eq!(item["gpa"], "");
    }

    #[test]
    fn test_scalars_are_coerced_to_text() {
        let doc: ResumeDocument =
            serde_json::from_value(json!({ "basic": { "age": 25, "name": null, "phone": true } }))
                .unwrap();
        assert_eq!(doc.basic.age, "25");
        assert_eq!(doc.basic.name, "");
        assert_eq!(doc.basic.phone, "true");
    }

    #[test]
    fn test_wrong_container_types_become_defaults() {
        let doc: ResumeDocument =
            serde_json::from_value(json!({ "basic": "oops", "work": { "company": "x" } })).unwrap();
        assert_eq!(doc.basic, BasicInfo::default());
        assert!(doc.work.is_empty());
    }

    #[test]
    fn test_dual_spelled_keys_keep_the_record() {
        let doc: ResumeDocument = serde_json::from_value(json!({
            "basic": { "name": "张三", "phone": "13800138000", "experience": "5年", "experienceYears": "3年" },
            "project": [{ "name": "简历系统", "projectName": "旧名称", "role": "后端" }],
            "template": { "current": "classic", "currentId": "modern", "color": "#4CAF50", "primaryColor": "" }
        }))
        .unwrap();
        assert_eq!(doc.basic.name, "张三");
        assert_eq!(doc.basic.phone, "13800138000");
        assert_eq!(doc.basic.experience_years, "3年");
        assert_eq!(doc.project[0].name, "简历系统");
        assert_eq!(doc.project[0].role, "后端");
        assert_eq!(doc.template.current_id, "modern");
        assert_eq!(doc.template.primary_color, "#4CAF50");
    }

    #[test]
    fn test_fold_key_aliases_prefers_canonical() {
        let mut record = json!({ "skillName": "Go", "name": "Rust", "skillDetail": "3 years", "detail": " " });
        let record = record.as_object_mut().unwrap();
        fold_key_aliases(record, SkillItem::KEY_ALIASES);
        assert_eq!(record.get("name"), Some(&json!("Rust")));
        assert_eq!(record.get("detail"), Some(&json!("3 years")));
        assert!(!record.contains_key("skillName"));
        assert!(!record.contains_key("skillDetail"));
    }

    #[test]
    fn test_legacy_key_aliases() {
        let doc: ResumeDocument = serde_json::from_value(json!({
            "basic": { "political": "群众", "status": "在职" },
            "project": [{ "projectName": "简历生成系统", "projectRole": "前端开发" }],
            "awards": [{ "awardName": "一等奖学金", "awardDate": "2020" }],
            "skills": [{ "skillName": "Rust", "skillDetail": "3 years" }],
            "template": { "current": "modern", "color": "#4CAF50" }
        }))
        .unwrap();
        assert_eq!(doc.basic.political_status, "群众");
        assert_eq!(doc.basic.job_status, "在职");
        assert_eq!(doc.project[0].name, "简历生成系统");
        assert_eq!(doc.project[0].role, "前端开发");
        assert_eq!(doc.awards[0].date, "2020");
        assert_eq!(doc.skills[0].detail, "3 years");
        assert_eq!(doc.template.current_id, "modern");
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        let doc: ResumeDocument =
            serde_json::from_value(json!({ "basic": { "name": "A", "qq": "123" }, "extra": 1 }))
                .unwrap();
        let value = doc.to_value();
        assert!(value["basic"].get("qq").is_none());
        assert!(value.get("extra").is_none());
    }

    #[test]
    fn test_bare_string_items() {
        let doc: ResumeDocument =
            serde_json::from_value(json!({ "awards": ["国家奖学金", "", 3] })).unwrap();
        assert_eq!(doc.awards.len(), 1);
        assert_eq!(doc.awards[0].name, "国家奖学金");
    }

    #[test]
    fn test_campus_type_serializes_as_type() {
        let mut doc = ResumeDocument::default();
        doc.campus.push(CampusItem {
            activity_type: "社团".to_string(),
            ..Default::default()
        });
        assert_eq!(doc.to_value()["campus"][0]["type"], "社团");
    }

    #[test]
    fn test_list_kind_alias_lookup() {
        assert_eq!(ListKind::from_name("education"), Some(ListKind::Education));
        assert_eq!(ListKind::from_name("educationList"), Some(ListKind::Education));
        assert_eq!(ListKind::from_name("projects"), Some(ListKind::Project));
        assert_eq!(ListKind::from_name("invalid"), None);
    }
}
