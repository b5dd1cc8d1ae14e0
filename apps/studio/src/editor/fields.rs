use serde::Serialize;

use crate::editor::Section;
use crate::models::resume::ListKind;

use InputKind::{Date, Email, Tel, Text, Textarea};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    Textarea,
    Date,
    Email,
    Tel,
    Select,
}

/// One input of the edit form for a section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: InputKind,
    #[serde(skip_serializing_if = "no_options")]
    pub options: &'static [&'static str],
}

fn no_options(options: &&'static [&'static str]) -> bool {
    options.is_empty()
}

const GENDERS: &[&str] = &["男", "女"];
const POLITICAL_STATUSES: &[&str] = &["中共党员", "共青团员", "群众"];

const fn field(name: &'static str, label: &'static str, kind: InputKind) -> FormField {
    FormField {
        name,
        label,
        kind,
        options: &[],
    }
}

const fn select(name: &'static str, label: &'static str, options: &'static [&'static str]) -> FormField {
    FormField {
        name,
        label,
        kind: InputKind::Select,
        options,
    }
}

const BASIC: &[FormField] = &[
    field("name", "姓名", Text),
    field("avatar", "头像", Text),
    field("position", "职位", Text),
    select("gender", "性别", GENDERS),
    field("age", "年龄", Text),
    select("politicalStatus", "政治面貌", POLITICAL_STATUSES),
    field("educationLevel", "学历", Text),
    field("experienceYears", "工作经验", Text),
    field("jobStatus", "求职状态", Text),
    field("phone", "手机号码", Tel),
    field("email", "邮箱", Email),
    field("location", "所在地", Text),
];

const INTENTION: &[FormField] = &[
    field("position", "期望职位", Text),
    field("city", "期望城市", Text),
    field("salary", "期望薪资", Text),
    field("entryTime", "到岗时间", Text),
];

const SUMMARY: &[FormField] = &[field("summary", "自我评价", Textarea)];

const EDUCATION: &[FormField] = &[
    field("school", "学校", Text),
    field("major", "专业", Text),
    field("degree", "学历", Text),
    field("startDate", "开始时间", Date),
    field("endDate", "结束时间", Date),
    field("gpa", "GPA", Text),
    field("rank", "排名", Text),
    field("description", "描述", Textarea),
];

const WORK: &[FormField] = &[
    field("company", "公司", Text),
    field("department", "部门", Text),
    field("position", "职位", Text),
    field("startDate", "开始时间", Date),
    field("endDate", "结束时间", Date),
    field("description", "描述", Textarea),
];

const PROJECT: &[FormField] = &[
    field("name", "项目名称", Text),
    field("role", "担任角色", Text),
    field("link", "项目链接", Text),
    field("startDate", "开始时间", Date),
    field("endDate", "结束时间", Date),
    field("description", "描述", Textarea),
];

const CAMPUS: &[FormField] = &[
    field("organization", "组织名称", Text),
    field("role", "职位", Text),
    field("type", "类型", Text),
    field("startDate", "开始时间", Date),
    field("endDate", "结束时间", Date),
    field("description", "描述", Textarea),
];

const AWARDS: &[FormField] = &[
    field("name", "奖项名称", Text),
    field("date", "获奖时间", Date),
    field("description", "描述", Textarea),
];

const SKILLS: &[FormField] = &[
    field("name", "技能名称", Text),
    field("level", "掌握程度", Text),
    field("detail", "详细说明", Textarea),
];

/// Ordered form fields for a section key (canonical or alias).
pub fn form_fields(section: &str) -> Option<&'static [FormField]> {
    let fields = match Section::from_key(section)? {
        Section::Basic => BASIC,
        Section::Intention => INTENTION,
        Section::Summary => SUMMARY,
        Section::List(ListKind::Education) => EDUCATION,
        Section::List(ListKind::Work) => WORK,
        Section::List(ListKind::Project) => PROJECT,
        Section::List(ListKind::Campus) => CAMPUS,
        Section::List(ListKind::Awards) => AWARDS,
        Section::List(ListKind::Skills) => SKILLS,
    };
    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::empty_item;
    use crate::models::resume::ResumeDocument;

    #[test]
    fn test_form_fields_match_document_keys() {
        let doc = ResumeDocument::default().to_value();
        for (section, record) in [("basic", &doc["basic"]), ("intention", &doc["intention"])] {
            for f in form_fields(section).unwrap() {
                assert!(record.get(f.name).is_some(), "{section}.{} not in document", f.name);
            }
        }
        for kind in ListKind::ALL {
            let item = empty_item(kind);
            for f in form_fields(kind.canonical()).unwrap() {
                assert!(item.get(f.name).is_some(), "{}.{} not in item", kind.canonical(), f.name);
            }
        }
    }

    #[test]
    fn test_form_fields_kinds() {
        let basic = form_fields("basic").unwrap();
        let gender = basic.iter().find(|f| f.name == "gender").unwrap();
        assert_eq!(gender.kind, InputKind::Select);
        assert_eq!(gender.options, GENDERS);
        assert_eq!(basic.iter().find(|f| f.name == "phone").unwrap().kind, InputKind::Tel);
        assert!(form_fields("educationList").unwrap().iter().any(|f| f.kind == InputKind::Date));
        assert!(form_fields("template").is_none());
    }

    #[test]
    fn test_form_field_serialization_skips_empty_options() {
        let json = serde_json::to_value(&form_fields("intention").unwrap()[0]).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "position", "label": "期望职位", "kind": "text" }));
    }
}
