//! Templates compiled into the binary. Used when no remote or local template source is
//! configured, and as the catalog of last resort when the configured one cannot be read.

use crate::models::template::{TemplateCatalog, TemplateDescriptor};

/// Stylesheet installed when a template's own stylesheet cannot be fetched.
pub const FALLBACK_STYLESHEET: &str = r#"
.resume-name, .resume-title { color: var(--primary-color); font-weight: bold; }
.section-title { color: var(--primary-color); border-bottom: 2px solid var(--primary-color); padding-bottom: 5px; }
.resume-header-flex { display: flex; align-items: center; }
.empty-placeholder { color: #999; font-style: italic; }
"#;

/// Markup installed when a template's own markup cannot be fetched.
pub const PLACEHOLDER_MARKUP: &str = r#"<div class="resume-fallback"><h1 class="resume-title" data-bind="basic.name"></h1><div class="resume-content"></div></div>"#;

fn descriptor(id: &str, name: &str, description: &str, color: &str) -> TemplateDescriptor {
    TemplateDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        primary_color: color.to_string(),
        markup_ref: format!("/templates/{id}/template.html"),
        style_ref: format!("/templates/{id}/style.css"),
        thumbnail: None,
    }
}

pub fn catalog() -> TemplateCatalog {
    TemplateCatalog {
        templates: vec![
            descriptor("standard", "标准模板", "简洁大方的标准简历模板", "#2196F3"),
            descriptor("modern", "现代模板", "时尚现代的简历模板", "#4CAF50"),
            descriptor("classic", "经典模板", "传统经典的简历模板", "#9C27B0"),
            descriptor("creative", "创意模板", "富有创意的简历模板", "#FF9800"),
        ],
    }
}

pub fn markup(id: &str) -> Option<&'static str> {
    match id {
        "standard" | "classic" => Some(SINGLE_COLUMN_MARKUP),
        "modern" | "creative" => Some(TWO_COLUMN_MARKUP),
        _ => None,
    }
}

pub fn stylesheet(id: &str) -> Option<&'static str> {
    match id {
        "standard" => Some(STANDARD_CSS),
        "modern" => Some(MODERN_CSS),
        "classic" => Some(CLASSIC_CSS),
        "creative" => Some(CREATIVE_CSS),
        _ => None,
    }
}

const SINGLE_COLUMN_MARKUP: &str = r#"<div class="resume-container">
  <header class="resume-header-flex">
    <img class="resume-avatar" data-bind="basic.avatar" alt="avatar">
    <div class="resume-header-text">
      <h1 class="resume-name" data-bind="basic.name"></h1>
      <p class="resume-position" data-bind="intention.position"></p>
      <p class="resume-contact"><span data-bind="basic.phone"></span> <span data-bind="basic.email"></span> <span data-bind="basic.location"></span></p>
    </div>
  </header>
  <section class="resume-section">
    <h2 class="section-title">求职意向</h2>
    <p><span data-bind="intention.position"></span> <span data-bind="intention.city"></span> <span data-bind="intention.salary"></span> <span data-bind="intention.entryTime"></span></p>
  </section>
  <section class="resume-section">
    <h2 class="section-title">教育背景</h2>
    <div class="education-list" data-bind="education.map(item => `<div class='education-item'><div class='item-header'><h3>${item.school}</h3><span class='item-time'>${item.time}</span></div><p>${item.major} - ${item.degree}</p><p class='item-desc'>${item.description}</p></div>`)"></div>
  </section>
  <section class="resume-section">
    <h2 class="section-title">工作经历</h2>
    <div class="work-list" data-bind="work.map(item => `<div class='work-item'><div class='item-header'><h3>${item.company}</h3><span class='item-time'>${item.time}</span></div><p>${item.position} ${item.department}</p><p class='item-desc'>${item.description}</p></div>`)"></div>
  </section>
  <section class="resume-section">
    <h2 class="section-title">项目经历</h2>
    <div class="project-list" data-bind="project.map(item => `<div class='project-item'><div class='item-header'><h3>${item.name}</h3><span class='item-time'>${item.time}</span></div><p>${item.role}</p><p class='item-desc'>${item.description}</p></div>`)"></div>
  </section>
  <section class="resume-section">
    <h2 class="section-title">校园经历</h2>
    <div class="campus-list" data-bind="campus.map(item => `<div class='campus-item'><div class='item-header'><h3>${item.organization}</h3><span class='item-time'>${item.time}</span></div><p>${item.role}</p><p class='item-desc'>${item.description}</p></div>`)"></div>
  </section>
  <section class="resume-section">
    <h2 class="section-title">荣誉奖项</h2>
    <ul class="awards-list" data-bind="awards.map(item => `<li class='award-item'><span>${item.name}</span> <span class='item-time'>${item.date}</span></li>`)"></ul>
  </section>
  <section class="resume-section">
    <h2 class="section-title">专业技能</h2>
    <div class="skills-list" data-bind="skills.map(item => `<div class='skill-item'><span>${item.name}</span><div class='progress-bar'><div class='progress' style='width: ${item.level}%'></div></div></div>`)"></div>
  </section>
  <section class="resume-section">
    <h2 class="section-title">自我评价</h2>
    <p class="resume-summary" data-bind="summary"></p>
  </section>
</div>"#;

const TWO_COLUMN_MARKUP: &str = r#"<div class="resume-container two-column">
  <aside class="resume-sidebar">
    <img class="resume-avatar" data-bind="basic.avatar" alt="avatar">
    <h1 class="resume-name" data-bind="basic.name"></h1>
    <ul class="resume-facts">
      <li data-bind="basic.gender"></li>
      <li data-bind="basic.age"></li>
      <li data-bind="basic.educationLevel"></li>
      <li data-bind="basic.experienceYears"></li>
      <li data-bind="basic.phone"></li>
      <li data-bind="basic.email"></li>
    </ul>
    <h2 class="section-title">专业技能</h2>
    <div class="skills-list" data-bind="skillList.map(skill => `<div class='skill-item'><span>${skill.name}</span><div class='progress' style='width: ${skill.level}%'></div></div>`)"></div>
  </aside>
  <main class="resume-main">
    <section class="resume-section">
      <h2 class="section-title">教育背景</h2>
      <div class="education-list" data-bind="educationList.map(item => `<div class='education-item'><h3>${item.school}</h3><span class='item-time'>${item.time}</span><p>${item.major} - ${item.degree}</p></div>`)"></div>
    </section>
    <section class="resume-section">
      <h2 class="section-title">工作经历</h2>
      <div class="work-list" data-bind="workExperience.map(item => `<div class='work-item'><h3>${item.company}</h3><span class='item-time'>${item.time}</span><p>${item.position}</p><p class='item-desc'>${item.description}</p></div>`)"></div>
    </section>
    <section class="resume-section">
      <h2 class="section-title">项目经历</h2>
      <div class="project-list" data-bind="projects.map(item => `<div class='project-item'><h3>${item.name}</h3><span class='item-time'>${item.time}</span><p>${item.role}</p><p class='item-desc'>${item.description}</p></div>`)"></div>
    </section>
    <section class="resume-section">
      <h2 class="section-title">荣誉奖项</h2>
      <ul class="awards-list" data-bind="awards.map(item => `<li class='award-item'>${item.name}</li>`)"></ul>
    </section>
    <section class="resume-section">
      <h2 class="section-title">自我评价</h2>
      <p class="resume-summary" data-bind="summary"></p>
    </section>
  </main>
</div>"#;

const STANDARD_CSS: &str = r#"
:root { --section-gap: 16px; }
.resume-container { font-family: "Microsoft YaHei", sans-serif; color: #333; }
.resume-name { color: var(--primary-color); font-size: 28px; }
.resume-avatar { width: 96px; height: 96px; border-radius: 50%; margin-right: 20px; }
.section-title { color: var(--primary-color); border-bottom: 2px solid var(--primary-color); }
.resume-section { margin-bottom: var(--section-gap); }
.item-header { display: flex; justify-content: space-between; }
.progress { height: 6px; background: var(--primary-color); }
@media print { .resume-section { page-break-inside: avoid; } }
"#;

const MODERN_CSS: &str = r#"
body { background: #f5f5f5; }
.two-column { display: flex; }
.resume-sidebar { width: 32%; background: var(--primary-color); color: #fff; padding: 20px; }
.resume-main { flex: 1; padding: 20px; }
.resume-avatar { width: 120px; border-radius: 8px; }
.section-title { color: var(--primary-color); }
.resume-sidebar .section-title { color: #fff; }
.progress { height: 4px; background: #fff; }
"#;

const CLASSIC_CSS: &str = r#"
html { font-size: 14px; }
.resume-container { font-family: "SimSun", serif; }
.resume-header-flex { display: flex; border-bottom: 3px double var(--primary-color); }
.resume-name { letter-spacing: 4px; color: var(--primary-color); }
.section-title { font-variant: small-caps; color: var(--primary-color); }
.progress { height: 6px; background: var(--primary-color); }
"#;

const CREATIVE_CSS: &str = r#"
@keyframes slide-in { from { transform: translateX(-8px); opacity: 0; } to { transform: none; opacity: 1; } }
.two-column { display: flex; flex-direction: row-reverse; }
.resume-sidebar { width: 35%; border-left: 6px solid var(--primary-color); padding: 24px; }
.resume-main { flex: 1; padding: 24px; }
.resume-section { animation: slide-in 0.3s ease-out; }
.section-title { color: var(--primary-color); text-transform: uppercase; }
.progress { height: 8px; border-radius: 4px; background: var(--primary-color); }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{BindingExpression, BIND_ATTR};
    use crate::dom::Dom;

    #[test]
    fn test_catalog_has_distinct_colors() {
        let catalog = catalog();
        assert!(catalog.templates.len() >= 4);
        let mut colors: Vec<_> = catalog.templates.iter().map(|t| &t.primary_color).collect();
        colors.sort();
        colors.dedup();
        assert_eq!(colors.len(), catalog.templates.len());
    }

    #[test]
    fn test_every_template_has_markup_and_style() {
        for t in catalog().templates {
            assert!(markup(&t.id).is_some(), "{} has no markup", t.id);
            assert!(stylesheet(&t.id).is_some(), "{} has no stylesheet", t.id);
        }
    }

    #[test]
    fn test_bundled_bindings_parse() {
        for html in [SINGLE_COLUMN_MARKUP, TWO_COLUMN_MARKUP, PLACEHOLDER_MARKUP] {
            let mut dom = Dom::new();
            let root = dom.create_element("div");
            dom.set_inner_html(root, html);
            for node in dom.query_selector_all(root, "[data-bind]") {
                let raw = dom.attr(node, BIND_ATTR).unwrap();
                assert!(BindingExpression::parse(raw).is_ok(), "bad binding {raw}");
            }
        }
    }
}
