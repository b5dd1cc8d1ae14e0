use serde_json::Value;

use crate::document::{validate, ValidationWarning};
use crate::models::resume::ResumeDocument;

/// Overlays the non-empty values of an optimized copy onto `doc`.
///
/// Records merge recursively; lists merge by index and never grow, so an optimizer that
/// invents extra items cannot add them. Template state is presentation, not content, and is
/// left alone. The result is re-validated.
pub fn merge_optimized(
    doc: &ResumeDocument,
    optimized: &Value,
) -> (ResumeDocument, Vec<ValidationWarning>) {
    let mut base = doc.to_value();
    if let (Value::Object(base), Value::Object(overlay)) = (&mut base, optimized) {
        for (key, value) in overlay {
            if key == "template" {
                continue;
            }
            if let Some(slot) = base.get_mut(key) {
                overlay_value(slot, value);
            }
        }
    }
    validate(base)
}

fn overlay_value(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                if let Some(slot) = base.get_mut(key) {
                    overlay_value(slot, value);
                }
            }
        }
        (Value::Array(base), Value::Array(overlay)) => {
            for (slot, value) in base.iter_mut().zip(overlay) {
                overlay_value(slot, value);
            }
        }
        (Value::String(slot), Value::String(s)) if !s.trim().is_empty() => *slot = s.clone(),
        (Value::String(slot), Value::Number(n)) => *slot = n.to_string(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ResumeDocument {
        validate(json!({
            "basic": { "name": "张三", "position": "工程师" },
            "summary": "原始简介",
            "work": [
                { "company": "A", "description": "做了一些事" },
                { "company": "B", "description": "也做了事" }
            ],
            "template": { "currentId": "modern" }
        }))
        .0
    }

    #[test]
    fn test_merge_overlays_non_empty_values() {
        let (merged, _) = merge_optimized(
            &sample(),
            &json!({ "summary": "优化后的简介", "basic": { "name": "", "position": "高级工程师" } }),
        );
        assert_eq!(merged.summary, "优化后的简介");
        assert_eq!(merged.basic.name, "张三");
        assert_eq!(merged.basic.position, "高级工程师");
    }

    #[test]
    fn test_merge_lists_by_index_without_growing() {
        let (merged, _) = merge_optimized(
            &sample(),
            &json!({ "work": [
                { "description": "主导了核心模块" },
                {},
                { "company": "invented" }
            ]}),
        );
        assert_eq!(merged.work.len(), 2);
        assert_eq!(merged.work[0].company, "A");
        assert_eq!(merged.work[0].description, "主导了核心模块");
        assert_eq!(merged.work[1].description, "也做了事");
    }

    #[test]
    fn test_merge_ignores_template_and_unknown_keys() {
        let (merged, _) = merge_optimized(
            &sample(),
            &json!({ "template": { "currentId": "classic" }, "hobbies": "x", "basic": { "qq": "1" } }),
        );
        assert_eq!(merged.template.current_id, "modern");
        assert_eq!(merged, sample());
    }

    #[test]
    fn test_merge_non_object_is_noop() {
        let (merged, _) = merge_optimized(&sample(), &json!("just text"));
        assert_eq!(merged, sample());
    }
}
