//! Typed response views over an [`ExtractionResult`].
//!
//! The oracle's mapping is returned untouched by the recovery layer; these
//! views are what a consumer sees once its own type declarations apply.
//! Construction is lenient: a wrongly typed field takes its default, and
//! list items that are objects are rendered as compact JSON strings.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::recovery::ExtractionResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoAnalysis {
    pub description: String,
    pub features: Vec<String>,
    pub tech_stack: Vec<String>,
    pub questions_that_can_be_asked_in_interview: Vec<String>,
    pub summary: String,
    pub alignment_score: u8,
    pub alignment_rationale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Default for RepoAnalysis {
    fn default() -> Self {
        Self {
            description: "No description available".to_string(),
            features: Vec::new(),
            tech_stack: Vec::new(),
            questions_that_can_be_asked_in_interview: Vec::new(),
            summary: "No summary available".to_string(),
            alignment_score: 0,
            alignment_rationale: String::new(),
            note: None,
        }
    }
}

impl From<&ExtractionResult> for RepoAnalysis {
    fn from(result: &ExtractionResult) -> Self {
        let f = &result.fields;
        let d = Self::default();
        Self {
            description: string_field(f, "description").unwrap_or(d.description),
            features: list_field(f, "features"),
            tech_stack: list_field(f, "tech_stack"),
            questions_that_can_be_asked_in_interview: list_field(
                f,
                "questions_that_can_be_asked_in_interview",
            ),
            summary: string_field(f, "summary").unwrap_or(d.summary),
            alignment_score: score_field(f, "alignment_score"),
            alignment_rationale: string_field(f, "alignment_rationale").unwrap_or_default(),
            note: string_field(f, "note"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeAnalysis {
    pub description: String,
    pub key_skills: Vec<String>,
    pub key_projects: Vec<String>,
    pub experience: Vec<String>,
    pub education: Vec<String>,
    pub highlights: Vec<String>,
    pub match_score: u8,
    pub match_rationale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Default for ResumeAnalysis {
    fn default() -> Self {
        Self {
            description: "No profile summary available".to_string(),
            key_skills: Vec::new(),
            key_projects: Vec::new(),
            experience: Vec::new(),
            education: Vec::new(),
            highlights: Vec::new(),
            match_score: 0,
            match_rationale: String::new(),
            note: None,
        }
    }
}

impl From<&ExtractionResult> for ResumeAnalysis {
    fn from(result: &ExtractionResult) -> Self {
        let f = &result.fields;
        Self {
            description: string_field(f, "description")
                .unwrap_or_else(|| Self::default().description),
            key_skills: list_field(f, "key_skills"),
            key_projects: list_field(f, "key_projects"),
            experience: list_field(f, "experience"),
            education: list_field(f, "education"),
            highlights: list_field(f, "highlights"),
            match_score: score_field(f, "match_score"),
            match_rationale: string_field(f, "match_rationale").unwrap_or_default(),
            note: string_field(f, "note"),
        }
    }
}

/// Non-empty string value of `key`, if any.
fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn list_field(fields: &Map<String, Value>, key: &str) -> Vec<String> {
    match fields.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(render_item).collect(),
        _ => Vec::new(),
    }
}

fn render_item(item: &Value) -> Option<String> {
    match item {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Score clamped to 0..=100; strings like `"85"` are accepted.
fn score_field(fields: &Map<String, Value>, key: &str) -> u8 {
    let raw = match fields.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    };
    raw.filter(|v| v.is_finite())
        .map(|v| v.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisMode;
    use crate::recovery::{fallback_result, recover, FALLBACK_NOTE};

    #[test]
    fn missing_fields_take_schema_defaults() {
        let result = recover("{}", AnalysisMode::CodeAnalysis);
        assert_eq!(RepoAnalysis::from(&result), RepoAnalysis::default());
    }

    #[test]
    fn object_items_are_rendered_as_json() {
        let result = recover(
            r#"{"key_projects": [{"name": "Shop", "stack": "React"}, "CLI tool", null]}"#,
            AnalysisMode::ResumeAnalysis,
        );
        let view = ResumeAnalysis::from(&result);
        assert_eq!(
            view.key_projects,
            vec![
                r#"{"name":"Shop","stack":"React"}"#.to_string(),
                "CLI tool".to_string()
            ]
        );
    }

    #[test]
    fn wrong_types_fall_back_to_defaults() {
        let result = recover(
            r#"{"description": 42, "features": "login", "alignment_score": "87%"}"#,
            AnalysisMode::CodeAnalysis,
        );
        let view = RepoAnalysis::from(&result);
        assert_eq!(view.description, "No description available");
        assert!(view.features.is_empty());
        assert_eq!(view.alignment_score, 87);
    }

    #[test]
    fn scores_are_clamped() {
        let result = recover(r#"{"match_score": 140.6}"#, AnalysisMode::ResumeAnalysis);
        assert_eq!(ResumeAnalysis::from(&result).match_score, 100);
        let result = recover(r#"{"match_score": -3}"#, AnalysisMode::ResumeAnalysis);
        assert_eq!(ResumeAnalysis::from(&result).match_score, 0);
    }

    #[test]
    fn fallback_note_is_carried() {
        let view = ResumeAnalysis::from(&fallback_result(AnalysisMode::ResumeAnalysis));
        assert_eq!(view.note.as_deref(), Some(FALLBACK_NOTE));
        assert!(view.key_skills.is_empty());
    }
}
