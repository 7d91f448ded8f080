//! Response recovery: raw oracle text → [`ExtractionResult`].
//!
//! This layer never fails. Markdown fences are stripped, the remainder is
//! parsed as a JSON object, and anything that does not parse degrades into a
//! mode-specific fallback with every expected key present.

use serde_json::{Map, Value};
use tracing::warn;

use crate::models::AnalysisMode;

/// Keys a code-analysis consumer reads.
pub const CODE_ANALYSIS_KEYS: &[&str] = &[
    "description",
    "features",
    "tech_stack",
    "questions_that_can_be_asked_in_interview",
    "summary",
    "alignment_score",
    "alignment_rationale",
];

/// Keys a résumé-analysis consumer reads.
pub const RESUME_ANALYSIS_KEYS: &[&str] = &[
    "description",
    "key_skills",
    "key_projects",
    "experience",
    "education",
    "highlights",
    "match_score",
    "match_rationale",
];

/// Human-readable note attached to a fallback result.
pub const FALLBACK_NOTE: &str =
    "The analysis response could not be parsed; all fields are empty.";

const FENCE: &str = "```";

/// Structured oracle answer, tagged with the mode that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    pub mode: AnalysisMode,
    pub fields: Map<String, Value>,
    /// True when this is a fallback substituted for an unparseable reply.
    pub degraded: bool,
}

impl ExtractionResult {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Remove a leading fence (with or without a language tag, on its own line
/// or directly followed by the payload) and a trailing fence, then trim.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix(FENCE) {
        text = strip_language_tag(rest);
    }

    let text = text.trim();
    text.strip_suffix(FENCE).unwrap_or(text).trim()
}

/// Drop a leading tag such as `json` or `JSON`. A tag starts with a letter,
/// so a payload beginning with `{` or `[` is left alone.
fn strip_language_tag(text: &str) -> &str {
    if !text.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return text;
    }
    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.')))
        .unwrap_or(text.len());
    &text[end..]
}

/// Parse an oracle reply, substituting the mode's fallback if it is not a
/// JSON object.
pub fn recover(raw: &str, mode: AnalysisMode) -> ExtractionResult {
    let stripped = strip_code_fences(raw);
    match serde_json::from_str::<Value>(stripped) {
        Ok(Value::Object(fields)) => ExtractionResult {
            mode,
            fields,
            degraded: false,
        },
        Ok(other) => {
            warn!(%mode, kind = json_kind(&other), "oracle reply is not a JSON object; using fallback");
            fallback_result(mode)
        }
        Err(e) => {
            warn!(%mode, error = %e, raw = %stripped, "failed to parse oracle reply; using fallback");
            fallback_result(mode)
        }
    }
}

/// Empty-but-complete result for `mode`: every key present, lists empty,
/// strings empty, scores zero, plus a `note` explaining the degradation.
pub fn fallback_result(mode: AnalysisMode) -> ExtractionResult {
    let keys = match mode {
        AnalysisMode::CodeAnalysis => CODE_ANALYSIS_KEYS,
        AnalysisMode::ResumeAnalysis => RESUME_ANALYSIS_KEYS,
    };

    let mut fields: Map<String, Value> = keys
        .iter()
        .map(|key| (key.to_string(), default_for(key)))
        .collect();
    fields.insert("note".to_string(), Value::String(FALLBACK_NOTE.to_string()));

    ExtractionResult {
        mode,
        fields,
        degraded: true,
    }
}

fn default_for(key: &str) -> Value {
    if key.ends_with("_score") {
        Value::from(0)
    } else if matches!(key, "description" | "summary") || key.ends_with("_rationale") {
        Value::String(String::new())
    } else {
        Value::Array(Vec::new())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
