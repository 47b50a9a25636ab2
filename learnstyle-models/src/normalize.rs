//! Output normalization.
//!
//! Provider output is untrusted free-form data. [`normalize`] converts any
//! [`RawOutput`] into an [`AssessmentResult`] that satisfies the record's
//! invariants, substituting the safe default field by field.
//!
//! Accepted shapes:
//! - a JSON-encoded string
//! - a string with a JSON object embedded in prose (first `{` to last `}`)
//! - an already-parsed JSON object
//!
//! Anything else yields [`fallback_result`].

use chrono::Utc;
use serde_json::{Map, Value};

use crate::providers::RawOutput;
use crate::{AssessmentResult, LearningStyle};

/// Confidence used when the provider's value is missing or out of range.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Minimum number of next steps a result may carry.
pub const MIN_NEXT_STEPS: usize = 3;

/// Maximum number of next steps a result may carry.
pub const MAX_NEXT_STEPS: usize = 6;

const DEFAULT_EXPLANATION: &str = "We could not confidently determine a single learning style, so a blended approach is recommended.";

const DEFAULT_NEXT_STEPS: [&str; 3] = [
    "Mix visuals, discussion, and hands-on activities.",
    "Ask the student which format feels easiest today.",
    "Adjust study methods based on what keeps them engaged.",
];

/// The fixed safe-default result, stamped with `model` and the current time.
pub fn fallback_result(model: &str) -> AssessmentResult {
    AssessmentResult {
        learning_style: LearningStyle::default(),
        confidence: DEFAULT_CONFIDENCE,
        explanation: DEFAULT_EXPLANATION.to_string(),
        next_steps: DEFAULT_NEXT_STEPS.iter().map(|s| s.to_string()).collect(),
        model: model.to_string(),
        created_at: Utc::now(),
        decision: None,
        missing_evidence: None,
        questions: None,
        evidence_count: None,
    }
}

/// Normalize any provider output into a valid result.
pub fn normalize(raw: &RawOutput, model: &str) -> AssessmentResult {
    match raw {
        RawOutput::Stub(value) => normalize_value(value, model),
        RawOutput::Text(text) => normalize_text(text, model),
        RawOutput::Workflow(run) => match &run.report {
            Some(report) => normalize_value(report, model),
            None => fallback_result(model),
        },
        RawOutput::Empty => fallback_result(model),
    }
}

/// Normalize a JSON value: strings are parsed, objects are validated.
pub fn normalize_value(value: &Value, model: &str) -> AssessmentResult {
    match value {
        Value::String(text) => normalize_text(text, model),
        Value::Object(fields) => from_fields(fields, model),
        _ => fallback_result(model),
    }
}

/// Normalize free-form text that should contain a JSON object.
pub fn normalize_text(text: &str, model: &str) -> AssessmentResult {
    match parse_object(text) {
        Some(fields) => from_fields(&fields, model),
        None => fallback_result(model),
    }
}

/// Parse the text as a JSON object, falling back to the outermost braces.
fn parse_object(text: &str) -> Option<Map<String, Value>> {
    let trimmed = text.trim();

    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(trimmed) {
        return Some(fields);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(&trimmed[start..=end]) {
        Ok(Value::Object(fields)) => Some(fields),
        _ => None,
    }
}

fn from_fields(fields: &Map<String, Value>, model: &str) -> AssessmentResult {
    let mut result = fallback_result(model);

    if let Some(style) = fields
        .get("learningStyle")
        .and_then(Value::as_str)
        .and_then(LearningStyle::from_label)
    {
        result.learning_style = style;
    }

    if let Some(confidence) = fields.get("confidence").and_then(Value::as_f64)
        && (0.0..=1.0).contains(&confidence)
    {
        result.confidence = confidence;
    }

    if let Some(explanation) = fields.get("explanation").and_then(Value::as_str)
        && !explanation.trim().is_empty()
    {
        result.explanation = explanation.to_string();
    }

    if let Some(steps) = fields.get("nextSteps").and_then(string_list)
        && (MIN_NEXT_STEPS..=MAX_NEXT_STEPS).contains(&steps.len())
    {
        result.next_steps = steps;
    }

    result
}

/// A list in which every element is a string, or `None`.
fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}
