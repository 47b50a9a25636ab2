//! Core types shared by providers, the normalizer and the decision engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the five learning styles a result may carry.
///
/// Provider output is never trusted as-is: anything that is not one of these
/// exact labels is replaced during normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LearningStyle {
    Visual,
    Auditory,
    #[serde(rename = "Read/Write")]
    ReadWrite,
    Kinesthetic,
    #[default]
    Multimodal,
}

impl LearningStyle {
    /// All styles in canonical order.
    pub const ALL: [LearningStyle; 5] = [
        LearningStyle::Visual,
        LearningStyle::Auditory,
        LearningStyle::ReadWrite,
        LearningStyle::Kinesthetic,
        LearningStyle::Multimodal,
    ];

    /// The wire label (e.g. `"Read/Write"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningStyle::Visual => "Visual",
            LearningStyle::Auditory => "Auditory",
            LearningStyle::ReadWrite => "Read/Write",
            LearningStyle::Kinesthetic => "Kinesthetic",
            LearningStyle::Multimodal => "Multimodal",
        }
    }

    /// Parse an exact wire label. Case and spacing must match.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|style| style.as_str() == label)
    }

    /// Parse a label written by another client: case, spacing and the
    /// `Read/Write` separator are ignored.
    pub fn from_loose_label(label: &str) -> Option<Self> {
        let key = loose_key(label);
        Self::ALL
            .into_iter()
            .find(|style| loose_key(style.as_str()) == key)
    }
}

fn loose_key(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

impl fmt::Display for LearningStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message setting context.
    System,
    /// Student or parent message.
    User,
    /// Assistant message.
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A message in a conversation, in conversation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender.
    pub role: Role,
    /// Text content; must be non-empty.
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Whether a result is committed or more conversation is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Final,
    NeedsMoreData,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Final => "final",
            Decision::NeedsMoreData => "needs_more_data",
        }
    }
}

/// The canonical assessment output.
///
/// Invariants upheld by every constructor in this crate:
/// - `confidence` is within `[0, 1]`
/// - `next_steps` has between 3 and 6 entries
/// - `learning_style` is one of the enumerated styles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub learning_style: LearningStyle,
    pub confidence: f64,
    pub explanation: String,
    pub next_steps: Vec<String>,
    /// Identifier of the backend that produced this result.
    pub model: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_evidence: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_count: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learning_style_serializes_read_write_with_slash() {
        let json = serde_json::to_string(&LearningStyle::ReadWrite).unwrap();
        assert_eq!(json, "\"Read/Write\"");

        let parsed: LearningStyle = serde_json::from_str("\"Read/Write\"").unwrap();
        assert_eq!(parsed, LearningStyle::ReadWrite);
    }

    #[test]
    fn learning_style_from_label_is_exact() {
        assert_eq!(LearningStyle::from_label("Visual"), Some(LearningStyle::Visual));
        assert_eq!(LearningStyle::from_label("visual"), None);
        assert_eq!(LearningStyle::from_label("Telepathic"), None);
    }

    #[test]
    fn learning_style_from_loose_label_ignores_case_and_separators() {
        assert_eq!(LearningStyle::from_loose_label("visual"), Some(LearningStyle::Visual));
        assert_eq!(
            LearningStyle::from_loose_label(" read / write "),
            Some(LearningStyle::ReadWrite)
        );
        assert_eq!(
            LearningStyle::from_loose_label("KINESTHETIC"),
            Some(LearningStyle::Kinesthetic)
        );
        assert_eq!(LearningStyle::from_loose_label(""), None);
        assert_eq!(LearningStyle::from_loose_label("Telepathic"), None);
    }

    #[test]
    fn role_rejects_unknown_values() {
        assert!(serde_json::from_str::<Role>("\"tool\"").is_err());
        assert_eq!(serde_json::from_str::<Role>("\"user\"").unwrap(), Role::User);
    }

    #[test]
    fn result_serializes_camel_case_and_skips_absent_fields() {
        let result = AssessmentResult {
            learning_style: LearningStyle::Visual,
            confidence: 0.8,
            explanation: "Pictures help.".to_string(),
            next_steps: vec!["a".into(), "b".into(), "c".into()],
            model: "stub".to_string(),
            created_at: Utc::now(),
            decision: Some(Decision::Final),
            missing_evidence: None,
            questions: None,
            evidence_count: Some(4),
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["learningStyle"], "Visual");
        assert_eq!(value["nextSteps"].as_array().unwrap().len(), 3);
        assert_eq!(value["decision"], "final");
        assert_eq!(value["evidenceCount"], 4);
        assert!(value.get("questions").is_none());
        assert!(value["createdAt"].is_string());
    }
}
