//! Offline provider used when no remote backend is configured.
//!
//! Picks a style from keywords in the transcript so the whole pipeline stays
//! exercisable without network access. Output is deterministic for a given
//! transcript.

use async_trait::async_trait;
use serde_json::json;

use super::{AssessmentContext, AssessmentProvider, ProviderOutput, RawOutput};
use crate::{LearningStyle, Message, Result};

/// Model identifier stamped on stub results.
pub const STUB_MODEL: &str = "stub";

const STUB_CONFIDENCE: f64 = 0.62;

const STUB_EXPLANATION: &str =
    "Based on the chat so far, this is a best-effort guess of how the student seems to learn.";

/// Keyword groups checked in order; the first group with a hit wins.
const STYLE_KEYWORDS: &[(LearningStyle, &[&str])] = &[
    (LearningStyle::Visual, &["visual", "see", "diagram"]),
    (LearningStyle::Auditory, &["listen", "auditory", "hear"]),
    (LearningStyle::ReadWrite, &["read", "write", "notes"]),
    (LearningStyle::Kinesthetic, &["hands", "kinesthetic", "build"]),
];

/// Offline, deterministic provider.
#[derive(Debug, Default, Clone)]
pub struct StubProvider;

impl StubProvider {
    pub fn new() -> Self {
        Self
    }
}

/// Pick a style from substrings of the lower-cased transcript.
fn pick_style(transcript: &str) -> LearningStyle {
    STYLE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| transcript.contains(k)))
        .map(|(style, _)| *style)
        .unwrap_or(LearningStyle::Multimodal)
}

/// Suggested next steps for a style. Always three entries.
pub fn next_steps_for_style(style: LearningStyle) -> Vec<String> {
    let steps: [&str; 3] = match style {
        LearningStyle::Visual => [
            "Use diagrams or pictures when introducing new ideas.",
            "Summarize lessons with charts or color-coded notes.",
            "Try short videos before homework sessions.",
        ],
        LearningStyle::Auditory => [
            "Discuss key ideas out loud before writing answers.",
            "Use audiobooks or read assignments together.",
            "Encourage short verbal summaries after each lesson.",
        ],
        LearningStyle::ReadWrite => [
            "Provide written checklists for study sessions.",
            "Encourage rewriting notes in their own words.",
            "Use flashcards with concise text prompts.",
        ],
        LearningStyle::Kinesthetic => [
            "Add hands-on activities or experiments when possible.",
            "Take short movement breaks between study blocks.",
            "Use manipulatives or real-world examples.",
        ],
        LearningStyle::Multimodal => [
            "Mix visuals, discussion, and hands-on practice.",
            "Rotate study formats to keep engagement high.",
            "Let the student choose the format that feels easiest.",
        ],
    };
    steps.iter().map(|s| s.to_string()).collect()
}

#[async_trait]
impl AssessmentProvider for StubProvider {
    fn name(&self) -> &str {
        STUB_MODEL
    }

    async fn generate_assessment(
        &self,
        messages: &[Message],
        _context: Option<&AssessmentContext>,
    ) -> Result<ProviderOutput> {
        let transcript = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let style = pick_style(&transcript);

        let raw = json!({
            "learningStyle": style.as_str(),
            "confidence": STUB_CONFIDENCE,
            "explanation": STUB_EXPLANATION,
            "nextSteps": next_steps_for_style(style),
            "model": STUB_MODEL,
        });

        Ok(ProviderOutput::new(RawOutput::Stub(raw), STUB_MODEL))
    }
}
