//! Follow-up question selection for conversations that need more evidence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of follow-up questions returned per turn.
pub const FOLLOW_UP_COUNT: usize = 3;

/// Questions used when no grade band is known or its prompts are exhausted.
pub const FIXED_FOLLOW_UPS: [&str; FOLLOW_UP_COUNT] = [
    "When learning something new, do you prefer pictures/videos, listening, reading, or hands-on practice?",
    "Tell me about a time school felt easy. What were you doing?",
    "Do you remember better after writing notes, talking about it, or building/trying it?",
];

/// School grade band of the student being assessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradeBand {
    #[serde(rename = "K-2")]
    K2,
    #[serde(rename = "3-5")]
    G3To5,
    #[serde(rename = "6-8")]
    G6To8,
    #[serde(rename = "9-12")]
    G9To12,
}

impl GradeBand {
    pub const ALL: [GradeBand; 4] = [
        GradeBand::K2,
        GradeBand::G3To5,
        GradeBand::G6To8,
        GradeBand::G9To12,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GradeBand::K2 => "K-2",
            GradeBand::G3To5 => "3-5",
            GradeBand::G6To8 => "6-8",
            GradeBand::G9To12 => "9-12",
        }
    }

    /// Prompts written for this band, in presentation order.
    pub fn prompts(&self) -> &'static [&'static str] {
        match self {
            GradeBand::K2 => &[
                "You're learning a new game. What helps most?",
                "You want to remember a short story.",
                "You're learning about animals.",
                "You need to find your way to a room.",
                "You're learning a new song.",
            ],
            GradeBand::G3To5 => &[
                "You're learning about the solar system.",
                "You need to remember a poem.",
                "You're learning a new sport skill.",
                "You're learning how to solve a puzzle.",
                "You're studying for a quiz.",
            ],
            GradeBand::G6To8 => &[
                "You're preparing for a test.",
                "You're learning a science concept.",
                "You're learning how something works.",
                "You're memorizing key facts.",
                "You want to learn a new skill (coding, art, music).",
            ],
            GradeBand::G9To12 => &[
                "You need to learn a new math concept.",
                "You're learning a historical event.",
                "You're preparing for a presentation.",
                "You're learning a complex process in science.",
                "You're studying for finals.",
            ],
        }
    }
}

impl fmt::Display for GradeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GradeBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GradeBand::ALL
            .into_iter()
            .find(|band| band.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown grade band '{s}' (expected K-2, 3-5, 6-8 or 9-12)"))
    }
}

/// Pick the next follow-up questions.
///
/// With a grade band, up to [`FOLLOW_UP_COUNT`] of its prompts that are not in
/// `asked` are returned. Without one, or once the band is exhausted, the fixed
/// questions are returned.
pub fn follow_up_questions(band: Option<GradeBand>, asked: &[String]) -> Vec<String> {
    let unasked: Vec<String> = band
        .map(|band| band.prompts())
        .unwrap_or_default()
        .iter()
        .filter(|prompt| !asked.iter().any(|a| a == *prompt))
        .take(FOLLOW_UP_COUNT)
        .map(|prompt| prompt.to_string())
        .collect();

    if unasked.is_empty() {
        FIXED_FOLLOW_UPS.iter().map(|q| q.to_string()).collect()
    } else {
        unasked
    }
}
