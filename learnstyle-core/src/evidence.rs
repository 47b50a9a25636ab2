//! Evidence classification for conversation turns.
//!
//! A turn is *low-signal* when it carries nothing a learning-style verdict could
//! rest on: filler replies, one or two words, or very short text. Any mention of
//! concrete sensory or activity vocabulary overrides those rules.

use learnstyle_models::{Message, Role};

/// Substantive user turns required before a final verdict is attempted.
pub const MIN_EVIDENCE: usize = 4;

/// Utterances shorter than this (after normalization) are low-signal.
const MIN_CHARS: usize = 6;

/// Utterances with fewer words than this are low-signal.
const MIN_WORDS: usize = 3;

/// Filler replies, already in normalized form (lower-case, punctuation stripped).
const FILLER_REPLIES: &[&str] = &[
    "maybe",
    "idk",
    "i dont know",
    "dont know",
    "ok",
    "okay",
    "yes",
    "no",
    "k",
    "nah",
    "sure",
    "fine",
    "idc",
    "na",
];

/// Stems of sensory and activity words. A token matches a stem exactly or with
/// one of [`STEM_SUFFIXES`] appended.
const SENSORY_STEMS: &[&str] = &[
    "picture", "diagram", "chart", "video", "draw", "map", "color", "colour", "visual", "see",
    "look", "watch", "listen", "hear", "sound", "audio", "podcast", "music", "song", "talk",
    "discuss", "read", "book", "write", "writing", "note", "text", "hand", "build", "touch",
    "move", "experiment", "practice",
];

const STEM_SUFFIXES: &[&str] = &["s", "es", "ed", "ing", "er", "ers", "ings"];

/// Irregular forms the suffix rule does not reach.
const SENSORY_EXTRAS: &[&str] = &[
    "heard", "built", "handson", "drew", "drawn", "saw", "seen", "wrote", "moving", "practicing",
];

fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect::<String>()
        .trim()
        .to_string()
}

fn is_sensory_token(token: &str) -> bool {
    if SENSORY_EXTRAS.contains(&token) {
        return true;
    }
    SENSORY_STEMS.iter().any(|stem| match token.strip_prefix(stem) {
        Some("") => true,
        Some(rest) => STEM_SUFFIXES.contains(&rest),
        None => false,
    })
}

/// Whether `text` mentions concrete sensory or activity vocabulary.
pub fn has_sensory_language(text: &str) -> bool {
    normalize(text).split_whitespace().any(is_sensory_token)
}

/// Classify a single utterance.
///
/// Total over any input: empty text, punctuation-only text and filler replies are
/// low-signal; sensory vocabulary never is.
pub fn is_low_signal(text: &str) -> bool {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return true;
    }

    let words: Vec<&str> = normalized.split_whitespace().collect();
    if words.iter().any(|w| is_sensory_token(w)) {
        return false;
    }

    let collapsed = words.join(" ");
    if FILLER_REPLIES.contains(&collapsed.as_str()) {
        return true;
    }

    collapsed.chars().count() < MIN_CHARS || words.len() < MIN_WORDS
}

/// Number of `user` turns in `messages` that are not low-signal.
pub fn count_evidence(messages: &[Message]) -> usize {
    messages
        .iter()
        .filter(|m| m.role == Role::User && !is_low_signal(&m.content))
        .count()
}
