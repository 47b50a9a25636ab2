//! Decision engine policy

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::evidence::MIN_EVIDENCE;

/// Tunable thresholds for the decision engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Substantive user turns required before a final verdict
    pub min_evidence: usize,
    /// Upper bound on one provider round-trip
    pub provider_timeout_ms: u64,
    /// Confidence ceiling reported on `needs_more_data` envelopes
    pub needs_more_data_confidence_cap: f64,
    /// A completed student keeps its stored style when a new verdict is less
    /// confident than this
    pub keep_completed_below_confidence: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_evidence: MIN_EVIDENCE,
            provider_timeout_ms: 20_000,
            needs_more_data_confidence_cap: 0.4,
            keep_completed_below_confidence: 0.55,
        }
    }
}

impl EngineConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy() {
        let config = EngineConfig::default();
        assert_eq!(config.min_evidence, 4);
        assert_eq!(config.provider_timeout(), Duration::from_secs(20));
        assert_eq!(config.needs_more_data_confidence_cap, 0.4);
        assert_eq!(config.keep_completed_below_confidence, 0.55);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: EngineConfig = toml::from_str("min_evidence = 6").unwrap();
        assert_eq!(config.min_evidence, 6);
        assert_eq!(config.provider_timeout_ms, 20_000);
    }
}
