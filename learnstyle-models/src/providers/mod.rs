//! Assessment provider trait and implementations.
//!
//! The [`AssessmentProvider`] trait is the uniform interface over every backend
//! that can produce a candidate assessment:
//!
//! - [`StubProvider`] - offline, deterministic; used when nothing is configured
//! - [`GeminiProvider`] - managed LLM `generateContent` endpoint
//! - [`WorkflowProvider`] - workflow-run backend that also exchanges session memory
//!
//! Providers return provider-native [`RawOutput`]; callers pass it through
//! [`crate::normalize::normalize`].
//!
//! # Example
//!
//! ```ignore
//! use learnstyle_models::providers::{AssessmentProvider, StubProvider};
//! use learnstyle_models::{normalize, Message};
//!
//! async fn assess(provider: &dyn AssessmentProvider) -> learnstyle_models::Result<()> {
//!     let messages = vec![Message::user("I like diagrams and charts")];
//!     let output = provider.generate_assessment(&messages, None).await?;
//!     let result = normalize::normalize(&output.raw, &output.model);
//!     println!("{}", result.learning_style);
//!     Ok(())
//! }
//! ```

mod config;
mod gemini;
mod stub;
mod types;
mod workflow;

use async_trait::async_trait;

pub use config::{GeminiSection, ProviderConfig, ProviderKind, WorkflowSection};
pub use gemini::{GeminiConfig, GeminiProvider};
pub use stub::{StubProvider, next_steps_for_style};
pub use types::*;
pub use workflow::{WorkflowConfig, WorkflowProvider};

use crate::{Message, Result};

/// Trait for assessment backends.
///
/// Implementations must carry their own request timeout and return an error for
/// any failed, timed out or non-success call. They never retry silently into a
/// guessed result; degradation to the safe default is the caller's decision.
#[async_trait]
pub trait AssessmentProvider: Send + Sync {
    /// Returns the provider name (e.g., "stub", "gemini", "workflow").
    fn name(&self) -> &str;

    /// Produce a candidate assessment for the conversation.
    ///
    /// # Arguments
    ///
    /// * `messages` - The conversation in order
    /// * `context` - Identity and session memory, when the caller has them
    async fn generate_assessment(
        &self,
        messages: &[Message],
        context: Option<&AssessmentContext>,
    ) -> Result<ProviderOutput>;

    /// Whether this provider exchanges session memory with its backend.
    fn uses_session_memory(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::normalize::normalize;

    /// A provider that always rejects.
    struct RejectingProvider;

    #[async_trait]
    impl AssessmentProvider for RejectingProvider {
        fn name(&self) -> &str {
            "rejecting"
        }

        async fn generate_assessment(
            &self,
            _messages: &[Message],
            _context: Option<&AssessmentContext>,
        ) -> Result<ProviderOutput> {
            Err(Error::Request("connection reset".to_string()))
        }
    }

    /// A provider that echoes a fixed JSON payload as text.
    struct EchoProvider;

    #[async_trait]
    impl AssessmentProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate_assessment(
            &self,
            messages: &[Message],
            _context: Option<&AssessmentContext>,
        ) -> Result<ProviderOutput> {
            let text = format!(
                r#"{{"learningStyle":"Auditory","confidence":0.7,"explanation":"{}","nextSteps":["a","b","c"]}}"#,
                messages.len()
            );
            Ok(ProviderOutput::new(RawOutput::Text(text), "echo-1"))
        }
    }

    #[tokio::test]
    async fn trait_objects_are_usable_through_dyn() {
        let provider: Box<dyn AssessmentProvider> = Box::new(EchoProvider);
        let output = provider
            .generate_assessment(&[Message::user("hi"), Message::assistant("hello")], None)
            .await
            .unwrap();
        let result = normalize(&output.raw, &output.model);
        assert_eq!(result.explanation, "2");
        assert_eq!(result.model, "echo-1");
    }

    #[tokio::test]
    async fn rejecting_provider_returns_error() {
        let provider = RejectingProvider;
        let result = provider.generate_assessment(&[], None).await;
        assert!(matches!(result, Err(Error::Request(_))));
    }

    #[test]
    fn default_uses_session_memory_is_false() {
        assert!(!EchoProvider.uses_session_memory());
    }
}
