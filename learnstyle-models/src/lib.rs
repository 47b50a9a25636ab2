//! Assessment models for learnstyle.
//!
//! This crate provides:
//! - The canonical [`AssessmentResult`] record and the [`SessionMemory`] workflow state
//! - The output normalizer that turns untrusted provider output into a valid result
//! - The [`AssessmentProvider`](providers::AssessmentProvider) trait and its variants
//! - Credential resolution and the provider registry
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  ProviderRegistry                    │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  │
//! │  │    Stub     │  │   Gemini    │  │  Workflow   │  │
//! │  │  Provider   │  │  Provider   │  │  Provider   │  │
//! │  └─────────────┘  └─────────────┘  └─────────────┘  │
//! └─────────────────────────────────────────────────────┘
//!                          │ RawOutput
//!                          ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                normalize::normalize                  │
//! │              (always an AssessmentResult)            │
//! └─────────────────────────────────────────────────────┘
//! ```

mod error;
mod memory;
mod types;

pub mod auth;
pub mod normalize;
pub mod providers;
pub mod registry;

pub use error::{Error, Result};
pub use memory::{SessionMemory, SessionStatus};
pub use registry::ProviderRegistry;
pub use types::{AssessmentResult, Decision, LearningStyle, Message, Role};
