//! learnstyle-core: decision logic for learning-style assessments
//!
//! This crate provides the pieces that sit between the HTTP surface and the
//! assessment providers:
//!
//! - **Evidence gating** - [`evidence::is_low_signal`] and [`evidence::count_evidence`]
//! - **Follow-up questions** - the grade-band question bank in [`questions`]
//! - **Persistence** - the [`DocumentStore`] collaborator with in-memory and JSON-file
//!   implementations, plus typed student and history helpers
//! - **Session memory** - [`SessionStore`] keyed by parent and student
//! - **Token verification** - [`TokenVerifier`] with a JWKS-backed [`JwtValidator`]
//! - **Decision engine** - [`AssessmentEngine`], which ties all of the above together
//!
//! # Architecture
//!
//! ```text
//! request ──► AssessmentEngine ──► count_evidence ──┬─► needs_more_data envelope
//!                  │                                 │
//!                  ├── SessionStore (load/save)      └─► AssessmentProvider
//!                  │                                        │ RawOutput
//!                  └── DocumentStore (students,             ▼
//!                       assessments)                   normalize ──► final result
//! ```

pub mod auth;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod questions;
pub mod session;
pub mod store;

pub use auth::{AuthConfig, AuthError, DevTokenVerifier, JwtValidator, Principal, TokenVerifier};
pub use engine::{AssessmentEngine, AssessmentRequest, EngineConfig};
pub use error::{AssessmentError, StoreError};
pub use evidence::{MIN_EVIDENCE, count_evidence, is_low_signal};
pub use questions::{GradeBand, follow_up_questions};
pub use session::{DocumentSessionStore, MemorySessionStore, SessionKey, SessionStore};
pub use store::{Document, DocumentStore, JsonFileDocumentStore, MemoryDocumentStore};
