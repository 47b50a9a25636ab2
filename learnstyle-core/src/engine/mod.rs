//! Assessment decision engine.
//!
//! Per turn the engine validates and authorizes the request, counts evidence and
//! then either asks for more conversation or obtains a verdict from the provider.
//!
//! Session state moves `active → needs_more_data → complete`. `complete` is
//! sticky: once the student record or the session memory says so, low-evidence
//! turns are answered without any write.
//!
//! Concurrent turns for the same parent and student are not serialized here;
//! the last write to the student record and session memory wins.

mod config;
mod request;

use std::sync::Arc;

use chrono::Utc;
use learnstyle_models::normalize::{fallback_result, normalize};
use learnstyle_models::providers::{AssessmentContext, AssessmentProvider};
use learnstyle_models::{
    AssessmentResult, Decision, LearningStyle, Message, SessionMemory, SessionStatus,
};
use tracing::{debug, info, warn};

use crate::evidence::count_evidence;
use crate::questions::follow_up_questions;
use crate::session::{SessionKey, SessionStore};
use crate::store::DocumentStore;
use crate::store::students::{self, HistoryRecord, StudentRecord};
use crate::AssessmentError;

pub use config::EngineConfig;
pub use request::AssessmentRequest;

/// Model id stamped on results substituted for a failed provider call.
pub const UNAVAILABLE_MODEL: &str = "unavailable";

/// Model id stamped on `needs_more_data` envelopes.
pub const EVIDENCE_GATE_MODEL: &str = "evidence-gate";

/// Normalized provider answer plus what the backend handed back with it.
struct Verdict {
    result: AssessmentResult,
    memory: Option<SessionMemory>,
    trace_id: Option<String>,
}

impl Verdict {
    fn unavailable() -> Self {
        Self {
            result: fallback_result(UNAVAILABLE_MODEL),
            memory: None,
            trace_id: None,
        }
    }
}

/// Orchestrates one assessment turn.
pub struct AssessmentEngine {
    config: EngineConfig,
    provider: Arc<dyn AssessmentProvider>,
    documents: Arc<dyn DocumentStore>,
    sessions: Arc<dyn SessionStore>,
}

impl AssessmentEngine {
    pub fn new(
        config: EngineConfig,
        provider: Arc<dyn AssessmentProvider>,
        documents: Arc<dyn DocumentStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            provider,
            documents,
            sessions,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Handle one turn on behalf of the verified user `principal_uid`.
    ///
    /// # Errors
    ///
    /// Only bad input, an identity or ownership mismatch, a missing student or a
    /// failed student-record write are surfaced. Provider failures degrade to
    /// the safe default result.
    pub async fn assess(
        &self,
        principal_uid: &str,
        request: &AssessmentRequest,
    ) -> Result<AssessmentResult, AssessmentError> {
        request.validate()?;

        if principal_uid != request.parent_id {
            return Err(AssessmentError::Forbidden(
                "parentId does not match the authenticated user".into(),
            ));
        }

        let student = students::load_student(self.documents.as_ref(), &request.student_id)
            .await?
            .ok_or_else(|| AssessmentError::StudentNotFound(request.student_id.clone()))?;

        if !student.belongs_to(&request.parent_id) {
            return Err(AssessmentError::Forbidden(
                "student belongs to a different parent".into(),
            ));
        }

        let key = SessionKey::new(&request.parent_id, &request.student_id);
        let memory = self.sessions.load_or_default(&key).await;
        let evidence_count = count_evidence(&request.messages);

        if evidence_count < self.config.min_evidence {
            self.gather_more(request, &student, &key, memory, evidence_count)
                .await
        } else {
            self.finalize(request, &student, &key, memory, evidence_count)
                .await
        }
    }

    async fn gather_more(
        &self,
        request: &AssessmentRequest,
        student: &StudentRecord,
        key: &SessionKey,
        mut memory: SessionMemory,
        evidence_count: usize,
    ) -> Result<AssessmentResult, AssessmentError> {
        let questions = follow_up_questions(request.grade_band, &memory.question_history);

        if student.is_completed() || memory.is_complete() {
            debug!(
                parent_id = %request.parent_id,
                student_id = %request.student_id,
                evidence_count,
                "assessment already complete, reporting without writes"
            );
            let stored = student
                .stored_style()
                .or_else(|| memory.final_report.as_ref().map(|r| r.learning_style));
            return Ok(self.needs_more_data(evidence_count, questions, stored));
        }

        students::mark_in_progress(self.documents.as_ref(), &request.student_id, Utc::now())
            .await?;

        memory.question_history.extend(questions.iter().cloned());
        memory.session_status = SessionStatus::NeedsMoreData;
        self.save_memory(key, &memory).await;

        debug!(
            parent_id = %request.parent_id,
            student_id = %request.student_id,
            evidence_count,
            decision = Decision::NeedsMoreData.as_str(),
            "more evidence needed"
        );

        Ok(self.needs_more_data(evidence_count, questions, None))
    }

    async fn finalize(
        &self,
        request: &AssessmentRequest,
        student: &StudentRecord,
        key: &SessionKey,
        mut memory: SessionMemory,
        evidence_count: usize,
    ) -> Result<AssessmentResult, AssessmentError> {
        let mut context = AssessmentContext::new(&request.parent_id, &request.student_id);
        if self.provider.uses_session_memory() {
            context = context.with_memory(memory.clone());
        }

        let Verdict {
            mut result,
            memory: returned_memory,
            trace_id,
        } = self.run_provider(&request.messages, &context).await;
        if let Some(returned) = returned_memory {
            memory = returned;
        }
        result.decision = Some(Decision::Final);
        result.evidence_count = Some(evidence_count);

        let keep_stored = student.stored_style().filter(|_| {
            student.is_completed() && result.confidence < self.config.keep_completed_below_confidence
        });
        match keep_stored {
            Some(style) => {
                info!(
                    student_id = %request.student_id,
                    stored = %style,
                    confidence = result.confidence,
                    "keeping stored learning style over low-confidence verdict"
                );
                result.learning_style = style;
            }
            None => {
                students::mark_completed(
                    self.documents.as_ref(),
                    &request.student_id,
                    result.learning_style,
                    Utc::now(),
                )
                .await?;
            }
        }

        memory.session_status = SessionStatus::Complete;
        memory.focus_modality = Some(result.learning_style.as_str().to_string());
        memory.final_report = Some(result.clone());
        memory.response_scores.push(result.confidence);
        self.save_memory(key, &memory).await;

        let record = HistoryRecord {
            parent_id: &request.parent_id,
            student_id: &request.student_id,
            messages: &request.messages,
            result: &result,
            created_at: Utc::now(),
            model: &result.model,
            decision: Decision::Final,
            evidence_count,
        };
        if let Err(e) = students::append_history(self.documents.as_ref(), &record).await {
            warn!(student_id = %request.student_id, error = %e, "failed to append assessment history");
        }

        info!(
            parent_id = %request.parent_id,
            student_id = %request.student_id,
            evidence_count,
            model = %result.model,
            learning_style = %result.learning_style,
            decision = Decision::Final.as_str(),
            trace_id = trace_id.as_deref(),
            "assessment finalized"
        );

        Ok(result)
    }

    /// Call the provider under the configured timeout. Any failure yields the
    /// safe default stamped [`UNAVAILABLE_MODEL`].
    async fn run_provider(
        &self,
        messages: &[Message],
        context: &AssessmentContext,
    ) -> Verdict {
        let timeout = self.config.provider_timeout();
        let call = self.provider.generate_assessment(messages, Some(context));

        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(output)) => {
                let trace_id = output.trace_id().map(str::to_string);
                debug!(
                    provider = self.provider.name(),
                    model = %output.model,
                    trace_id = trace_id.as_deref(),
                    "provider returned"
                );
                let memory = output
                    .memory()
                    .filter(|_| self.provider.uses_session_memory())
                    .cloned();
                Verdict {
                    result: normalize(&output.raw, &output.model),
                    memory,
                    trace_id,
                }
            }
            Ok(Err(e)) => {
                warn!(provider = self.provider.name(), error = %e, "provider failed, using fallback result");
                Verdict::unavailable()
            }
            Err(_) => {
                warn!(
                    provider = self.provider.name(),
                    timeout_ms = timeout.as_millis() as u64,
                    "provider timed out, using fallback result"
                );
                Verdict::unavailable()
            }
        }
    }

    async fn save_memory(&self, key: &SessionKey, memory: &SessionMemory) {
        if let Err(e) = self.sessions.save(key, memory).await {
            warn!(session = %key, error = %e, "failed to save session memory");
        }
    }

    fn needs_more_data(
        &self,
        evidence_count: usize,
        questions: Vec<String>,
        stored: Option<LearningStyle>,
    ) -> AssessmentResult {
        let mut result = fallback_result(EVIDENCE_GATE_MODEL);
        result.confidence = result
            .confidence
            .min(self.config.needs_more_data_confidence_cap);
        if let Some(style) = stored {
            result.learning_style = style;
        }
        result.decision = Some(Decision::NeedsMoreData);
        result.evidence_count = Some(evidence_count);
        result.missing_evidence = Some(vec![format!(
            "Need at least {} detailed responses.",
            self.config.min_evidence
        )]);
        result.questions = Some(questions);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use learnstyle_models::providers::{ProviderOutput, RawOutput, StubProvider, WorkflowRun};
    use serde_json::{Value, json};
    use tokio::sync::Mutex;

    use crate::StoreError;
    use crate::questions::{FIXED_FOLLOW_UPS, GradeBand};
    use crate::session::DocumentSessionStore;
    use crate::store::{
        ASSESSMENT_SESSIONS, ASSESSMENTS, Document, MemoryDocumentStore, STUDENTS,
    };

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
        ) -> learnstyle_models::Result<ProviderOutput> {
            Err(learnstyle_models::Error::ProviderApi {
                status: 503,
                body: "unavailable".into(),
            })
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl AssessmentProvider for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }

        async fn generate_assessment(
            &self,
            messages: &[Message],
            context: Option<&AssessmentContext>,
        ) -> learnstyle_models::Result<ProviderOutput> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            StubProvider::new().generate_assessment(messages, context).await
        }
    }

    /// Returns a fixed output and records the context it was called with.
    struct FixedProvider {
        output: ProviderOutput,
        shares_memory: bool,
        seen: Mutex<Option<AssessmentContext>>,
    }

    impl FixedProvider {
        fn new(output: ProviderOutput) -> Self {
            Self {
                output,
                shares_memory: false,
                seen: Mutex::new(None),
            }
        }

        fn sharing_memory(mut self) -> Self {
            self.shares_memory = true;
            self
        }
    }

    #[async_trait]
    impl AssessmentProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate_assessment(
            &self,
            _messages: &[Message],
            context: Option<&AssessmentContext>,
        ) -> learnstyle_models::Result<ProviderOutput> {
            *self.seen.lock().await = context.cloned();
            Ok(self.output.clone())
        }

        fn uses_session_memory(&self) -> bool {
            self.shares_memory
        }
    }

    /// Fails every write to one collection.
    struct FailingCollection {
        inner: MemoryDocumentStore,
        collection: &'static str,
    }

    impl FailingCollection {
        fn check(&self, collection: &str) -> Result<(), StoreError> {
            if collection == self.collection {
                Err(StoreError::Io(format!("{collection} is read-only")))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl DocumentStore for FailingCollection {
        async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
            self.inner.get(collection, id).await
        }

        async fn update(
            &self,
            collection: &str,
            id: &str,
            fields: Document,
        ) -> Result<(), StoreError> {
            self.check(collection)?;
            self.inner.update(collection, id, fields).await
        }

        async fn set_merge(
            &self,
            collection: &str,
            id: &str,
            fields: Document,
        ) -> Result<(), StoreError> {
            self.check(collection)?;
            self.inner.set_merge(collection, id, fields).await
        }

        async fn add(&self, collection: &str, document: Document) -> Result<String, StoreError> {
            self.check(collection)?;
            self.inner.add(collection, document).await
        }

        async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StoreError> {
            self.inner.list(collection).await
        }
    }

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    async fn seed_student(documents: &dyn DocumentStore, fields: Value) {
        documents
            .set_merge(STUDENTS, "s1", doc(fields))
            .await
            .unwrap();
    }

    fn engine_over(
        provider: Arc<dyn AssessmentProvider>,
        documents: Arc<dyn DocumentStore>,
    ) -> AssessmentEngine {
        let sessions = Arc::new(DocumentSessionStore::new(documents.clone()));
        AssessmentEngine::new(EngineConfig::default(), provider, documents, sessions)
    }

    async fn setup(provider: Arc<dyn AssessmentProvider>) -> (Arc<MemoryDocumentStore>, AssessmentEngine) {
        let documents = Arc::new(MemoryDocumentStore::new());
        seed_student(documents.as_ref(), json!({"parentId": "p1", "name": "Ada"})).await;
        let engine = engine_over(provider, documents.clone());
        (documents, engine)
    }

    fn sensory_history() -> Vec<Message> {
        vec![
            Message::assistant("How do you like to learn?"),
            Message::user("I learn best from pictures"),
            Message::assistant("Anything else?"),
            Message::user("I love drawing"),
            Message::user("I watch videos when I study"),
            Message::user("diagrams help me the most"),
        ]
    }

    fn thin_history() -> Vec<Message> {
        vec![
            Message::user("maybe"),
            Message::assistant("Tell me more about how you study."),
            Message::user("I like diagrams and charts."),
        ]
    }

    async fn student_doc(documents: &MemoryDocumentStore) -> Document {
        documents.get(STUDENTS, "s1").await.unwrap().unwrap()
    }

    async fn session_memory(documents: &MemoryDocumentStore) -> SessionMemory {
        let stored = documents
            .get(ASSESSMENT_SESSIONS, "p1_s1")
            .await
            .unwrap()
            .unwrap();
        serde_json::from_value(Value::Object(stored)).unwrap()
    }

    #[tokio::test]
    async fn low_evidence_asks_for_more_and_marks_in_progress() {
        let (documents, engine) = setup(Arc::new(StubProvider::new())).await;
        let request = AssessmentRequest::new("p1", "s1", thin_history());

        let result = engine.assess("p1", &request).await.unwrap();

        assert_eq!(result.decision, Some(Decision::NeedsMoreData));
        assert_eq!(result.evidence_count, Some(1));
        assert_eq!(result.model, EVIDENCE_GATE_MODEL);
        assert!(result.confidence <= 0.4);
        assert_eq!(
            result.missing_evidence,
            Some(vec!["Need at least 4 detailed responses.".to_string()])
        );
        assert_eq!(result.questions.as_ref().map(Vec::len), Some(3));

        let student = student_doc(&documents).await;
        assert_eq!(student["assessmentStatus"], json!("in_progress"));
        assert!(!student.contains_key("learningStyle"));

        let memory = session_memory(&documents).await;
        assert_eq!(memory.session_status, SessionStatus::NeedsMoreData);
        assert_eq!(memory.question_history, FIXED_FOLLOW_UPS.map(String::from).to_vec());
        assert!(documents.list(ASSESSMENTS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn grade_band_questions_rotate_across_turns() {
        let (documents, engine) = setup(Arc::new(StubProvider::new())).await;
        let request =
            AssessmentRequest::new("p1", "s1", thin_history()).with_grade_band(GradeBand::K2);

        let first = engine.assess("p1", &request).await.unwrap();
        let second = engine.assess("p1", &request).await.unwrap();

        let first = first.questions.unwrap();
        let second = second.questions.unwrap();
        assert_eq!(first[0], GradeBand::K2.prompts()[0]);
        assert_eq!(second.len(), 2);
        assert!(second.iter().all(|q| !first.contains(q)));

        let memory = session_memory(&documents).await;
        assert_eq!(memory.question_history.len(), 5);
    }

    #[tokio::test]
    async fn sufficient_sensory_evidence_finalizes() {
        let (documents, engine) = setup(Arc::new(StubProvider::new())).await;
        let request = AssessmentRequest::new("p1", "s1", sensory_history());

        let result = engine.assess("p1", &request).await.unwrap();

        assert_eq!(result.decision, Some(Decision::Final));
        assert_eq!(result.evidence_count, Some(4));
        assert_eq!(result.learning_style, LearningStyle::Visual);
        assert_eq!(result.model, "stub");
        assert!((3..=6).contains(&result.next_steps.len()));

        let student = student_doc(&documents).await;
        assert_eq!(student["learningStyle"], json!("Visual"));
        assert_eq!(student["assessmentStatus"], json!("completed"));
        assert_eq!(student["hasTakenAssessment"], json!(true));

        let history = documents.list(ASSESSMENTS).await.unwrap();
        assert_eq!(history.len(), 1);
        let entry = &history[0].1;
        assert_eq!(entry["decision"], json!("final"));
        assert_eq!(entry["evidenceCount"], json!(4));
        assert_eq!(entry["model"], json!("stub"));
        assert_eq!(entry["messages"].as_array().map(Vec::len), Some(6));

        let memory = session_memory(&documents).await;
        assert_eq!(memory.session_status, SessionStatus::Complete);
        assert_eq!(memory.focus_modality.as_deref(), Some("Visual"));
        assert_eq!(memory.response_scores, vec![result.confidence]);
        assert_eq!(
            memory.final_report.map(|r| r.learning_style),
            Some(LearningStyle::Visual)
        );
    }

    #[tokio::test]
    async fn rejecting_provider_degrades_to_unavailable_default() {
        let (documents, engine) = setup(Arc::new(RejectingProvider)).await;
        let request = AssessmentRequest::new("p1", "s1", sensory_history());

        let result = engine.assess("p1", &request).await.unwrap();

        assert_eq!(result.model, UNAVAILABLE_MODEL);
        assert_eq!(result.decision, Some(Decision::Final));
        assert_eq!(result.learning_style, LearningStyle::Multimodal);
        assert_eq!(result.confidence, 0.5);
        assert_eq!(result.next_steps.len(), 3);

        let student = student_doc(&documents).await;
        assert_eq!(student["assessmentStatus"], json!("completed"));
    }

    #[tokio::test]
    async fn provider_timeout_degrades_to_unavailable_default() {
        let documents = Arc::new(MemoryDocumentStore::new());
        seed_student(documents.as_ref(), json!({"parentId": "p1"})).await;
        let config = EngineConfig {
            provider_timeout_ms: 20,
            ..Default::default()
        };
        let engine = AssessmentEngine::new(
            config,
            Arc::new(SlowProvider),
            documents.clone(),
            Arc::new(crate::MemorySessionStore::new()),
        );

        let result = engine
            .assess("p1", &AssessmentRequest::new("p1", "s1", sensory_history()))
            .await
            .unwrap();
        assert_eq!(result.model, UNAVAILABLE_MODEL);
    }

    #[tokio::test]
    async fn completed_student_low_evidence_performs_zero_writes() {
        let (documents, engine) = setup(Arc::new(StubProvider::new())).await;
        seed_student(
            documents.as_ref(),
            json!({"learningStyle": "Kinesthetic", "assessmentStatus": "completed"}),
        )
        .await;
        let before_writes = documents.write_count();
        let before_doc = student_doc(&documents).await;

        let request = AssessmentRequest::new("p1", "s1", thin_history());
        let result = engine.assess("p1", &request).await.unwrap();

        assert_eq!(result.decision, Some(Decision::NeedsMoreData));
        assert_eq!(result.learning_style, LearningStyle::Kinesthetic);
        assert_eq!(documents.write_count(), before_writes);
        assert_eq!(student_doc(&documents).await, before_doc);
        assert!(documents.get(ASSESSMENT_SESSIONS, "p1_s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn complete_session_memory_is_sticky() {
        let (documents, engine) = setup(Arc::new(StubProvider::new())).await;

        engine
            .assess("p1", &AssessmentRequest::new("p1", "s1", sensory_history()))
            .await
            .unwrap();
        // Student record reset externally; session memory still says complete.
        seed_student(documents.as_ref(), json!({"assessmentStatus": "in_progress"})).await;
        let before_writes = documents.write_count();

        let result = engine
            .assess("p1", &AssessmentRequest::new("p1", "s1", thin_history()))
            .await
            .unwrap();

        assert_eq!(result.decision, Some(Decision::NeedsMoreData));
        assert_eq!(result.learning_style, LearningStyle::Visual);
        assert_eq!(documents.write_count(), before_writes);
        assert_eq!(
            session_memory(&documents).await.session_status,
            SessionStatus::Complete
        );
    }

    #[tokio::test]
    async fn low_confidence_verdict_keeps_completed_style() {
        let report = json!({
            "learningStyle": "Kinesthetic",
            "confidence": 0.3,
            "explanation": "Weak signal.",
            "nextSteps": ["a", "b", "c"],
        });
        let provider = FixedProvider::new(ProviderOutput::new(RawOutput::Stub(report), "fixed"));
        let (documents, engine) = setup(Arc::new(provider)).await;
        seed_student(
            documents.as_ref(),
            json!({"learningStyle": "Auditory", "assessmentStatus": "completed"}),
        )
        .await;
        let before_doc = student_doc(&documents).await;

        let result = engine
            .assess("p1", &AssessmentRequest::new("p1", "s1", sensory_history()))
            .await
            .unwrap();

        assert_eq!(result.decision, Some(Decision::Final));
        assert_eq!(result.learning_style, LearningStyle::Auditory);
        assert_eq!(student_doc(&documents).await, before_doc);
        assert_eq!(documents.list(ASSESSMENTS).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn confident_verdict_overwrites_completed_style() {
        let report = json!({
            "learningStyle": "Kinesthetic",
            "confidence": 0.9,
            "explanation": "Strong preference for building things.",
            "nextSteps": ["a", "b", "c", "d"],
        });
        let provider = FixedProvider::new(ProviderOutput::new(RawOutput::Stub(report), "fixed"));
        let (documents, engine) = setup(Arc::new(provider)).await;
        seed_student(
            documents.as_ref(),
            json!({"learningStyle": "Auditory", "assessmentStatus": "completed"}),
        )
        .await;

        let result = engine
            .assess("p1", &AssessmentRequest::new("p1", "s1", sensory_history()))
            .await
            .unwrap();

        assert_eq!(result.learning_style, LearningStyle::Kinesthetic);
        assert_eq!(student_doc(&documents).await["learningStyle"], json!("Kinesthetic"));
    }

    #[tokio::test]
    async fn workflow_memory_replaces_local_copy() {
        let remote_memory = SessionMemory {
            question_history: vec!["remote question".into()],
            response_scores: vec![0.2],
            ..Default::default()
        };
        let run = WorkflowRun {
            report: Some(json!({
                "learningStyle": "Read/Write",
                "confidence": 0.8,
                "explanation": "Prefers notes.",
                "nextSteps": ["a", "b", "c"],
            })),
            memory: Some(remote_memory),
            trace_id: Some("trace-1".into()),
        };
        let provider = Arc::new(
            FixedProvider::new(ProviderOutput::new(RawOutput::Workflow(run), "beeai"))
                .sharing_memory(),
        );
        let (documents, engine) = setup(provider.clone()).await;

        // Leave some local history behind first.
        engine
            .assess("p1", &AssessmentRequest::new("p1", "s1", thin_history()))
            .await
            .unwrap();
        let result = engine
            .assess("p1", &AssessmentRequest::new("p1", "s1", sensory_history()))
            .await
            .unwrap();
        assert_eq!(result.learning_style, LearningStyle::ReadWrite);

        let seen = provider.seen.lock().await.clone().unwrap();
        assert_eq!(seen.parent_id, "p1");
        assert_eq!(seen.memory.question_history.len(), 3);

        let memory = session_memory(&documents).await;
        assert_eq!(memory.question_history, vec!["remote question".to_string()]);
        assert_eq!(memory.response_scores, vec![0.2, 0.8]);
        assert_eq!(memory.session_status, SessionStatus::Complete);
        assert_eq!(memory.focus_modality.as_deref(), Some("Read/Write"));
    }

    #[tokio::test]
    async fn principal_must_match_parent() {
        let (documents, engine) = setup(Arc::new(StubProvider::new())).await;
        let before = documents.write_count();

        let err = engine
            .assess("someone-else", &AssessmentRequest::new("p1", "s1", sensory_history()))
            .await
            .unwrap_err();

        assert!(matches!(err, AssessmentError::Forbidden(_)));
        assert_eq!(documents.write_count(), before);
    }

    #[tokio::test]
    async fn student_of_another_parent_is_forbidden() {
        let (documents, engine) = setup(Arc::new(StubProvider::new())).await;
        seed_student(documents.as_ref(), json!({"parentId": "p2"})).await;

        let err = engine
            .assess("p1", &AssessmentRequest::new("p1", "s1", sensory_history()))
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentError::Forbidden(_)));
    }

    #[tokio::test]
    async fn missing_student_is_not_found() {
        let (_documents, engine) = setup(Arc::new(StubProvider::new())).await;

        let err = engine
            .assess("p1", &AssessmentRequest::new("p1", "ghost", sensory_history()))
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentError::StudentNotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_before_side_effects() {
        let (documents, engine) = setup(Arc::new(StubProvider::new())).await;
        let before = documents.write_count();

        let request = AssessmentRequest::new("p1", "s1", vec![Message::user(" ")]);
        let err = engine.assess("p1", &request).await.unwrap_err();

        assert!(matches!(err, AssessmentError::Validation(_)));
        assert_eq!(documents.write_count(), before);
    }

    #[tokio::test]
    async fn student_write_failure_is_fatal() {
        let inner = MemoryDocumentStore::new();
        seed_student(&inner, json!({"parentId": "p1"})).await;
        let documents = Arc::new(FailingCollection {
            inner,
            collection: STUDENTS,
        });
        let engine = engine_over(Arc::new(StubProvider::new()), documents);

        let err = engine
            .assess("p1", &AssessmentRequest::new("p1", "s1", sensory_history()))
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentError::Persistence(_)));
    }

    #[tokio::test]
    async fn history_and_session_write_failures_are_not_fatal() {
        for collection in [ASSESSMENTS, ASSESSMENT_SESSIONS] {
            let inner = MemoryDocumentStore::new();
            seed_student(&inner, json!({"parentId": "p1"})).await;
            let documents = Arc::new(FailingCollection { inner, collection });
            let engine = engine_over(Arc::new(StubProvider::new()), documents.clone());

            let result = engine
                .assess("p1", &AssessmentRequest::new("p1", "s1", sensory_history()))
                .await
                .unwrap();
            assert_eq!(result.decision, Some(Decision::Final), "{collection}");

            let student = documents.get(STUDENTS, "s1").await.unwrap().unwrap();
            assert_eq!(student["assessmentStatus"], json!("completed"));
        }
    }

    #[tokio::test]
    async fn memoryless_provider_gets_no_session_memory() {
        let run = WorkflowRun {
            report: Some(json!({
                "learningStyle": "Auditory",
                "confidence": 0.8,
                "explanation": "Prefers listening.",
                "nextSteps": ["a", "b", "c"],
            })),
            memory: Some(SessionMemory {
                question_history: vec!["remote question".into()],
                ..Default::default()
            }),
            trace_id: None,
        };
        let provider = Arc::new(FixedProvider::new(ProviderOutput::new(
            RawOutput::Workflow(run),
            "fixed",
        )));
        let (documents, engine) = setup(provider.clone()).await;

        engine
            .assess("p1", &AssessmentRequest::new("p1", "s1", thin_history()))
            .await
            .unwrap();
        engine
            .assess("p1", &AssessmentRequest::new("p1", "s1", sensory_history()))
            .await
            .unwrap();

        let seen = provider.seen.lock().await.clone().unwrap();
        assert_eq!(seen.student_id, "s1");
        assert_eq!(seen.memory, SessionMemory::default());

        // Returned memory is ignored; the local history survives.
        let memory = session_memory(&documents).await;
        assert_eq!(memory.question_history.len(), 3);
        assert_eq!(memory.session_status, SessionStatus::Complete);
    }

    #[tokio::test]
    async fn completed_status_without_style_is_never_downgraded() {
        let documents = Arc::new(MemoryDocumentStore::new());
        seed_student(
            documents.as_ref(),
            json!({"parentId": "p1", "assessmentStatus": "completed"}),
        )
        .await;
        let engine = engine_over(Arc::new(StubProvider::new()), documents.clone());
        let before_writes = documents.write_count();

        let result = engine
            .assess("p1", &AssessmentRequest::new("p1", "s1", thin_history()))
            .await
            .unwrap();

        assert_eq!(result.decision, Some(Decision::NeedsMoreData));
        assert_eq!(result.learning_style, LearningStyle::Multimodal);
        assert_eq!(documents.write_count(), before_writes);
        assert_eq!(student_doc(&documents).await["assessmentStatus"], json!("completed"));
    }

    #[tokio::test]
    async fn loosely_labelled_stored_style_is_reported_and_kept() {
        let report = json!({
            "learningStyle": "Kinesthetic",
            "confidence": 0.3,
            "explanation": "Weak signal.",
            "nextSteps": ["a", "b", "c"],
        });
        let provider = FixedProvider::new(ProviderOutput::new(RawOutput::Stub(report), "fixed"));
        let (documents, engine) = setup(Arc::new(provider)).await;
        seed_student(
            documents.as_ref(),
            json!({"learningStyle": "visual", "assessmentStatus": "completed"}),
        )
        .await;
        let before_doc = student_doc(&documents).await;

        let gated = engine
            .assess("p1", &AssessmentRequest::new("p1", "s1", thin_history()))
            .await
            .unwrap();
        assert_eq!(gated.learning_style, LearningStyle::Visual);

        let result = engine
            .assess("p1", &AssessmentRequest::new("p1", "s1", sensory_history()))
            .await
            .unwrap();
        assert_eq!(result.learning_style, LearningStyle::Visual);
        assert_eq!(student_doc(&documents).await, before_doc);
    }
}
