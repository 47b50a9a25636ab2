//! Typed access to student records and the assessment history log.

use chrono::{DateTime, Utc};
use learnstyle_models::{AssessmentResult, Decision, LearningStyle, Message};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use super::{ASSESSMENTS, Document, DocumentStore, STUDENTS, to_document};
use crate::StoreError;

/// Assessment progress stored on a student record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    InProgress,
    Completed,
    /// Any value this service does not write
    #[serde(other)]
    Other,
}

impl AssessmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentStatus::InProgress => "in_progress",
            AssessmentStatus::Completed => "completed",
            AssessmentStatus::Other => "other",
        }
    }
}

/// The fields of a student document this service reads.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub learning_style: Option<String>,
    #[serde(default)]
    pub assessment_status: Option<AssessmentStatus>,
}

impl StudentRecord {
    /// A completed status is never downgraded, with or without a stored style.
    pub fn is_completed(&self) -> bool {
        self.assessment_status == Some(AssessmentStatus::Completed)
    }

    /// The stored learning style. Labels written by other clients are matched
    /// loosely (`"visual"`, `"read/write"`).
    pub fn stored_style(&self) -> Option<LearningStyle> {
        self.learning_style
            .as_deref()
            .and_then(LearningStyle::from_loose_label)
    }

    pub fn belongs_to(&self, parent_id: &str) -> bool {
        self.parent_id.as_deref() == Some(parent_id)
    }
}

/// An immutable entry in the `assessments` log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord<'a> {
    pub parent_id: &'a str,
    pub student_id: &'a str,
    pub messages: &'a [Message],
    pub result: &'a AssessmentResult,
    pub created_at: DateTime<Utc>,
    pub model: &'a str,
    pub decision: Decision,
    pub evidence_count: usize,
}

/// Load a student record.
///
/// A document that exists but cannot be read as a student is treated as having
/// no owner, which the caller rejects.
pub async fn load_student(
    store: &dyn DocumentStore,
    student_id: &str,
) -> Result<Option<StudentRecord>, StoreError> {
    let Some(doc) = store.get(STUDENTS, student_id).await? else {
        return Ok(None);
    };

    match serde_json::from_value(Value::Object(doc)) {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            warn!(student_id, error = %e, "unreadable student record");
            Ok(Some(StudentRecord::default()))
        }
    }
}

/// Mark an assessment as started without touching the learning style.
pub async fn mark_in_progress(
    store: &dyn DocumentStore,
    student_id: &str,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    store
        .update(
            STUDENTS,
            student_id,
            fields(json!({
                "assessmentStatus": AssessmentStatus::InProgress.as_str(),
                "updatedAt": now,
            })),
        )
        .await
}

/// Commit a final learning style.
pub async fn mark_completed(
    store: &dyn DocumentStore,
    student_id: &str,
    style: LearningStyle,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    store
        .update(
            STUDENTS,
            student_id,
            fields(json!({
                "learningStyle": style.as_str(),
                "hasTakenAssessment": true,
                "assessmentStatus": AssessmentStatus::Completed.as_str(),
                "updatedAt": now,
            })),
        )
        .await
}

/// Append to the assessment history log, returning the new entry's id.
pub async fn append_history(
    store: &dyn DocumentStore,
    record: &HistoryRecord<'_>,
) -> Result<String, StoreError> {
    store.add(ASSESSMENTS, to_document(record)?).await
}

fn fields(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}
