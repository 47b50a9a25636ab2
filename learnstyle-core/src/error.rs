//! Error types for learnstyle-core

use thiserror::Error;

/// Errors from the persistence collaborator
#[derive(Error, Debug)]
pub enum StoreError {
    /// `update` was called on a document that does not exist
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// The backing file could not be read or written
    #[error("storage I/O error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A value that must be stored as a document did not serialize to an object
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Failures an assessment request can surface to its caller.
///
/// Provider failures are absent on purpose: the engine always recovers from them.
#[derive(Error, Debug)]
pub enum AssessmentError {
    /// Malformed request, rejected before any side effect
    #[error("invalid request: {0}")]
    Validation(String),

    /// Caller identity or student ownership mismatch
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("student not found: {0}")]
    StudentNotFound(String),

    /// The student record could not be read or updated
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl AssessmentError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            AssessmentError::Validation(_) => "INVALID_REQUEST",
            AssessmentError::Forbidden(_) => "FORBIDDEN",
            AssessmentError::StudentNotFound(_) => "STUDENT_NOT_FOUND",
            AssessmentError::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_not_found_displays_path() {
        let error = StoreError::NotFound {
            collection: "students".into(),
            id: "s1".into(),
        };
        assert_eq!(error.to_string(), "document not found: students/s1");
    }

    #[test]
    fn assessment_error_converts_from_store_error() {
        let error: AssessmentError = StoreError::Io("disk full".into()).into();
        assert!(matches!(error, AssessmentError::Persistence(_)));
        assert!(error.to_string().contains("disk full"));
    }

    #[test]
    fn assessment_error_codes_are_stable() {
        assert_eq!(AssessmentError::Validation("x".into()).code(), "INVALID_REQUEST");
        assert_eq!(AssessmentError::Forbidden("x".into()).code(), "FORBIDDEN");
        assert_eq!(
            AssessmentError::StudentNotFound("x".into()).code(),
            "STUDENT_NOT_FOUND"
        );
        assert_eq!(
            AssessmentError::Persistence(StoreError::Io("x".into())).code(),
            "PERSISTENCE_ERROR"
        );
    }
}
