//! Inbound assessment request

use learnstyle_models::Message;
use serde::{Deserialize, Serialize};

use crate::AssessmentError;
use crate::questions::GradeBand;

/// One assessment turn: the full conversation so far plus identity fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    pub parent_id: String,
    pub student_id: String,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_band: Option<GradeBand>,
}

impl AssessmentRequest {
    pub fn new(
        parent_id: impl Into<String>,
        student_id: impl Into<String>,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            parent_id: parent_id.into(),
            student_id: student_id.into(),
            messages,
            grade_band: None,
        }
    }

    pub fn with_grade_band(mut self, band: GradeBand) -> Self {
        self.grade_band = Some(band);
        self
    }

    /// Check the fields serde cannot: identity ids and message contents must be
    /// non-empty.
    pub fn validate(&self) -> Result<(), AssessmentError> {
        if self.parent_id.trim().is_empty() {
            return Err(AssessmentError::Validation("parentId is required".into()));
        }
        if self.student_id.trim().is_empty() {
            return Err(AssessmentError::Validation("studentId is required".into()));
        }
        if let Some(index) = self
            .messages
            .iter()
            .position(|m| m.content.trim().is_empty())
        {
            return Err(AssessmentError::Validation(format!(
                "messages[{index}].content must not be empty"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_camel_case_body() {
        let request: AssessmentRequest = serde_json::from_value(json!({
            "parentId": "p1",
            "studentId": "s1",
            "messages": [{"role": "user", "content": "I like maps"}],
            "gradeBand": "6-8"
        }))
        .unwrap();

        assert_eq!(request.parent_id, "p1");
        assert_eq!(request.grade_band, Some(GradeBand::G6To8));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn unknown_role_or_band_fails_to_parse() {
        let bad_role = json!({
            "parentId": "p1", "studentId": "s1",
            "messages": [{"role": "tutor", "content": "hi"}]
        });
        assert!(serde_json::from_value::<AssessmentRequest>(bad_role).is_err());

        let bad_band = json!({
            "parentId": "p1", "studentId": "s1", "messages": [], "gradeBand": "college"
        });
        assert!(serde_json::from_value::<AssessmentRequest>(bad_band).is_err());
    }

    #[test]
    fn blank_ids_are_invalid() {
        let request = AssessmentRequest::new(" ", "s1", vec![]);
        assert!(matches!(
            request.validate(),
            Err(AssessmentError::Validation(msg)) if msg.contains("parentId")
        ));

        let request = AssessmentRequest::new("p1", "", vec![]);
        assert!(matches!(
            request.validate(),
            Err(AssessmentError::Validation(msg)) if msg.contains("studentId")
        ));
    }

    #[test]
    fn empty_message_content_is_invalid() {
        let request = AssessmentRequest::new(
            "p1",
            "s1",
            vec![Message::user("I like maps"), Message::assistant("  ")],
        );
        assert!(matches!(
            request.validate(),
            Err(AssessmentError::Validation(msg)) if msg.contains("messages[1]")
        ));
    }

    #[test]
    fn empty_history_is_valid() {
        assert!(AssessmentRequest::new("p1", "s1", vec![]).validate().is_ok());
    }
}
