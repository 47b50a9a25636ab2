//! Verified caller identity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The verified identity behind a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable user id; compared against `parentId`
    pub uid: String,
    pub email: Option<String>,
    /// When the token expires, if it carries an expiry
    pub expires_at: Option<DateTime<Utc>>,
}

impl Principal {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            expires_at: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}
