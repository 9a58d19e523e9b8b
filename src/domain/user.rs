use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile returned by the user directory.
///
/// Read-only from the point of view of the order and payment workflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Creates a profile without directory timestamps.
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            created_at: None,
            updated_at: None,
        }
    }
}
