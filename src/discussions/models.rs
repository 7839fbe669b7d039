//! Discussion message models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum message length, in characters
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// A message in a record's discussion thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscussionMessage {
    pub id: Uuid,
    pub record_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for posting a message
#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageRequest {
    pub message: String,
}

impl PostMessageRequest {
    pub fn validate(&self) -> Result<(), String> {
        let trimmed = self.message.trim();
        if trimmed.is_empty() {
            return Err("message cannot be empty".to_string());
        }
        if trimmed.chars().count() > MAX_MESSAGE_CHARS {
            return Err(format!("message cannot exceed {} characters", MAX_MESSAGE_CHARS));
        }
        Ok(())
    }
}

/// Who is posting or deleting
#[derive(Debug, Clone)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
    pub is_admin: bool,
}

/// Result of a delete attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// The requester is neither the author nor an administrator
    Forbidden,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_blank() {
        let req = PostMessageRequest {
            message: " \n\t ".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validate_length_limit() {
        let ok = PostMessageRequest {
            message: "é".repeat(MAX_MESSAGE_CHARS),
        };
        assert!(ok.validate().is_ok());

        let too_long = PostMessageRequest {
            message: "a".repeat(MAX_MESSAGE_CHARS + 1),
        };
        assert!(too_long.validate().is_err());
    }
}
