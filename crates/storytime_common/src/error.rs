//! Error types for Storytime.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoryError {
    #[error("Story not found: {0}")]
    NotFound(u64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoryError {
    /// HTTP status code the API layer answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            StoryError::NotFound(_) => 404,
            StoryError::InvalidInput(_) => 400,
            StoryError::Internal(_) => 500,
        }
    }

    /// Message shown to clients. Internal details stay in the server log.
    pub fn public_message(&self) -> String {
        match self {
            StoryError::NotFound(_) => "Story not found".to_string(),
            StoryError::InvalidInput(msg) => msg.clone(),
            StoryError::Internal(_) => "Internal server error".to_string(),
        }
    }
}
