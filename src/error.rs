use std::error::Error as StdError;
use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// User-visible failure of a session operation. None of these end the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Error reading file: {0}")]
    Extraction(String),
    #[error("An error occurred: {0}")]
    Remote(String),
}

impl ChatError {
    pub fn remote(err: impl std::fmt::Display) -> Self {
        ChatError::Remote(err.to_string())
    }
}
