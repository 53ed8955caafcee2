use std::fmt;

use postdeck_model::ModelError;
use thiserror::Error;

/// Which kind of reference could no longer be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiredKind {
    /// Retrieval code unknown to the file store.
    Code,
    /// Callback arrived for a conversation that is no longer held.
    Session,
    /// Edit flow points at a post whose keyboard was never recorded.
    Post,
}

impl fmt::Display for ExpiredKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiredKind::Code => f.write_str("retrieval code"),
            ExpiredKind::Session => f.write_str("session"),
            ExpiredKind::Post => f.write_str("post"),
        }
    }
}

/// Reply policy bucket for an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Corrective prompt, state unchanged.
    UserInput,
    /// Generic failure, step aborted, session kept.
    Collaborator,
    /// Distinct "expired" reply.
    Expired,
}

#[derive(Error, Debug)]
pub enum PostError {
    #[error("{prompt}")]
    UserInput { prompt: String },

    #[error("{operation} failed: {message}")]
    Collaborator {
        operation: &'static str,
        message: String,
    },

    #[error("Expired {0}")]
    Expired(ExpiredKind),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PostError {
    pub fn user_input(prompt: impl Into<String>) -> Self {
        PostError::UserInput {
            prompt: prompt.into(),
        }
    }

    pub fn collaborator(operation: &'static str, err: impl fmt::Display) -> Self {
        PostError::Collaborator {
            operation,
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorClass {
        match self {
            PostError::UserInput { .. } | PostError::Model(_) => ErrorClass::UserInput,
            PostError::Expired(_) | PostError::NotFound(_) => ErrorClass::Expired,
            PostError::Collaborator { .. }
            | PostError::Internal(_)
            | PostError::Http(_)
            | PostError::Serialization(_) => ErrorClass::Collaborator,
            #[cfg(feature = "database")]
            PostError::Database(_) => ErrorClass::Collaborator,
        }
    }
}

pub type Result<T> = std::result::Result<T, PostError>;
