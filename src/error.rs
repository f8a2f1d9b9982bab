//! Error types shared by the tracker, encounter and store layers

use thiserror::Error;

/// Errors raised by tracker operations
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Malformed or out-of-range input to a mutator
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Referenced id is absent from the collection
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Operation is not allowed in the current state
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TrackerError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        TrackerError::InvalidArgument(msg.into())
    }

    pub fn combatant_not_found(id: &str) -> Self {
        TrackerError::NotFound {
            entity: "combatant",
            id: id.to_string(),
        }
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        TrackerError::PreconditionFailed(msg.into())
    }

    /// Whether this is a lookup miss rather than bad input
    pub fn is_not_found(&self) -> bool {
        matches!(self, TrackerError::NotFound { .. })
    }
}
