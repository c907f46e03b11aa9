//! Error types reported by the documents/themes collaborator

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Transport failure or timeout; the request may not have reached the service.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The write targeted a revision that is no longer the document's latest.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Slug '{0}' is already in use")]
    SlugConflict(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl StoreError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
