//! Error types for the editor

use folio_store::{RevisionState, StoreError};
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

/// Every failure leaves the edit buffer exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The server's latest revision moved past the one being edited
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Slug '{0}' is already in use")]
    SlugConflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Save the draft before publishing")]
    UnsavedChanges,

    #[error("Revision is {0:?}, expected a draft")]
    NotDraft(RevisionState),

    #[error("Latest revision is not published")]
    NotPublished,

    #[error("No document selected")]
    NoSelection,

    #[error("Document has not been saved yet")]
    NotPersisted,

    #[error("Another operation on {0} is still in flight")]
    OperationInFlight(String),
}

impl From<StoreError> for EditorError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Network(message) => EditorError::Network(message),
            StoreError::Validation(message) => EditorError::Validation(message),
            StoreError::Conflict(message) => EditorError::Conflict(message),
            StoreError::SlugConflict(slug) => EditorError::SlugConflict(slug),
            StoreError::NotFound(what) => EditorError::NotFound(what),
        }
    }
}
