//! # Folio Store
//!
//! Records and collaborator contract for versioned MDX documents and theme tokens.
//!
//! The documents/themes API is owned by an external service. This crate only
//! describes the shape of its requests and responses (`DocumentStore`,
//! `ThemeStore`) and ships `MemoryStore`, an in-process implementation that
//! enforces the same rules the service does.
//!
//! ```text
//! Document 1 ── * Revision        (one latest, at most one DRAFT)
//!    │
//!    └─ slug reserved while ACTIVE
//! ```

mod error;
mod memory;
mod model;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, StoreOp};
pub use model::{
    is_valid_slug, Document, DocumentId, DocumentStatus, DocumentWithRevision, PublishReceipt,
    Revision, RevisionId, RevisionState, ThemeTokenRecord,
};
pub use store::{
    CreateDocument, DocumentStore, ThemeStore, UpdateDocument, UpdateRevision,
};
