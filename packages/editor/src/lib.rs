//! # Folio Editor
//!
//! Revision lifecycle of the document being edited.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ UI layer: subscribes to EditorState         │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: RevisionStateMachine                │
//! │  - EditBuffer with dirty tracking           │
//! │  - save / publish / fork drafts             │
//! │  - duplicate, archive, restore, delete      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ store: DocumentStore round-trips            │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Server authority**: the store enforces slugs, versions and the
//!    single-draft rule; the editor never guesses
//! 2. **No silent data loss**: a dirty buffer survives refreshes and failures
//! 3. **Explicit state**: the UI reads snapshots, it does not own the state
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_editor::RevisionStateMachine;
//! use folio_store::MemoryStore;
//! use std::sync::Arc;
//!
//! let editor = RevisionStateMachine::new(Arc::new(MemoryStore::new()));
//! editor.start_new("intro", "Intro");
//! editor.edit("# Hi")?;
//! editor.save_draft().await?;
//! editor.publish().await?;
//! ```

mod document;
mod errors;
mod session;

pub use document::{BufferTarget, EditBuffer, EditorState, NEW_REVISION};
pub use errors::{EditorError, EditorResult};
pub use session::RevisionStateMachine;
