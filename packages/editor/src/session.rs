//! # Revision State Machine
//!
//! Owns the active edit buffer and drives every document operation through
//! the store.
//!
//! The machine is a cheap cloneable handle. Operations take `&self` and never
//! hold the state lock across a store round-trip, so the embedding layer may
//! switch buffers while a save is still in flight. Such a save is not
//! canceled; its result is applied only if the active buffer still targets
//! the same revision, and is otherwise dropped.
//!
//! A failed round-trip leaves the buffer exactly as it was.

use crate::document::{BufferTarget, NEW_REVISION};
use crate::{EditBuffer, EditorError, EditorResult, EditorState};
use folio_store::{
    is_valid_slug, CreateDocument, Document, DocumentId, DocumentStatus, DocumentStore,
    DocumentWithRevision, PublishReceipt, Revision, RevisionId, RevisionState, UpdateDocument,
    UpdateRevision,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct Inner {
    state: EditorState,
    /// Last listing fetched from the store, patched by local operations
    listing: Vec<DocumentWithRevision>,
    /// Revisions and documents with a store call outstanding
    in_flight: HashSet<String>,
    next_local_id: u64,
}

impl Inner {
    fn entry_mut(&mut self, document_id: &DocumentId) -> Option<&mut DocumentWithRevision> {
        self.listing
            .iter_mut()
            .find(|entry| &entry.document.id == document_id)
    }

    fn record_revision(&mut self, revision: &Revision) {
        if let Some(entry) = self.entry_mut(&revision.document_id) {
            entry.latest_revision = Some(revision.clone());
        }
    }

    fn record_published(&mut self, revision_id: &RevisionId) {
        let latest = self
            .listing
            .iter_mut()
            .filter_map(|entry| entry.latest_revision.as_mut())
            .find(|revision| &revision.id == revision_id);
        if let Some(revision) = latest {
            revision.state = RevisionState::Published;
        }
    }

    fn record_document(&mut self, document: &Document) {
        if let Some(entry) = self.entry_mut(&document.id) {
            entry.document = document.clone();
        }
    }

    fn record_status(&mut self, document_id: &DocumentId, status: DocumentStatus) {
        if let Some(entry) = self.entry_mut(document_id) {
            entry.document.status = status;
        }
    }

    fn clear_if_showing(&mut self, document_id: &DocumentId) {
        let showing = self
            .state
            .buffer()
            .map_or(false, |buffer| buffer.targets_document(document_id));
        if showing {
            debug!(document = %document_id, "clearing active buffer");
            self.state = EditorState::NoneSelected;
        }
    }

    fn next_local_id(&mut self) -> u64 {
        self.next_local_id += 1;
        self.next_local_id
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Marks a revision or document busy until dropped
struct InFlight {
    inner: Arc<Mutex<Inner>>,
    key: String,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        lock(&self.inner).in_flight.remove(&self.key);
    }
}

/// Keep a clean buffer in step with the listing. A dirty buffer is never
/// overwritten; a sentinel buffer has nothing to compare against.
fn resync(state: &EditorState, listing: &[DocumentWithRevision]) -> Option<EditorState> {
    let buffer = state.buffer()?;
    if buffer.dirty {
        return None;
    }
    let document_id = buffer.document_id()?;

    match listing.iter().find(|entry| &entry.document.id == document_id) {
        None => Some(EditorState::NoneSelected),
        Some(entry) => {
            let revision = entry.latest_revision.as_ref()?;
            let fresh = EditBuffer::from_revision(entry.document.clone(), revision);
            (fresh != *buffer).then_some(EditorState::Viewing(fresh))
        }
    }
}

/// Editor state for one user session
#[derive(Clone)]
pub struct RevisionStateMachine {
    store: Arc<dyn DocumentStore>,
    inner: Arc<Mutex<Inner>>,
    states: Arc<watch::Sender<EditorState>>,
}

impl fmt::Debug for RevisionStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevisionStateMachine")
            .field("state", &self.state())
            .finish()
    }
}

impl RevisionStateMachine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let (states, _) = watch::channel(EditorState::NoneSelected);
        Self {
            store,
            inner: Arc::new(Mutex::new(Inner::default())),
            states: Arc::new(states),
        }
    }

    pub fn state(&self) -> EditorState {
        lock(&self.inner).state.clone()
    }

    /// Snapshot channel; receives a new value on every state transition
    pub fn subscribe(&self) -> watch::Receiver<EditorState> {
        self.states.subscribe()
    }

    pub fn listing(&self) -> Vec<DocumentWithRevision> {
        lock(&self.inner).listing.clone()
    }

    pub fn active_documents(&self) -> Vec<DocumentWithRevision> {
        self.listing_where(|entry| entry.document.is_active())
    }

    pub fn archived_documents(&self) -> Vec<DocumentWithRevision> {
        self.listing_where(|entry| !entry.document.is_active())
    }

    fn listing_where(&self, keep: impl Fn(&DocumentWithRevision) -> bool) -> Vec<DocumentWithRevision> {
        lock(&self.inner)
            .listing
            .iter()
            .filter(|entry| keep(entry))
            .cloned()
            .collect()
    }

    fn update<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = lock(&self.inner);
        let before = inner.state.clone();
        let result = f(&mut inner);
        if inner.state != before {
            self.states.send_replace(inner.state.clone());
        }
        result
    }

    fn begin(&self, key: impl Into<String>) -> EditorResult<InFlight> {
        let key = key.into();
        if !lock(&self.inner).in_flight.insert(key.clone()) {
            return Err(EditorError::OperationInFlight(key));
        }
        Ok(InFlight {
            inner: self.inner.clone(),
            key,
        })
    }

    fn active(&self) -> EditorResult<EditBuffer> {
        lock(&self.inner)
            .state
            .buffer()
            .cloned()
            .ok_or(EditorError::NoSelection)
    }

    /// Fetch the listing and resynchronize a clean active buffer
    pub async fn refresh(&self) -> EditorResult<Vec<DocumentWithRevision>> {
        let listing = self.store.list_documents_with_latest_revision().await?;
        debug!(documents = listing.len(), "refreshed listing");

        self.update(|inner| {
            if let Some(next) = resync(&inner.state, &listing) {
                inner.state = next;
            }
            inner.listing = listing.clone();
        });
        Ok(listing)
    }

    /// Open the latest revision of a listed document
    pub fn select(&self, entry: &DocumentWithRevision) -> EditBuffer {
        self.update(|inner| {
            let buffer = EditBuffer::from_listing(entry, inner.next_local_id());
            debug!(document = %entry.document.id, revision = buffer.revision_key(), "selected");
            inner.state = EditorState::Viewing(buffer.clone());
            buffer
        })
    }

    pub fn select_document(&self, document_id: &DocumentId) -> EditorResult<EditBuffer> {
        let entry = lock(&self.inner)
            .listing
            .iter()
            .find(|entry| &entry.document.id == document_id)
            .cloned()
            .ok_or_else(|| EditorError::NotFound(format!("document {}", document_id)))?;
        Ok(self.select(&entry))
    }

    /// Open an empty buffer for a document that does not exist yet
    pub fn start_new(&self, slug: impl Into<String>, title: impl Into<String>) -> EditBuffer {
        self.update(|inner| {
            let buffer = EditBuffer::new_document(inner.next_local_id(), slug, title);
            inner.state = EditorState::Viewing(buffer.clone());
            buffer
        })
    }

    pub fn clear_selection(&self) {
        self.update(|inner| inner.state = EditorState::NoneSelected);
    }

    /// Replace the working copy; no store call
    pub fn edit(&self, source: impl Into<String>) -> EditorResult<()> {
        self.update(|inner| match inner.state.buffer_mut() {
            Some(buffer) => {
                buffer.edit(source);
                Ok(())
            }
            None => Err(EditorError::NoSelection),
        })
    }

    /// Persist the working copy into its draft, creating the document for a
    /// sentinel buffer. Returns the buffer the save resolved into.
    pub async fn save_draft(&self) -> EditorResult<EditBuffer> {
        let snapshot = self.active()?;
        let saved = snapshot.mdx_source.clone();

        let (document, revision_id) = match snapshot.target {
            BufferTarget::New {
                local_id,
                slug,
                title,
            } => return self.create_document(local_id, slug, title, saved).await,
            BufferTarget::Existing {
                document,
                revision_id,
            } => (document, revision_id),
        };
        if snapshot.state != RevisionState::Draft {
            return Err(EditorError::NotDraft(snapshot.state));
        }

        let _guard = self.begin(revision_id.as_str())?;
        self.ensure_latest(&document.id, &revision_id).await?;

        let revision = self
            .store
            .update_revision(UpdateRevision {
                revision_id: revision_id.clone(),
                mdx_source: Some(saved.clone()),
                title: None,
            })
            .await?;
        info!(revision = %revision.id, version = revision.version, "saved draft");

        Ok(self.update(|inner| {
            inner.record_revision(&revision);
            match inner.state.buffer_mut() {
                Some(buffer) if buffer.targets_revision(&revision_id) => {
                    buffer.version = revision.version;
                    buffer.mark_persisted(&saved);
                    buffer.clone()
                }
                _ => {
                    debug!(revision = %revision_id, "save resolved after buffer switch");
                    EditBuffer::from_revision(document, &revision)
                }
            }
        }))
    }

    async fn create_document(
        &self,
        local_id: u64,
        slug: String,
        title: String,
        saved: String,
    ) -> EditorResult<EditBuffer> {
        let _guard = self.begin(format!("{}:{}", NEW_REVISION, local_id))?;

        let revision = self
            .store
            .create_document(CreateDocument {
                slug: slug.clone(),
                title: title.clone(),
                mdx_source: saved.clone(),
            })
            .await?;
        let document = Document {
            id: revision.document_id.clone(),
            slug,
            title,
            status: DocumentStatus::Active,
        };
        info!(document = %document.id, slug = %document.slug, "created document");

        Ok(self.update(|inner| {
            inner.listing.push(DocumentWithRevision {
                document: document.clone(),
                latest_revision: Some(revision.clone()),
            });

            let created = inner
                .state
                .buffer()
                .filter(|buffer| buffer.targets_new(local_id))
                .map(|buffer| buffer.clone().into_created(document.clone(), &revision, &saved));
            match created {
                Some(buffer) => {
                    inner.state = EditorState::Viewing(buffer.clone());
                    buffer
                }
                None => EditBuffer::from_revision(document, &revision),
            }
        }))
    }

    /// Fails with `Conflict` when the store's latest revision moved on
    async fn ensure_latest(&self, document_id: &DocumentId, revision_id: &RevisionId) -> EditorResult<()> {
        let listing = self.store.list_documents_with_latest_revision().await?;
        let latest = listing
            .iter()
            .find(|entry| &entry.document.id == document_id)
            .map(|entry| entry.latest_revision.as_ref().map(|revision| revision.id.clone()));

        match latest {
            None => Err(EditorError::NotFound(format!("document {}", document_id))),
            Some(Some(latest)) if &latest == revision_id => Ok(()),
            Some(latest) => {
                let latest = latest.as_ref().map_or("none", RevisionId::as_str);
                debug!(document = %document_id, %revision_id, latest, "stale revision pointer");
                Err(EditorError::Conflict(format!(
                    "latest revision of {} is {}, not {}",
                    document_id, latest, revision_id
                )))
            }
        }
    }

    /// Publish the saved draft. Unsaved edits are rejected, never auto-saved.
    pub async fn publish(&self) -> EditorResult<PublishReceipt> {
        let snapshot = self.active()?;
        let revision_id = snapshot
            .revision_id()
            .cloned()
            .ok_or(EditorError::UnsavedChanges)?;
        if snapshot.state != RevisionState::Draft {
            return Err(EditorError::NotDraft(snapshot.state));
        }
        if snapshot.dirty {
            return Err(EditorError::UnsavedChanges);
        }

        let _guard = self.begin(revision_id.as_str())?;
        let receipt = self.store.publish_revision(&revision_id).await?;
        info!(
            revision = %revision_id,
            artifacts = receipt.derived_artifact_count,
            "published revision"
        );

        self.update(|inner| {
            inner.record_published(&revision_id);
            if let Some(buffer) = inner.state.buffer_mut() {
                if buffer.targets_revision(&revision_id) {
                    buffer.state = RevisionState::Published;
                }
            }
        });
        Ok(receipt)
    }

    /// Fork a new draft from the published revision being viewed
    pub async fn create_draft(&self) -> EditorResult<EditBuffer> {
        let snapshot = self.active()?;
        let (document, revision_id) = match &snapshot.target {
            BufferTarget::Existing {
                document,
                revision_id,
            } if snapshot.state == RevisionState::Published => (document.clone(), revision_id.clone()),
            _ => return Err(EditorError::NotPublished),
        };

        let _guard = self.begin(revision_id.as_str())?;
        let draft = self.store.create_draft(&document.id).await?;
        info!(document = %document.id, version = draft.version, "forked draft");

        Ok(self.update(|inner| {
            inner.record_revision(&draft);

            let forked = inner
                .state
                .buffer()
                .filter(|buffer| buffer.targets_revision(&revision_id))
                .map(|buffer| buffer.forked(&draft));
            match forked {
                Some(buffer) => {
                    inner.state = EditorState::Viewing(buffer.clone());
                    buffer
                }
                None => EditBuffer::from_revision(document, &draft),
            }
        }))
    }

    /// Copy the active document under `new_slug`. The active buffer is untouched.
    pub async fn duplicate(&self, new_slug: &str) -> EditorResult<Document> {
        let snapshot = self.active()?;
        let document_id = snapshot
            .document_id()
            .cloned()
            .ok_or(EditorError::NotPersisted)?;

        let copy = self.store.duplicate_document(&document_id, new_slug).await?;
        let document = copy.document.clone();
        info!(source = %document_id, document = %document.id, slug = %document.slug, "duplicated document");

        self.update(|inner| inner.listing.push(copy));
        Ok(document)
    }

    pub async fn archive(&self, document_id: &DocumentId) -> EditorResult<()> {
        let _guard = self.begin(document_id.as_str())?;
        self.store.archive_document(document_id).await?;
        info!(document = %document_id, "archived document");

        self.update(|inner| {
            inner.record_status(document_id, DocumentStatus::Archived);
            inner.clear_if_showing(document_id);
        });
        Ok(())
    }

    pub async fn restore(&self, document_id: &DocumentId) -> EditorResult<()> {
        let _guard = self.begin(document_id.as_str())?;
        self.store.restore_document(document_id).await?;
        info!(document = %document_id, "restored document");

        self.update(|inner| inner.record_status(document_id, DocumentStatus::Active));
        Ok(())
    }

    /// Remove the document and every revision. Irreversible.
    pub async fn hard_delete(&self, document_id: &DocumentId) -> EditorResult<()> {
        let _guard = self.begin(document_id.as_str())?;
        self.store.delete_document(document_id).await?;
        info!(document = %document_id, "deleted document");

        self.update(|inner| {
            inner.listing.retain(|entry| &entry.document.id != document_id);
            inner.clear_if_showing(document_id);
        });
        Ok(())
    }

    /// Change the active document's title, whatever the revision state
    pub async fn rename(&self, new_title: &str) -> EditorResult<()> {
        let snapshot = self.active()?;
        let revision_id = match &snapshot.target {
            BufferTarget::New { local_id, .. } => {
                if new_title.trim().is_empty() {
                    return Err(EditorError::Validation("title must not be empty".to_string()));
                }
                let local_id = *local_id;
                self.update_new(local_id, |buffer| buffer.set_local_title(new_title));
                return Ok(());
            }
            BufferTarget::Existing { revision_id, .. } => revision_id.clone(),
        };

        let _guard = self.begin(revision_id.as_str())?;
        let revision = self
            .store
            .update_revision(UpdateRevision {
                revision_id,
                mdx_source: None,
                title: Some(new_title.to_string()),
            })
            .await?;
        info!(document = %revision.document_id, title = new_title, "renamed document");

        self.update(|inner| {
            if let Some(entry) = inner.entry_mut(&revision.document_id) {
                entry.document.title = new_title.to_string();
            }
            if let Some(buffer) = inner.state.buffer_mut() {
                if buffer.targets_document(&revision.document_id) {
                    buffer.set_local_title(new_title);
                }
            }
        });
        Ok(())
    }

    /// Change the active document's slug; fails with `SlugConflict` on collision
    pub async fn reslug(&self, new_slug: &str) -> EditorResult<()> {
        let snapshot = self.active()?;
        let document_id = match &snapshot.target {
            BufferTarget::New { local_id, .. } => {
                if !is_valid_slug(new_slug) {
                    return Err(EditorError::Validation(format!("invalid slug '{}'", new_slug)));
                }
                let local_id = *local_id;
                self.update_new(local_id, |buffer| buffer.set_local_slug(new_slug));
                return Ok(());
            }
            BufferTarget::Existing { document, .. } => document.id.clone(),
        };

        let _guard = self.begin(document_id.as_str())?;
        let document = self
            .store
            .update_document(UpdateDocument {
                document_id,
                slug: Some(new_slug.to_string()),
            })
            .await?;
        info!(document = %document.id, slug = %document.slug, "changed slug");

        self.update(|inner| {
            inner.record_document(&document);
            if let Some(current) = inner.state.buffer_mut().and_then(EditBuffer::document_mut) {
                if current.id == document.id {
                    *current = document.clone();
                }
            }
        });
        Ok(())
    }

    fn update_new(&self, local_id: u64, f: impl FnOnce(&mut EditBuffer)) {
        self.update(|inner| {
            if let Some(buffer) = inner.state.buffer_mut() {
                if buffer.targets_new(local_id) {
                    f(buffer);
                }
            }
        });
    }
}
