//! # Edit Buffer
//!
//! Client-local working copy of one revision.
//!
//! A buffer either targets a revision the store already knows about, or is
//! the sentinel "new" buffer that turns into a document on its first save.
//!
//! ## Lifecycle
//!
//! ```text
//! select ─→ clean ─edit─→ dirty ─save─→ clean ─publish─→ published
//!                                                           │
//!             draft (version + 1) ←──────── create_draft ───┘
//! ```
//!
//! Transitions here are pure; the state machine in `session` performs the
//! store round-trips and then applies them.

use folio_store::{Document, DocumentId, DocumentWithRevision, Revision, RevisionId, RevisionState};
use serde::Serialize;

/// Revision key shown for a buffer that has never been saved
pub const NEW_REVISION: &str = "new";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BufferTarget {
    /// Not persisted yet; saving creates the document and its v1 draft
    New {
        /// Session-local identity, so a late save result can find its buffer
        local_id: u64,
        slug: String,
        title: String,
    },
    Existing {
        document: Document,
        revision_id: RevisionId,
    },
}

/// Working copy of the revision being edited
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBuffer {
    pub target: BufferTarget,
    pub version: u32,
    pub state: RevisionState,
    pub mdx_source: String,
    pub dirty: bool,

    /// Last text fetched from or written to the store for this revision
    #[serde(skip)]
    persisted_source: String,
}

impl EditBuffer {
    /// Clean buffer over a stored revision
    pub fn from_revision(document: Document, revision: &Revision) -> Self {
        Self {
            target: BufferTarget::Existing {
                document,
                revision_id: revision.id.clone(),
            },
            version: revision.version,
            state: revision.state,
            mdx_source: revision.mdx_source.clone(),
            persisted_source: revision.mdx_source.clone(),
            dirty: false,
        }
    }

    /// Empty sentinel buffer
    pub fn new_document(local_id: u64, slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            target: BufferTarget::New {
                local_id,
                slug: slug.into(),
                title: title.into(),
            },
            version: 0,
            state: RevisionState::Draft,
            mdx_source: String::new(),
            persisted_source: String::new(),
            dirty: false,
        }
    }

    /// Buffer for a listing entry. A document without any revision gets the
    /// sentinel buffer under its own slug and title.
    pub fn from_listing(entry: &DocumentWithRevision, local_id: u64) -> Self {
        match &entry.latest_revision {
            Some(revision) => Self::from_revision(entry.document.clone(), revision),
            None => Self::new_document(local_id, &entry.document.slug, &entry.document.title),
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self.target, BufferTarget::New { .. })
    }

    pub fn revision_id(&self) -> Option<&RevisionId> {
        match &self.target {
            BufferTarget::Existing { revision_id, .. } => Some(revision_id),
            BufferTarget::New { .. } => None,
        }
    }

    /// Revision id, or the "new" sentinel
    pub fn revision_key(&self) -> &str {
        self.revision_id().map_or(NEW_REVISION, RevisionId::as_str)
    }

    pub fn document(&self) -> Option<&Document> {
        match &self.target {
            BufferTarget::Existing { document, .. } => Some(document),
            BufferTarget::New { .. } => None,
        }
    }

    pub fn document_id(&self) -> Option<&DocumentId> {
        self.document().map(|document| &document.id)
    }

    pub fn slug(&self) -> &str {
        match &self.target {
            BufferTarget::New { slug, .. } => slug,
            BufferTarget::Existing { document, .. } => &document.slug,
        }
    }

    pub fn title(&self) -> &str {
        match &self.target {
            BufferTarget::New { title, .. } => title,
            BufferTarget::Existing { document, .. } => &document.title,
        }
    }

    pub fn persisted_source(&self) -> &str {
        &self.persisted_source
    }

    pub fn edit(&mut self, source: impl Into<String>) {
        self.mdx_source = source.into();
        self.dirty = true;
    }

    /// Record that `saved` reached the store. Edits made while the save was
    /// in flight keep the buffer dirty. A clean buffer holds no user edits,
    /// so it takes the saved text even if it was reopened from an older copy.
    pub fn mark_persisted(&mut self, saved: &str) {
        if !self.dirty {
            self.mdx_source = saved.to_string();
        }
        self.persisted_source = saved.to_string();
        self.dirty = self.mdx_source != saved;
    }

    /// Whether a result for `revision_id` belongs to this buffer
    pub fn targets_revision(&self, revision_id: &RevisionId) -> bool {
        self.revision_id() == Some(revision_id)
    }

    pub fn targets_document(&self, document_id: &DocumentId) -> bool {
        self.document_id() == Some(document_id)
    }

    pub fn targets_new(&self, id: u64) -> bool {
        matches!(self.target, BufferTarget::New { local_id, .. } if local_id == id)
    }

    /// Sentinel buffer after its first save: the created revision becomes the target
    pub(crate) fn into_created(mut self, document: Document, revision: &Revision, saved: &str) -> Self {
        self.target = BufferTarget::Existing {
            document,
            revision_id: revision.id.clone(),
        };
        self.version = revision.version;
        self.state = revision.state;
        self.mark_persisted(saved);
        self
    }

    /// Forked draft replacing a published buffer; local edits carry over
    pub(crate) fn forked(&self, draft: &Revision) -> Self {
        let document = self.document().cloned();
        let mut next = match document {
            Some(document) => Self::from_revision(document, draft),
            None => return self.clone(),
        };
        if self.dirty {
            next.mdx_source = self.mdx_source.clone();
            next.dirty = next.mdx_source != next.persisted_source;
        }
        next
    }

    pub(crate) fn document_mut(&mut self) -> Option<&mut Document> {
        match &mut self.target {
            BufferTarget::Existing { document, .. } => Some(document),
            BufferTarget::New { .. } => None,
        }
    }

    pub(crate) fn set_local_title(&mut self, new_title: &str) {
        match &mut self.target {
            BufferTarget::New { title, .. } => *title = new_title.to_string(),
            BufferTarget::Existing { document, .. } => document.title = new_title.to_string(),
        }
    }

    pub(crate) fn set_local_slug(&mut self, new_slug: &str) {
        match &mut self.target {
            BufferTarget::New { slug, .. } => *slug = new_slug.to_string(),
            BufferTarget::Existing { document, .. } => document.slug = new_slug.to_string(),
        }
    }
}

/// What the editor is showing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "buffer", rename_all = "camelCase")]
pub enum EditorState {
    #[default]
    NoneSelected,
    Viewing(EditBuffer),
}

impl EditorState {
    pub fn buffer(&self) -> Option<&EditBuffer> {
        match self {
            EditorState::Viewing(buffer) => Some(buffer),
            EditorState::NoneSelected => None,
        }
    }

    pub(crate) fn buffer_mut(&mut self) -> Option<&mut EditBuffer> {
        match self {
            EditorState::Viewing(buffer) => Some(buffer),
            EditorState::NoneSelected => None,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.buffer().map_or(false, |buffer| buffer.dirty)
    }
}
