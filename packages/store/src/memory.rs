//! # In-Memory Store
//!
//! Process-local implementation of the documents/themes API. It enforces the
//! same record rules as the remote service so the editor can be exercised
//! without a gateway:
//!
//! - slugs are URL-safe and unique among ACTIVE documents
//! - versions grow by exactly one per forked draft
//! - a document has at most one DRAFT revision
//! - PUBLISHED revisions are immutable
//!
//! Failures can be injected per operation for exercising error paths.

use crate::{
    is_valid_slug, CreateDocument, Document, DocumentId, DocumentStatus, DocumentStore,
    DocumentWithRevision, PublishReceipt, Revision, RevisionId, RevisionState, StoreError,
    StoreResult, ThemeStore, ThemeTokenRecord, UpdateDocument, UpdateRevision,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// Store operations, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    CreateDocument,
    UpdateRevision,
    UpdateDocument,
    Publish,
    CreateDraft,
    Duplicate,
    Archive,
    Restore,
    Delete,
    GetThemeTokens,
    SetThemeToken,
}

#[derive(Debug, Default)]
struct Records {
    next_id: u64,
    documents: BTreeMap<DocumentId, Document>,
    /// Revisions per document, ordered by version
    revisions: BTreeMap<DocumentId, Vec<Revision>>,
    theme_tokens: BTreeMap<String, String>,
    failures: VecDeque<(StoreOp, StoreError)>,
    rejected_tokens: HashSet<String>,
    latency: Option<Duration>,
    calls: Vec<StoreOp>,
}

impl Records {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn take_failure(&mut self, op: StoreOp) -> StoreResult<()> {
        self.calls.push(op);
        if let Some(index) = self.failures.iter().position(|(target, _)| *target == op) {
            if let Some((_, error)) = self.failures.remove(index) {
                debug!(?op, %error, "injected store failure");
                return Err(error);
            }
        }
        Ok(())
    }

    fn document(&self, id: &DocumentId) -> StoreResult<&Document> {
        self.documents
            .get(id)
            .ok_or_else(|| StoreError::not_found(format!("document {}", id)))
    }

    fn slug_taken(&self, slug: &str, except: Option<&DocumentId>) -> bool {
        self.documents
            .values()
            .any(|d| d.is_active() && d.slug == slug && Some(&d.id) != except)
    }

    fn check_slug(&self, slug: &str, except: Option<&DocumentId>) -> StoreResult<()> {
        if !is_valid_slug(slug) {
            return Err(StoreError::validation(format!("invalid slug '{}'", slug)));
        }
        if self.slug_taken(slug, except) {
            return Err(StoreError::SlugConflict(slug.to_string()));
        }
        Ok(())
    }

    fn latest(&self, id: &DocumentId) -> Option<&Revision> {
        self.revisions.get(id).and_then(|revs| revs.last())
    }

    fn find_revision_mut(&mut self, id: &RevisionId) -> StoreResult<&mut Revision> {
        self.revisions
            .values_mut()
            .flat_map(|revs| revs.iter_mut())
            .find(|rev| &rev.id == id)
            .ok_or_else(|| StoreError::not_found(format!("revision {}", id)))
    }

    fn insert_document(&mut self, slug: String, title: String, mdx_source: String) -> Revision {
        let document_id = DocumentId::new(self.next_id("doc"));
        let revision = Revision {
            id: RevisionId::new(self.next_id("rev")),
            document_id: document_id.clone(),
            version: 1,
            state: RevisionState::Draft,
            mdx_source,
            updated_at: Utc::now(),
            published_at: None,
        };

        self.documents.insert(
            document_id.clone(),
            Document {
                id: document_id.clone(),
                slug,
                title,
                status: DocumentStatus::Active,
            },
        );
        self.revisions.insert(document_id, vec![revision.clone()]);
        revision
    }
}

/// Shared in-memory documents/themes service
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<Records>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fail the next call of `op` with `error`
    pub fn fail_next(&self, op: StoreOp, error: StoreError) {
        self.records().failures.push_back((op, error));
    }

    /// Reject every `set_theme_token` call for `name`
    pub fn reject_token(&self, name: impl Into<String>) {
        self.records().rejected_tokens.insert(name.into());
    }

    /// Delay every call by `latency` before it touches the records
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.records().latency = latency;
    }

    /// Operations received so far, in arrival order
    pub fn calls(&self) -> Vec<StoreOp> {
        self.records().calls.clone()
    }

    pub fn revisions(&self, document_id: &DocumentId) -> Vec<Revision> {
        self.records()
            .revisions
            .get(document_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn document(&self, document_id: &DocumentId) -> Option<Document> {
        self.records().documents.get(document_id).cloned()
    }

    pub fn seed_theme_token(&self, name: impl Into<String>, value: impl Into<String>) {
        self.records().theme_tokens.insert(name.into(), value.into());
    }

    pub fn theme_token(&self, name: &str) -> Option<String> {
        self.records().theme_tokens.get(name).cloned()
    }

    async fn round_trip(&self, op: StoreOp) -> StoreResult<()> {
        let latency = self.records().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.records().take_failure(op)
    }
}

/// Blank-line separated blocks; stands in for the search chunks the service derives
fn derived_artifacts(source: &str) -> u32 {
    source
        .split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .count() as u32
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_documents_with_latest_revision(&self) -> StoreResult<Vec<DocumentWithRevision>> {
        self.round_trip(StoreOp::List).await?;
        let records = self.records();

        Ok(records
            .documents
            .values()
            .map(|document| DocumentWithRevision {
                document: document.clone(),
                latest_revision: records.latest(&document.id).cloned(),
            })
            .collect())
    }

    async fn create_document(&self, request: CreateDocument) -> StoreResult<Revision> {
        self.round_trip(StoreOp::CreateDocument).await?;
        let mut records = self.records();

        records.check_slug(&request.slug, None)?;
        if request.title.trim().is_empty() {
            return Err(StoreError::validation("title must not be empty"));
        }

        let revision = records.insert_document(request.slug, request.title, request.mdx_source);
        debug!(document = %revision.document_id, revision = %revision.id, "created document");
        Ok(revision)
    }

    async fn update_revision(&self, request: UpdateRevision) -> StoreResult<Revision> {
        self.round_trip(StoreOp::UpdateRevision).await?;
        let mut records = self.records();

        if matches!(&request.title, Some(title) if title.trim().is_empty()) {
            return Err(StoreError::validation("title must not be empty"));
        }

        let revision = records.find_revision_mut(&request.revision_id)?;
        if request.mdx_source.is_some() && revision.state == RevisionState::Published {
            return Err(StoreError::validation(format!(
                "revision {} is published and cannot be edited",
                revision.id
            )));
        }

        if let Some(source) = request.mdx_source {
            revision.mdx_source = source;
        }
        revision.updated_at = Utc::now();
        let updated = revision.clone();

        if let Some(title) = request.title {
            if let Some(document) = records.documents.get_mut(&updated.document_id) {
                document.title = title;
            }
        }

        Ok(updated)
    }

    async fn update_document(&self, request: UpdateDocument) -> StoreResult<Document> {
        self.round_trip(StoreOp::UpdateDocument).await?;
        let mut records = self.records();

        records.document(&request.document_id)?;
        if let Some(slug) = &request.slug {
            records.check_slug(slug, Some(&request.document_id))?;
        }

        let document = records
            .documents
            .get_mut(&request.document_id)
            .ok_or_else(|| StoreError::not_found(format!("document {}", request.document_id)))?;
        if let Some(slug) = request.slug {
            document.slug = slug;
        }
        Ok(document.clone())
    }

    async fn publish_revision(&self, revision_id: &RevisionId) -> StoreResult<PublishReceipt> {
        self.round_trip(StoreOp::Publish).await?;
        let mut records = self.records();

        let revision = records.find_revision_mut(revision_id)?;
        if revision.state == RevisionState::Published {
            return Err(StoreError::validation(format!(
                "revision {} is already published",
                revision_id
            )));
        }

        let now = Utc::now();
        revision.state = RevisionState::Published;
        revision.published_at = Some(now);
        revision.updated_at = now;

        Ok(PublishReceipt {
            revision_id: revision_id.clone(),
            derived_artifact_count: derived_artifacts(&revision.mdx_source),
        })
    }

    async fn create_draft(&self, document_id: &DocumentId) -> StoreResult<Revision> {
        self.round_trip(StoreOp::CreateDraft).await?;
        let mut records = self.records();

        records.document(document_id)?;
        let latest = records
            .latest(document_id)
            .cloned()
            .ok_or_else(|| StoreError::validation("document has no revisions"))?;
        if latest.state != RevisionState::Published {
            return Err(StoreError::Conflict(format!(
                "document {} already has draft {}",
                document_id, latest.id
            )));
        }

        let draft = Revision {
            id: RevisionId::new(records.next_id("rev")),
            document_id: document_id.clone(),
            version: latest.version + 1,
            state: RevisionState::Draft,
            mdx_source: latest.mdx_source,
            updated_at: Utc::now(),
            published_at: None,
        };
        records
            .revisions
            .entry(document_id.clone())
            .or_default()
            .push(draft.clone());
        Ok(draft)
    }

    async fn duplicate_document(
        &self,
        document_id: &DocumentId,
        new_slug: &str,
    ) -> StoreResult<DocumentWithRevision> {
        self.round_trip(StoreOp::Duplicate).await?;
        let mut records = self.records();

        let source = records.document(document_id)?.clone();
        records.check_slug(new_slug, None)?;
        let mdx_source = records
            .latest(document_id)
            .map(|rev| rev.mdx_source.clone())
            .unwrap_or_default();

        let revision = records.insert_document(
            new_slug.to_string(),
            format!("{} (copy)", source.title),
            mdx_source,
        );
        let document = records.document(&revision.document_id)?.clone();
        Ok(DocumentWithRevision {
            document,
            latest_revision: Some(revision),
        })
    }

    async fn archive_document(&self, document_id: &DocumentId) -> StoreResult<()> {
        self.round_trip(StoreOp::Archive).await?;
        let mut records = self.records();

        let document = records
            .documents
            .get_mut(document_id)
            .ok_or_else(|| StoreError::not_found(format!("document {}", document_id)))?;
        document.status = DocumentStatus::Archived;
        Ok(())
    }

    async fn restore_document(&self, document_id: &DocumentId) -> StoreResult<()> {
        self.round_trip(StoreOp::Restore).await?;
        let mut records = self.records();

        let slug = records.document(document_id)?.slug.clone();
        if records.slug_taken(&slug, Some(document_id)) {
            return Err(StoreError::SlugConflict(slug));
        }
        if let Some(document) = records.documents.get_mut(document_id) {
            document.status = DocumentStatus::Active;
        }
        Ok(())
    }

    async fn delete_document(&self, document_id: &DocumentId) -> StoreResult<()> {
        self.round_trip(StoreOp::Delete).await?;
        let mut records = self.records();

        records
            .documents
            .remove(document_id)
            .ok_or_else(|| StoreError::not_found(format!("document {}", document_id)))?;
        records.revisions.remove(document_id);
        Ok(())
    }
}

#[async_trait]
impl ThemeStore for MemoryStore {
    async fn get_theme_tokens(&self) -> StoreResult<Vec<ThemeTokenRecord>> {
        self.round_trip(StoreOp::GetThemeTokens).await?;

        Ok(self
            .records()
            .theme_tokens
            .iter()
            .map(|(name, value)| ThemeTokenRecord::new(name.clone(), value.clone()))
            .collect())
    }

    async fn set_theme_token(&self, token: ThemeTokenRecord) -> StoreResult<()> {
        self.round_trip(StoreOp::SetThemeToken).await?;
        let mut records = self.records();

        if records.rejected_tokens.contains(&token.name) {
            return Err(StoreError::validation(format!(
                "token '{}' was rejected",
                token.name
            )));
        }
        records.theme_tokens.insert(token.name, token.value);
        Ok(())
    }
}
