//! # Collaborator Contract
//!
//! Request/response shapes of the documents/themes API. Every call is an
//! awaited round-trip and may fail with a transport or validation error.

use crate::{
    Document, DocumentId, DocumentWithRevision, PublishReceipt, Revision, RevisionId,
    StoreResult, ThemeTokenRecord,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocument {
    pub slug: String,
    pub title: String,
    pub mdx_source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRevision {
    pub revision_id: RevisionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mdx_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocument {
    pub document_id: DocumentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents_with_latest_revision(&self) -> StoreResult<Vec<DocumentWithRevision>>;

    /// Creates the document together with its v1 DRAFT revision
    async fn create_document(&self, request: CreateDocument) -> StoreResult<Revision>;

    async fn update_revision(&self, request: UpdateRevision) -> StoreResult<Revision>;

    async fn update_document(&self, request: UpdateDocument) -> StoreResult<Document>;

    async fn publish_revision(&self, revision_id: &RevisionId) -> StoreResult<PublishReceipt>;

    /// Forks a new DRAFT from the latest PUBLISHED revision
    async fn create_draft(&self, document_id: &DocumentId) -> StoreResult<Revision>;

    /// Copies the latest revision's source into a new document with a v1 DRAFT
    async fn duplicate_document(
        &self,
        document_id: &DocumentId,
        new_slug: &str,
    ) -> StoreResult<DocumentWithRevision>;

    async fn archive_document(&self, document_id: &DocumentId) -> StoreResult<()>;

    async fn restore_document(&self, document_id: &DocumentId) -> StoreResult<()>;

    async fn delete_document(&self, document_id: &DocumentId) -> StoreResult<()>;
}

#[async_trait]
pub trait ThemeStore: Send + Sync {
    async fn get_theme_tokens(&self) -> StoreResult<Vec<ThemeTokenRecord>>;

    async fn set_theme_token(&self, token: ThemeTokenRecord) -> StoreResult<()>;
}
