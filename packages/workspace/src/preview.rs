//! # Preview Session
//!
//! One editor, one compile pipeline and one theme overlay, kept in step:
//!
//! ```text
//! edit ──────────→ RevisionStateMachine ──→ pipeline.schedule(source)
//! select / switch ─→ RevisionStateMachine ──→ pipeline.invalidate() + schedule
//! set_token ─────→ ThemeTokenOverlay ────→ next frame → surface
//! ```
//!
//! Every method that may schedule a compile must run inside a tokio runtime.

use crate::{WorkspaceConfig, WorkspaceResult};
use folio_compiler::{
    CompilationPipeline, CompilationResult, CompilerService, PendingCompile, PreviewOutput,
};
use folio_editor::{BufferTarget, EditBuffer, EditorResult, EditorState, RevisionStateMachine};
use folio_store::{
    Document, DocumentId, DocumentStore, DocumentWithRevision, PublishReceipt, ThemeStore,
};
use folio_theme::{ApplyOutcome, SaveReport, Surface, ThemeTokenOverlay};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Identity of the buffer a preview belongs to
fn buffer_key(buffer: &EditBuffer) -> String {
    match &buffer.target {
        BufferTarget::New { local_id, .. } => format!("new:{}", local_id),
        BufferTarget::Existing { revision_id, .. } => revision_id.to_string(),
    }
}

#[derive(Debug)]
pub struct PreviewSession {
    editor: RevisionStateMachine,
    pipeline: CompilationPipeline,
    overlay: ThemeTokenOverlay,
}

impl PreviewSession {
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: DocumentStore + ThemeStore + 'static,
    {
        Self::from_parts(
            RevisionStateMachine::new(store.clone()),
            CompilationPipeline::new(Arc::new(CompilerService::mdx())),
            ThemeTokenOverlay::new(store),
        )
    }

    /// Session configured from `folio.config.json` semantics
    pub fn from_config<S>(store: Arc<S>, config: &WorkspaceConfig, cwd: &Path) -> WorkspaceResult<Self>
    where
        S: DocumentStore + ThemeStore + 'static,
    {
        let overlay = ThemeTokenOverlay::with_baseline(store.clone(), config.baseline(cwd)?)
            .with_style_id(&config.style_element_id);
        let pipeline =
            CompilationPipeline::with_debounce(Arc::new(CompilerService::mdx()), config.debounce());

        Ok(Self::from_parts(
            RevisionStateMachine::new(store),
            pipeline,
            overlay,
        ))
    }

    pub fn from_parts(
        editor: RevisionStateMachine,
        pipeline: CompilationPipeline,
        overlay: ThemeTokenOverlay,
    ) -> Self {
        Self {
            editor,
            pipeline,
            overlay,
        }
    }

    pub fn pipeline(&self) -> &CompilationPipeline {
        &self.pipeline
    }

    pub fn overlay(&self) -> &ThemeTokenOverlay {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut ThemeTokenOverlay {
        &mut self.overlay
    }

    pub fn state(&self) -> EditorState {
        self.editor.state()
    }

    pub fn preview(&self) -> watch::Receiver<PreviewOutput> {
        self.pipeline.subscribe()
    }

    pub fn latest_preview(&self) -> Option<CompilationResult> {
        self.pipeline.latest()
    }

    pub fn listing(&self) -> Vec<DocumentWithRevision> {
        self.editor.listing()
    }

    pub fn active_documents(&self) -> Vec<DocumentWithRevision> {
        self.editor.active_documents()
    }

    pub fn archived_documents(&self) -> Vec<DocumentWithRevision> {
        self.editor.archived_documents()
    }

    /// Editor state snapshots; transitions go through the session
    pub fn subscribe(&self) -> watch::Receiver<EditorState> {
        self.editor.subscribe()
    }

    /// Bring the preview in line with the buffer after an editor transition.
    /// A different buffer drops everything compiled or pending for the old one.
    fn follow(&self, before: &EditorState) {
        let after = self.editor.state();
        match (before.buffer(), after.buffer()) {
            (Some(previous), Some(current)) if buffer_key(previous) == buffer_key(current) => {
                if previous.mdx_source != current.mdx_source {
                    self.pipeline.schedule(current.mdx_source.clone());
                }
            }
            (None, None) => {}
            (_, current) => {
                debug!(
                    from = ?before.buffer().map(EditBuffer::revision_key),
                    to = ?current.map(EditBuffer::revision_key),
                    "active buffer changed"
                );
                self.pipeline.invalidate();
                if let Some(current) = current {
                    self.pipeline.schedule(current.mdx_source.clone());
                }
            }
        }
    }

    async fn tracked<T>(&self, operation: impl Future<Output = EditorResult<T>>) -> WorkspaceResult<T> {
        let before = self.editor.state();
        let outcome = operation.await;
        self.follow(&before);
        Ok(outcome?)
    }

    pub async fn refresh(&self) -> WorkspaceResult<Vec<DocumentWithRevision>> {
        self.tracked(self.editor.refresh()).await
    }

    pub fn select(&self, entry: &DocumentWithRevision) -> EditBuffer {
        let before = self.editor.state();
        let buffer = self.editor.select(entry);
        self.follow(&before);
        buffer
    }

    pub fn select_document(&self, document_id: &DocumentId) -> WorkspaceResult<EditBuffer> {
        let before = self.editor.state();
        let buffer = self.editor.select_document(document_id)?;
        self.follow(&before);
        Ok(buffer)
    }

    pub fn start_new(&self, slug: &str, title: &str) -> EditBuffer {
        let before = self.editor.state();
        let buffer = self.editor.start_new(slug, title);
        self.follow(&before);
        buffer
    }

    pub fn clear_selection(&self) {
        let before = self.editor.state();
        self.editor.clear_selection();
        self.follow(&before);
    }

    /// Update the working copy and schedule a preview compile
    pub fn edit(&self, source: impl Into<String>) -> WorkspaceResult<PendingCompile> {
        let source = source.into();
        self.editor.edit(source.clone())?;
        Ok(self.pipeline.schedule(source))
    }

    /// Saving never switches buffers; a sentinel buffer turning into the
    /// document it created keeps its preview.
    pub async fn save_draft(&self) -> WorkspaceResult<EditBuffer> {
        Ok(self.editor.save_draft().await?)
    }

    pub async fn publish(&self) -> WorkspaceResult<PublishReceipt> {
        Ok(self.editor.publish().await?)
    }

    pub async fn create_draft(&self) -> WorkspaceResult<EditBuffer> {
        self.tracked(self.editor.create_draft()).await
    }

    pub async fn archive(&self, document_id: &DocumentId) -> WorkspaceResult<()> {
        self.tracked(self.editor.archive(document_id)).await
    }

    pub async fn restore(&self, document_id: &DocumentId) -> WorkspaceResult<()> {
        self.tracked(self.editor.restore(document_id)).await
    }

    pub async fn hard_delete(&self, document_id: &DocumentId) -> WorkspaceResult<()> {
        self.tracked(self.editor.hard_delete(document_id)).await
    }

    pub async fn duplicate(&self, new_slug: &str) -> WorkspaceResult<Document> {
        self.tracked(self.editor.duplicate(new_slug)).await
    }

    pub async fn rename(&self, new_title: &str) -> WorkspaceResult<()> {
        self.tracked(self.editor.rename(new_title)).await
    }

    pub async fn reslug(&self, new_slug: &str) -> WorkspaceResult<()> {
        self.tracked(self.editor.reslug(new_slug)).await
    }

    pub async fn load_theme(&mut self) -> WorkspaceResult<()> {
        Ok(self.overlay.load().await?)
    }

    pub fn set_token(&mut self, name: &str, value: &str) -> WorkspaceResult<()> {
        Ok(self.overlay.set_local(name, value)?)
    }

    pub async fn save_theme(&mut self) -> SaveReport {
        self.overlay.save_all().await
    }

    /// Render-frame hook of the embedding layer
    pub fn render_frame(&mut self, surface: &mut dyn Surface) -> Option<ApplyOutcome> {
        self.overlay.flush_frame(surface)
    }

    /// The surface's stylesheet list may have changed
    pub fn surface_changed(&mut self, surface: &mut dyn Surface) -> ApplyOutcome {
        self.overlay.on_surface_changed(surface)
    }
}
