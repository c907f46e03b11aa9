//! Editor, pipeline and theme overlay working together

use folio_compiler::{CompilationResult, RenderNode};
use folio_editor::EditorState;
use folio_fences::{normalize, Language};
use folio_store::{MemoryStore, RevisionState};
use folio_theme::{ApplyOutcome, MemorySurface, DEFAULT_STYLE_ID};
use folio_workspace::{PreviewSession, WorkspaceConfig, DEFAULT_CONFIG_NAME};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn first_heading(result: Option<CompilationResult>) -> Option<String> {
    result?
        .compiled()?
        .headings
        .first()
        .map(|heading| heading.text.clone())
}

async fn settle() {
    sleep(Duration::from_millis(400)).await;
}

#[tokio::test(start_paused = true)]
async fn test_publish_scenario_with_normalized_fences() {
    let store = Arc::new(MemoryStore::new());
    let session = PreviewSession::new(store.clone());
    let source = "# Hi\n```js\nconsole.log(1)\n```";

    let normalized = normalize(source);
    assert_eq!(normalized.changed_count, 1);
    assert_eq!(normalized.normalized, "# Hi\n```javascript\nconsole.log(1)\n```");

    session.start_new("intro", "Intro");
    session.edit(normalized.normalized.clone()).unwrap();
    let saved = session.save_draft().await.unwrap();
    assert_eq!((saved.version, saved.state), (1, RevisionState::Draft));

    settle().await;
    let preview = session.latest_preview().unwrap();
    let nodes = &preview.compiled().unwrap().render_tree.nodes;
    assert!(matches!(
        &nodes[1],
        RenderNode::CodeBlock { language: Language::Javascript, code, .. } if code == "console.log(1)"
    ));

    session.publish().await.unwrap();
    let draft = session.create_draft().await.unwrap();
    assert_eq!((draft.version, draft.state), (2, RevisionState::Draft));
    assert_eq!(draft.mdx_source, normalized.normalized);

    settle().await;
    assert_eq!(first_heading(session.latest_preview()).as_deref(), Some("Hi"));
}

#[tokio::test(start_paused = true)]
async fn test_first_save_keeps_preview() {
    let session = PreviewSession::new(Arc::new(MemoryStore::new()));

    session.start_new("intro", "Intro");
    session.edit("# Intro").unwrap();
    settle().await;
    assert!(session.latest_preview().is_some());

    session.save_draft().await.unwrap();
    assert_eq!(first_heading(session.latest_preview()).as_deref(), Some("Intro"));
}

#[tokio::test(start_paused = true)]
async fn test_edits_are_debounced() {
    let session = PreviewSession::new(Arc::new(MemoryStore::new()));
    session.start_new("intro", "Intro");
    settle().await;

    for text in ["# O", "# On", "# One"] {
        session.edit(text).unwrap();
        sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(first_heading(session.latest_preview()), None);

    settle().await;
    assert_eq!(first_heading(session.latest_preview()).as_deref(), Some("One"));
}

#[tokio::test(start_paused = true)]
async fn test_switching_documents_drops_previous_preview() {
    let store = Arc::new(MemoryStore::new());
    let session = PreviewSession::new(store.clone());

    session.start_new("first", "First");
    session.edit("# First").unwrap();
    let first = session.save_draft().await.unwrap();
    session.start_new("second", "Second");
    session.edit("# Second").unwrap();
    session.save_draft().await.unwrap();
    settle().await;
    assert_eq!(first_heading(session.latest_preview()).as_deref(), Some("Second"));

    session.edit("# Second, edited").unwrap();
    sleep(Duration::from_millis(100)).await;
    session.select_document(first.document_id().unwrap()).unwrap();
    assert!(session.latest_preview().is_none());

    settle().await;
    assert_eq!(first_heading(session.latest_preview()).as_deref(), Some("First"));
}

#[tokio::test(start_paused = true)]
async fn test_archiving_active_document_clears_preview() {
    let session = PreviewSession::new(Arc::new(MemoryStore::new()));
    session.start_new("intro", "Intro");
    session.edit("# Intro").unwrap();
    let saved = session.save_draft().await.unwrap();
    settle().await;

    session.archive(saved.document_id().unwrap()).await.unwrap();

    assert_eq!(session.state(), EditorState::NoneSelected);
    assert!(session.latest_preview().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_clearing_selection_drops_preview() {
    let session = PreviewSession::new(Arc::new(MemoryStore::new()));
    session.start_new("intro", "Intro");
    session.edit("# Intro").unwrap();
    session.save_draft().await.unwrap();
    settle().await;
    assert!(session.latest_preview().is_some());

    session.clear_selection();

    assert_eq!(session.state(), EditorState::NoneSelected);
    assert!(session.latest_preview().is_none());
    settle().await;
    assert!(session.latest_preview().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_metadata_changes_keep_preview() {
    let session = PreviewSession::new(Arc::new(MemoryStore::new()));
    session.start_new("intro", "Intro");
    session.edit("# Intro").unwrap();
    session.save_draft().await.unwrap();
    settle().await;

    session.rename("Introduction").await.unwrap();
    session.reslug("introduction").await.unwrap();
    let copy = session.duplicate("intro-copy").await.unwrap();

    assert_eq!(first_heading(session.latest_preview()).as_deref(), Some("Intro"));
    assert!(session
        .active_documents()
        .iter()
        .any(|entry| entry.document.id == copy.id));

    session.archive(&copy.id).await.unwrap();
    assert_eq!(session.archived_documents().len(), 1);
    session.restore(&copy.id).await.unwrap();
    assert!(session.archived_documents().is_empty());
    assert_eq!(first_heading(session.latest_preview()).as_deref(), Some("Intro"));
}

#[tokio::test(start_paused = true)]
async fn test_refresh_recompiles_clean_buffer_changed_elsewhere() {
    let store = Arc::new(MemoryStore::new());
    let session = PreviewSession::new(store.clone());
    let other = PreviewSession::new(store.clone());

    session.start_new("intro", "Intro");
    session.edit("# Mine").unwrap();
    let saved = session.save_draft().await.unwrap();
    settle().await;

    other.refresh().await.unwrap();
    other.select_document(saved.document_id().unwrap()).unwrap();
    other.edit("# Theirs").unwrap();
    other.save_draft().await.unwrap();

    session.refresh().await.unwrap();
    settle().await;
    assert_eq!(first_heading(session.latest_preview()).as_deref(), Some("Theirs"));
}

#[tokio::test]
async fn test_theme_edits_reach_the_surface() {
    let store = Arc::new(MemoryStore::new());
    store.seed_theme_token("color-accent", "#123456");
    let mut session = PreviewSession::new(store.clone());
    let mut surface = MemorySurface::new();

    session.load_theme().await.unwrap();
    assert_eq!(session.render_frame(&mut surface), Some(ApplyOutcome::Injected));
    assert_eq!(surface.resolve("--color-accent").as_deref(), Some("#123456"));

    session.set_token("color-accent", "#abcdef").unwrap();
    session.render_frame(&mut surface);
    assert_eq!(surface.resolve("--color-accent").as_deref(), Some("#abcdef"));

    surface.load_stylesheet("late", ":root { --color-accent: black; }");
    assert_eq!(session.surface_changed(&mut surface), ApplyOutcome::Reordered);
    assert_eq!(surface.resolve("--color-accent").as_deref(), Some("#abcdef"));

    let report = session.save_theme().await;
    assert!(report.is_complete());
    assert_eq!(store.theme_token("color-accent").as_deref(), Some("#abcdef"));
    assert!(surface.css(DEFAULT_STYLE_ID).is_some());
}

#[tokio::test(start_paused = true)]
async fn test_session_from_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(DEFAULT_CONFIG_NAME),
        r#"{"debounceMs": 50, "styleElementId": "theme", "themeDefaults": "tokens.json"}"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("tokens.json"), r#"{"color-accent": "teal"}"#).unwrap();

    let config = WorkspaceConfig::load(dir.path()).unwrap();
    let mut session =
        PreviewSession::from_config(Arc::new(MemoryStore::new()), &config, dir.path()).unwrap();

    assert_eq!(session.pipeline().debounce(), Duration::from_millis(50));
    assert_eq!(session.overlay().style_id(), "theme");
    assert_eq!(session.overlay().values().len(), 1);

    session.start_new("intro", "Intro");
    session.edit("# Fast").unwrap();
    sleep(Duration::from_millis(60)).await;
    assert_eq!(first_heading(session.latest_preview()).as_deref(), Some("Fast"));

    let mut surface = MemorySurface::new();
    session.render_frame(&mut surface);
    assert_eq!(surface.css("theme"), Some(":root {\n  --color-accent: teal;\n}\n"));
}
