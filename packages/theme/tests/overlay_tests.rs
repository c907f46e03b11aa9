use folio_store::{MemoryStore, StoreError, StoreOp, ThemeTokenRecord};
use folio_theme::{
    ApplyOutcome, MemorySurface, Surface, ThemeError, ThemeTokenOverlay, DEFAULT_STYLE_ID,
};
use std::collections::BTreeMap;
use std::sync::Arc;

fn overlay_with(store: &MemoryStore, defaults: &[(&str, &str)]) -> ThemeTokenOverlay {
    ThemeTokenOverlay::with_baseline(
        Arc::new(store.clone()),
        defaults
            .iter()
            .map(|(name, value)| ThemeTokenRecord::new(*name, *value)),
    )
}

fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

#[tokio::test]
async fn test_persisted_tokens_merge_over_defaults() {
    let store = MemoryStore::new();
    store.seed_theme_token("a", "x");
    let mut overlay = overlay_with(&store, &[("a", "y"), ("b", "z")]);

    overlay.load().await.unwrap();

    assert_eq!(overlay.values(), values(&[("a", "x"), ("b", "z")]));
    assert!(overlay.dirty_names().is_empty());
}

#[tokio::test]
async fn test_load_keeps_persisted_extras_and_skips_unsafe_values() {
    let store = MemoryStore::new();
    store.seed_theme_token("color-brand", "#123456");
    store.seed_theme_token("color-accent", "red; background: url(x)");
    let mut overlay = overlay_with(&store, &[("color-accent", "#0969da")]);

    overlay.load().await.unwrap();

    assert_eq!(
        overlay.values(),
        values(&[("color-accent", "#0969da"), ("color-brand", "#123456")])
    );
}

#[tokio::test]
async fn test_load_keeps_unsaved_edits() {
    let store = MemoryStore::new();
    let mut overlay = overlay_with(&store, &[("color-accent", "#0969da")]);
    overlay.set_local("color-accent", "#ff0000").unwrap();
    store.seed_theme_token("color-accent", "#00ff00");

    overlay.load().await.unwrap();

    let token = overlay.get("color-accent").unwrap();
    assert_eq!(token.value, "#ff0000");
    assert_eq!(token.original, "#00ff00");
    assert!(token.dirty);
}

#[tokio::test]
async fn test_failed_load_changes_nothing() {
    let store = MemoryStore::new();
    let mut overlay = overlay_with(&store, &[("a", "y")]);
    overlay.set_local("a", "edited").unwrap();
    store.fail_next(StoreOp::GetThemeTokens, StoreError::network("offline"));

    assert!(matches!(overlay.load().await, Err(ThemeError::Store(StoreError::Network(_)))));
    assert_eq!(overlay.value("a"), Some("edited"));
    assert_eq!(overlay.dirty_names(), vec!["a".to_string()]);
}

#[tokio::test]
async fn test_set_local_validates() {
    let store = MemoryStore::new();
    let mut overlay = overlay_with(&store, &[("color-accent", "#0969da")]);

    assert!(matches!(
        overlay.set_local("color-missing", "red"),
        Err(ThemeError::UnknownToken(_))
    ));
    assert!(matches!(
        overlay.set_local("color-accent", "red } body { display: none"),
        Err(ThemeError::InvalidValue { .. })
    ));
    assert_eq!(overlay.value("color-accent"), Some("#0969da"));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_partial_save_failure_is_reported_per_token() {
    let store = MemoryStore::new();
    store.reject_token("b");
    let mut overlay = overlay_with(&store, &[("a", "1"), ("b", "2"), ("c", "3")]);
    overlay.set_local("a", "10").unwrap();
    overlay.set_local("b", "20").unwrap();
    overlay.set_local("c", "30").unwrap();

    let report = overlay.save_all().await;

    assert!(!report.is_complete());
    assert_eq!(report.saved, vec!["a".to_string(), "c".to_string()]);
    assert_eq!(report.failed_names(), vec!["b"]);
    assert_eq!(store.theme_token("a").as_deref(), Some("10"));
    assert_eq!(store.theme_token("b"), None);
    assert_eq!(store.theme_token("c").as_deref(), Some("30"));

    assert_eq!(overlay.dirty_names(), vec!["b".to_string()]);
    assert_eq!(overlay.get("a").unwrap().original, "10");
    assert_eq!(overlay.get("b").unwrap().original, "2");
}

#[tokio::test]
async fn test_save_one_skips_clean_tokens() {
    let store = MemoryStore::new();
    let mut overlay = overlay_with(&store, &[("a", "1")]);

    assert!(!overlay.save_one("a").await.unwrap());
    overlay.set_local("a", "2").unwrap();
    assert!(overlay.save_one("a").await.unwrap());
    assert!(matches!(
        overlay.save_one("missing").await,
        Err(ThemeError::UnknownToken(_))
    ));
    assert_eq!(store.calls(), vec![StoreOp::SetThemeToken]);
}

#[tokio::test]
async fn test_revert_restores_original_and_reapplies() {
    let store = MemoryStore::new();
    let mut overlay = overlay_with(&store, &[("a", "1"), ("b", "2")]);
    let mut surface = MemorySurface::new();
    overlay.flush_frame(&mut surface);

    overlay.set_local("a", "10").unwrap();
    overlay.set_local("b", "20").unwrap();
    overlay.flush_frame(&mut surface);
    assert_eq!(surface.resolve("--a").as_deref(), Some("10"));

    overlay.revert("a").unwrap();
    overlay.flush_frame(&mut surface);
    assert_eq!(surface.resolve("--a").as_deref(), Some("1"));
    assert_eq!(overlay.dirty_names(), vec!["b".to_string()]);

    overlay.revert_all();
    overlay.flush_frame(&mut surface);
    assert_eq!(surface.resolve("--b").as_deref(), Some("2"));
    assert!(overlay.dirty_names().is_empty());
}

#[test]
fn test_apply_is_idempotent_for_unchanged_tokens() {
    let store = MemoryStore::new();
    let mut overlay = overlay_with(&store, &[("a", "1")]);
    let mut surface = MemorySurface::new();

    assert_eq!(overlay.apply_to_surface(&mut surface), ApplyOutcome::Injected);
    assert_eq!(overlay.apply_to_surface(&mut surface), ApplyOutcome::Unchanged);
    assert_eq!(surface.writes(), 1);

    overlay.set_local("a", "2").unwrap();
    assert_eq!(overlay.apply_to_surface(&mut surface), ApplyOutcome::Injected);
    assert_eq!(surface.writes(), 2);
    assert_eq!(surface.styles().len(), 1);
}

#[test]
fn test_empty_values_are_not_injected() {
    let store = MemoryStore::new();
    let mut overlay = overlay_with(&store, &[("a", "1"), ("b", "")]);
    let mut surface = MemorySurface::new();

    overlay.apply_to_surface(&mut surface);

    let css = surface.css(DEFAULT_STYLE_ID).unwrap();
    assert!(css.contains("--a: 1;"));
    assert!(!css.contains("--b"));
}

#[test]
fn test_overlay_stays_after_late_stylesheets() {
    let store = MemoryStore::new();
    let mut overlay = overlay_with(&store, &[("color-accent", "red")]);
    let mut surface = MemorySurface::new();
    surface.load_stylesheet("base", ":root { --color-accent: blue; }");

    overlay.apply_to_surface(&mut surface);
    assert_eq!(surface.resolve("--color-accent").as_deref(), Some("red"));

    // A stylesheet arrives after injection and would win the cascade
    surface.load_stylesheet("late", ":root { --color-accent: green; }");
    assert_eq!(surface.resolve("--color-accent").as_deref(), Some("green"));

    assert_eq!(overlay.on_surface_changed(&mut surface), ApplyOutcome::Reordered);
    assert_eq!(surface.resolve("--color-accent").as_deref(), Some("red"));
    assert!(surface.is_last(DEFAULT_STYLE_ID));
    assert_eq!(overlay.on_surface_changed(&mut surface), ApplyOutcome::Unchanged);
    assert_eq!(surface.writes(), 1);
}

#[test]
fn test_apply_reorders_without_rewriting() {
    let store = MemoryStore::new();
    let mut overlay = overlay_with(&store, &[("a", "1")]);
    let mut surface = MemorySurface::new();

    overlay.apply_to_surface(&mut surface);
    surface.load_stylesheet("late", ":root { --a: 2; }");

    assert_eq!(overlay.apply_to_surface(&mut surface), ApplyOutcome::Reordered);
    assert_eq!(surface.writes(), 1);
    assert_eq!(surface.resolve("--a").as_deref(), Some("1"));
}

#[test]
fn test_removed_overlay_is_reinjected() {
    let store = MemoryStore::new();
    let mut overlay = overlay_with(&store, &[("a", "1")]);
    let mut surface = MemorySurface::new();

    assert_eq!(overlay.on_surface_changed(&mut surface), ApplyOutcome::Unchanged);
    assert!(surface.styles().is_empty());

    overlay.apply_to_surface(&mut surface);
    surface.remove_style(DEFAULT_STYLE_ID);
    surface.load_stylesheet("late", ":root { --a: 2; }");

    assert_eq!(overlay.on_surface_changed(&mut surface), ApplyOutcome::Injected);
    assert!(surface.is_last(DEFAULT_STYLE_ID));
    assert_eq!(surface.resolve("--a").as_deref(), Some("1"));
}

#[test]
fn test_edits_within_a_frame_are_batched() {
    let store = MemoryStore::new();
    let mut overlay = overlay_with(&store, &[("a", "1")]);
    let mut surface = MemorySurface::new();
    assert_eq!(overlay.flush_frame(&mut surface), Some(ApplyOutcome::Injected));
    assert_eq!(overlay.flush_frame(&mut surface), None);

    overlay.set_local("a", "2").unwrap();
    overlay.set_local("a", "3").unwrap();
    overlay.set_local("a", "4").unwrap();
    assert!(overlay.frame_requested());

    assert_eq!(overlay.flush_frame(&mut surface), Some(ApplyOutcome::Injected));
    assert_eq!(surface.writes(), 2);
    assert_eq!(surface.resolve("--a").as_deref(), Some("4"));
}

#[test]
fn test_custom_style_id() {
    let store = MemoryStore::new();
    let mut overlay = overlay_with(&store, &[("a", "1")]).with_style_id("preview-theme");
    let mut surface = MemorySurface::new();

    overlay.apply_to_surface(&mut surface);

    assert_eq!(overlay.style_id(), "preview-theme");
    assert!(surface.css("preview-theme").is_some());
}

#[test]
fn test_default_overlay_covers_baseline() {
    let overlay = ThemeTokenOverlay::new(Arc::new(MemoryStore::new()));

    assert!(overlay.get("color-accent").is_some());
    assert!(overlay.tokens().all(|token| !token.dirty));
    assert!(overlay.stylesheet().starts_with(":root {\n"));
}
