//! # Theme Token Overlay
//!
//! Baseline tokens, merged with persisted overrides, merged with local
//! unsaved edits, rendered as one `:root { ... }` style entry on a preview
//! surface.
//!
//! ```text
//! baseline ─┐
//! persisted ┼─→ tokens ─→ content hash ─→ surface entry (always last)
//! local ────┘
//! ```
//!
//! Applying is skipped when the content hash matches what the surface
//! already holds. The overlay entry must stay after every other stylesheet,
//! including ones the surface loads later, so the embedding layer calls
//! [`ThemeTokenOverlay::on_surface_changed`] whenever the surface's style
//! list may have changed.

use crate::defaults::default_tokens;
use crate::surface::Surface;
use crate::token::{validate_name, validate_value};
use crate::{ThemeError, ThemeResult, ThemeToken};
use crc32fast::Hasher;
use folio_store::{ThemeStore, ThemeTokenRecord};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_STYLE_ID: &str = "folio-theme-overrides";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The surface already reflected the tokens, in last position
    Unchanged,
    /// The style entry was written
    Injected,
    /// Content was current but another stylesheet had landed after it
    Reordered,
}

/// Result of `save_all`; every token is saved independently
#[derive(Debug, Default)]
pub struct SaveReport {
    pub saved: Vec<String>,
    pub failed: Vec<(String, ThemeError)>,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|(name, _)| name.as_str()).collect()
    }
}

#[derive(Debug, Clone)]
struct Applied {
    hash: u32,
    css: String,
}

pub struct ThemeTokenOverlay {
    store: Arc<dyn ThemeStore>,
    baseline: BTreeMap<String, String>,
    tokens: BTreeMap<String, ThemeToken>,
    style_id: String,
    applied: Option<Applied>,
    frame_requested: bool,
}

impl fmt::Debug for ThemeTokenOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeTokenOverlay")
            .field("style_id", &self.style_id)
            .field("tokens", &self.tokens.len())
            .field("dirty", &self.dirty_names().len())
            .field("frame_requested", &self.frame_requested)
            .finish()
    }
}

impl ThemeTokenOverlay {
    pub fn new(store: Arc<dyn ThemeStore>) -> Self {
        Self::with_baseline(store, default_tokens())
    }

    pub fn with_baseline(
        store: Arc<dyn ThemeStore>,
        baseline: impl IntoIterator<Item = ThemeTokenRecord>,
    ) -> Self {
        let baseline: BTreeMap<String, String> = baseline
            .into_iter()
            .map(|record| (record.name, record.value))
            .collect();
        let tokens = baseline
            .iter()
            .map(|(name, value)| (name.clone(), ThemeToken::new(name, value)))
            .collect();

        Self {
            store,
            baseline,
            tokens,
            style_id: DEFAULT_STYLE_ID.to_string(),
            applied: None,
            frame_requested: true,
        }
    }

    pub fn with_style_id(mut self, style_id: impl Into<String>) -> Self {
        self.style_id = style_id.into();
        self
    }

    pub fn style_id(&self) -> &str {
        &self.style_id
    }

    pub fn tokens(&self) -> impl Iterator<Item = &ThemeToken> {
        self.tokens.values()
    }

    pub fn get(&self, name: &str) -> Option<&ThemeToken> {
        self.tokens.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|token| token.value.as_str())
    }

    /// Current name → value mapping, local edits included
    pub fn values(&self) -> BTreeMap<String, String> {
        self.tokens
            .values()
            .map(|token| (token.name.clone(), token.value.clone()))
            .collect()
    }

    pub fn dirty_names(&self) -> Vec<String> {
        self.tokens
            .values()
            .filter(|token| token.dirty)
            .map(|token| token.name.clone())
            .collect()
    }

    /// Fetch persisted tokens and merge them over the baseline. Baseline
    /// names are never dropped, and unsaved local edits stay on top.
    pub async fn load(&mut self) -> ThemeResult<()> {
        let records = self.store.get_theme_tokens().await?;

        let mut merged = self.baseline.clone();
        for record in records {
            let valid = validate_name(&record.name)
                .and_then(|_| validate_value(&record.name, &record.value));
            match valid {
                Ok(()) => {
                    merged.insert(record.name, record.value);
                }
                Err(e) => warn!(token = %record.name, error = %e, "ignoring persisted token"),
            }
        }

        let mut tokens = BTreeMap::new();
        for (name, persisted) in merged {
            let token = match self.tokens.remove(&name) {
                Some(mut local) => {
                    local.rebase(&persisted);
                    local
                }
                None => ThemeToken::new(&name, persisted),
            };
            tokens.insert(name, token);
        }
        // Locally edited names the store no longer knows about
        for (name, mut local) in std::mem::take(&mut self.tokens) {
            if local.dirty {
                local.original = String::new();
                tokens.insert(name, local);
            }
        }

        self.tokens = tokens;
        self.request_frame();
        info!(tokens = self.tokens.len(), dirty = self.dirty_names().len(), "loaded theme tokens");
        Ok(())
    }

    /// Change a token locally; the preview picks it up on the next frame
    pub fn set_local(&mut self, name: &str, value: impl Into<String>) -> ThemeResult<()> {
        let value = value.into();
        validate_value(name, &value)?;
        let token = self
            .tokens
            .get_mut(name)
            .ok_or_else(|| ThemeError::UnknownToken(name.to_string()))?;

        token.set(value);
        self.request_frame();
        Ok(())
    }

    /// Persist one token. Returns whether anything was sent.
    pub async fn save_one(&mut self, name: &str) -> ThemeResult<bool> {
        let token = self
            .tokens
            .get(name)
            .ok_or_else(|| ThemeError::UnknownToken(name.to_string()))?;
        if !token.dirty {
            return Ok(false);
        }

        let value = token.value.clone();
        self.store
            .set_theme_token(ThemeTokenRecord::new(name, value.clone()))
            .await?;

        if let Some(token) = self.tokens.get_mut(name) {
            token.commit(&value);
        }
        debug!(token = name, "saved theme token");
        Ok(true)
    }

    /// Persist every dirty token. A rejected token does not stop the others.
    pub async fn save_all(&mut self) -> SaveReport {
        let mut report = SaveReport::default();
        for name in self.dirty_names() {
            match self.save_one(&name).await {
                Ok(_) => report.saved.push(name),
                Err(e) => {
                    warn!(token = %name, error = %e, "failed to save theme token");
                    report.failed.push((name, e));
                }
            }
        }
        info!(saved = report.saved.len(), failed = report.failed.len(), "saved theme");
        report
    }

    pub fn revert(&mut self, name: &str) -> ThemeResult<()> {
        let token = self
            .tokens
            .get_mut(name)
            .ok_or_else(|| ThemeError::UnknownToken(name.to_string()))?;

        token.revert();
        self.request_frame();
        Ok(())
    }

    pub fn revert_all(&mut self) {
        for token in self.tokens.values_mut() {
            token.revert();
        }
        self.request_frame();
    }

    pub fn request_frame(&mut self) {
        self.frame_requested = true;
    }

    pub fn frame_requested(&self) -> bool {
        self.frame_requested
    }

    /// Apply once per frame, however many edits were made since the last one
    pub fn flush_frame(&mut self, surface: &mut dyn Surface) -> Option<ApplyOutcome> {
        if !self.frame_requested {
            return None;
        }
        self.frame_requested = false;
        Some(self.apply_to_surface(surface))
    }

    /// CRC32 over the full name/value set
    pub fn content_hash(&self) -> u32 {
        let mut hasher = Hasher::new();
        for token in self.tokens.values() {
            hasher.update(token.name.as_bytes());
            hasher.update(&[0]);
            hasher.update(token.value.as_bytes());
            hasher.update(&[b'\n']);
        }
        hasher.finalize()
    }

    /// The style block: one custom property per non-empty token
    pub fn stylesheet(&self) -> String {
        let mut css = String::from(":root {\n");
        for token in self.tokens.values().filter(|token| !token.value.trim().is_empty()) {
            css.push_str(&format!("  {}: {};\n", token.property(), token.value));
        }
        css.push_str("}\n");
        css
    }

    pub fn apply_to_surface(&mut self, surface: &mut dyn Surface) -> ApplyOutcome {
        let hash = self.content_hash();
        let current = self.applied.as_ref().map_or(false, |applied| applied.hash == hash);

        if current && surface.position(&self.style_id).is_some() {
            return self.reassert(surface);
        }

        let css = self.stylesheet();
        surface.upsert_style(&self.style_id, &css);
        surface.move_to_end(&self.style_id);
        debug!(style = %self.style_id, hash, "injected theme overlay");

        self.applied = Some(Applied { hash, css });
        ApplyOutcome::Injected
    }

    /// Put the overlay back in last position after the surface's style list
    /// changed, re-injecting what was last applied if the entry disappeared
    pub fn on_surface_changed(&mut self, surface: &mut dyn Surface) -> ApplyOutcome {
        match &self.applied {
            None => ApplyOutcome::Unchanged,
            Some(applied) if surface.position(&self.style_id).is_none() => {
                surface.upsert_style(&self.style_id, &applied.css);
                debug!(style = %self.style_id, "overlay entry was removed, re-injected");
                ApplyOutcome::Injected
            }
            Some(_) => self.reassert(surface),
        }
    }

    fn reassert(&self, surface: &mut dyn Surface) -> ApplyOutcome {
        if surface.is_last(&self.style_id) {
            return ApplyOutcome::Unchanged;
        }
        surface.move_to_end(&self.style_id);
        debug!(style = %self.style_id, "moved theme overlay after late stylesheet");
        ApplyOutcome::Reordered
    }
}
