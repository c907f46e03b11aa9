//! Baseline token set used when nothing has been persisted

use crate::token::{validate_name, validate_value};
use crate::ThemeResult;
use folio_store::ThemeTokenRecord;
use std::collections::BTreeMap;
use std::path::Path;

const BASELINE: &[(&str, &str)] = &[
    ("color-background", "#ffffff"),
    ("color-foreground", "#1f2328"),
    ("color-muted", "#656d76"),
    ("color-accent", "#0969da"),
    ("color-border", "#d0d7de"),
    ("color-code-background", "#f6f8fa"),
    ("font-body", "system-ui, -apple-system, sans-serif"),
    ("font-mono", "ui-monospace, SFMono-Regular, monospace"),
    ("font-size-base", "16px"),
    ("line-height-body", "1.6"),
    ("space-block", "1rem"),
    ("space-inline", "0.5rem"),
    ("radius-base", "6px"),
    ("shadow-card", "0 1px 3px rgba(0, 0, 0, 0.12)"),
];

pub fn default_tokens() -> Vec<ThemeTokenRecord> {
    BASELINE
        .iter()
        .map(|(name, value)| ThemeTokenRecord::new(*name, *value))
        .collect()
}

/// Parse a `{ "name": "value" }` token file
pub fn parse_tokens(json: &str) -> ThemeResult<Vec<ThemeTokenRecord>> {
    let map: BTreeMap<String, String> = serde_json::from_str(json)?;
    map.into_iter()
        .map(|(name, value)| {
            validate_name(&name)?;
            validate_value(&name, &value)?;
            Ok(ThemeTokenRecord::new(name, value))
        })
        .collect()
}

pub fn load_tokens(path: &Path) -> ThemeResult<Vec<ThemeTokenRecord>> {
    let json = std::fs::read_to_string(path)?;
    parse_tokens(&json)
}
