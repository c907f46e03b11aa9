//! # Theme Tokens
//!
//! A token is one CSS custom property, e.g. `color-accent` → `--color-accent`.
//! Unsaved edits are tracked per token against the last persisted value.

use crate::{ThemeError, ThemeResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenCategory {
    Color,
    Typography,
    Spacing,
    Radius,
    Shadow,
    Other,
}

impl TokenCategory {
    pub const ALL: [TokenCategory; 6] = [
        TokenCategory::Color,
        TokenCategory::Typography,
        TokenCategory::Spacing,
        TokenCategory::Radius,
        TokenCategory::Shadow,
        TokenCategory::Other,
    ];

    /// Category implied by the name prefix
    pub fn infer(name: &str) -> Self {
        let prefix = name.split('-').next().unwrap_or_default();
        match prefix {
            "color" | "colour" | "bg" => TokenCategory::Color,
            "font" | "line" | "letter" | "text" => TokenCategory::Typography,
            "space" | "spacing" | "gap" | "size" => TokenCategory::Spacing,
            "radius" | "rounded" => TokenCategory::Radius,
            "shadow" | "elevation" => TokenCategory::Shadow,
            _ => TokenCategory::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenCategory::Color => "color",
            TokenCategory::Typography => "typography",
            TokenCategory::Spacing => "spacing",
            TokenCategory::Radius => "radius",
            TokenCategory::Shadow => "shadow",
            TokenCategory::Other => "other",
        }
    }
}

impl fmt::Display for TokenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeToken {
    pub name: String,
    pub value: String,
    pub category: TokenCategory,
    /// Last persisted (or baseline) value, restored by revert
    pub original: String,
    pub dirty: bool,
}

impl ThemeToken {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        Self {
            category: TokenCategory::infer(&name),
            original: value.clone(),
            name,
            value,
            dirty: false,
        }
    }

    /// Custom property name, with the leading `--`
    pub fn property(&self) -> String {
        format!("--{}", self.name)
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.dirty = true;
    }

    pub fn revert(&mut self) {
        self.value = self.original.clone();
        self.dirty = false;
    }

    /// `saved` reached the store
    pub fn commit(&mut self, saved: &str) {
        self.original = saved.to_string();
        self.dirty = self.value != saved;
    }

    /// New persisted value from a reload; a local edit stays on top
    pub fn rebase(&mut self, persisted: &str) {
        self.original = persisted.to_string();
        if self.dirty {
            self.dirty = self.value != persisted;
        } else {
            self.value = persisted.to_string();
        }
    }
}

/// Lowercase ASCII words joined by single hyphens, starting with a letter
pub fn validate_name(name: &str) -> ThemeResult<()> {
    let starts_with_letter = name.bytes().next().map_or(false, |b| b.is_ascii_lowercase());
    let kebab = name.split('-').all(|part| {
        !part.is_empty()
            && part
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    });

    if starts_with_letter && kebab {
        Ok(())
    } else {
        Err(ThemeError::InvalidName(name.to_string()))
    }
}

/// Values are interpolated into a style block, so anything that could end the
/// declaration or the block is refused
pub fn validate_value(name: &str, value: &str) -> ThemeResult<()> {
    let forbidden = value
        .chars()
        .find(|c| matches!(c, ';' | '{' | '}' | '<' | '\n' | '\r'));

    match forbidden {
        Some(c) => Err(ThemeError::InvalidValue {
            name: name.to_string(),
            reason: format!("contains {:?}", c),
        }),
        None => Ok(()),
    }
}
