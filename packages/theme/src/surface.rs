//! # Preview Surface
//!
//! The overlay only needs three things from whatever renders the preview:
//! the ordered list of style entries, an upsert by id, and a way to move an
//! entry to the end. Later entries win the cascade.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleEntry {
    pub id: String,
    pub css: String,
}

pub trait Surface {
    /// Style entries in evaluation order
    fn styles(&self) -> Vec<StyleEntry>;

    /// Replace the entry's text in place, or append a new entry
    fn upsert_style(&mut self, id: &str, css: &str);

    /// Returns false if no entry has this id
    fn move_to_end(&mut self, id: &str) -> bool;

    fn position(&self, id: &str) -> Option<usize> {
        self.styles().iter().position(|entry| entry.id == id)
    }

    fn is_last(&self, id: &str) -> bool {
        self.styles().last().map_or(false, |entry| entry.id == id)
    }
}

/// Style list kept in memory. Stands in for a preview document in tests and
/// headless tools.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    entries: Vec<StyleEntry>,
    writes: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stylesheet finished loading; it lands after everything present
    pub fn load_stylesheet(&mut self, id: impl Into<String>, css: impl Into<String>) {
        let id = id.into();
        self.entries.retain(|entry| entry.id != id);
        self.entries.push(StyleEntry {
            id,
            css: css.into(),
        });
    }

    pub fn remove_style(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Upserts performed so far
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn css(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.css.as_str())
    }

    /// Value of a custom property after the cascade: the last declaration wins
    pub fn resolve(&self, property: &str) -> Option<String> {
        self.entries
            .iter()
            .flat_map(|entry| declarations(&entry.css))
            .filter(|(name, _)| *name == property)
            .last()
            .map(|(_, value)| value.to_string())
    }
}

impl Surface for MemorySurface {
    fn styles(&self) -> Vec<StyleEntry> {
        self.entries.clone()
    }

    fn upsert_style(&mut self, id: &str, css: &str) {
        self.writes += 1;
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => entry.css = css.to_string(),
            None => self.entries.push(StyleEntry {
                id: id.to_string(),
                css: css.to_string(),
            }),
        }
    }

    fn move_to_end(&mut self, id: &str) -> bool {
        match self.entries.iter().position(|entry| entry.id == id) {
            Some(index) => {
                let entry = self.entries.remove(index);
                self.entries.push(entry);
                true
            }
            None => false,
        }
    }
}

/// `name: value` pairs inside every `{ ... }` block
fn declarations(css: &str) -> impl Iterator<Item = (&str, &str)> {
    css.split('}')
        .filter_map(|block| block.split_once('{').map(|(_, body)| body))
        .flat_map(|body| body.split(';'))
        .filter_map(|declaration| declaration.split_once(':'))
        .map(|(name, value)| (name.trim(), value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_declaration_wins() {
        let mut surface = MemorySurface::new();
        surface.load_stylesheet("base", ":root { --color-accent: blue; --space-block: 1rem; }");
        surface.load_stylesheet("theme", ":root { --color-accent: red; }");

        assert_eq!(surface.resolve("--color-accent").as_deref(), Some("red"));
        assert_eq!(surface.resolve("--space-block").as_deref(), Some("1rem"));
        assert_eq!(surface.resolve("--missing"), None);
    }

    #[test]
    fn test_upsert_keeps_position() {
        let mut surface = MemorySurface::new();
        surface.upsert_style("a", ":root { --x: 1; }");
        surface.load_stylesheet("b", ":root { --x: 2; }");
        surface.upsert_style("a", ":root { --x: 3; }");

        assert_eq!(surface.position("a"), Some(0));
        assert_eq!(surface.resolve("--x").as_deref(), Some("2"));
        assert_eq!(surface.writes(), 2);

        assert!(surface.move_to_end("a"));
        assert!(surface.is_last("a"));
        assert_eq!(surface.resolve("--x").as_deref(), Some("3"));
        assert!(!surface.move_to_end("missing"));
    }

    #[test]
    fn test_values_with_colons_survive() {
        let mut surface = MemorySurface::new();
        surface.load_stylesheet("a", ":root { --font-url: url(http://x); }");

        assert_eq!(surface.resolve("--font-url").as_deref(), Some("url(http://x)"));
    }
}
