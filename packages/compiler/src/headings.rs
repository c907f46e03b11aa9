//! Table of contents extraction

use crate::render::{RenderNode, RenderTree};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// 1..=6
    pub depth: u8,
    pub text: String,
    pub anchor: String,
}

/// Parse an ATX heading line: 1-6 `#` followed by whitespace
pub(crate) fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }

    let rest = &line[hashes..];
    if !rest.starts_with([' ', '\t']) {
        return None;
    }

    let text = rest.trim();
    // Optional closing sequence: `## Title ##`
    let text = match text.trim_end_matches('#') {
        stripped if stripped.ends_with([' ', '\t']) => stripped.trim_end(),
        stripped if stripped.is_empty() => stripped,
        _ => text,
    };

    Some((hashes as u8, text))
}

/// Allocates unique, URL-safe anchors in document order
#[derive(Debug, Default)]
pub(crate) struct AnchorAllocator {
    seen: HashMap<String, usize>,
}

impl AnchorAllocator {
    pub(crate) fn allocate(&mut self, text: &str) -> String {
        let base = slugify(text);
        let count = self.seen.entry(base.clone()).or_insert(0);
        let anchor = if *count == 0 {
            base
        } else {
            format!("{}-{}", base, count)
        };
        *count += 1;
        anchor
    }
}

fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug.to_string()
    }
}

/// Table of contents of a compiled tree, in document order. Taken from the
/// tree itself so every entry links to an anchor the preview renders.
pub fn table_of_contents(tree: &RenderTree) -> Vec<Heading> {
    tree.headings()
        .into_iter()
        .filter_map(|node| match node {
            RenderNode::Heading {
                depth,
                text,
                anchor,
            } => Some(Heading {
                depth: *depth,
                text: text.clone(),
                anchor: anchor.clone(),
            }),
            _ => None,
        })
        .collect()
}
