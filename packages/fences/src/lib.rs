//! # Code Fence Normalization
//!
//! Maps the language tag of every fenced code block to a canonical name.
//!
//! ```text
//! ```js            →  ```javascript
//! ```Shell         →  ```bash
//! ```              →  ```plain
//! ```c++ title=x   →  ```plain title=x
//! ```
//!
//! Only the tag on the opening line is rewritten. Fence bodies, closing
//! lines, and any metadata after the tag are copied through untouched, so a
//! second pass over normalized text finds nothing to change.

mod language;

pub use language::Language;

use serde::Serialize;

/// Result of normalizing a source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Normalized {
    pub normalized: String,
    /// Number of fences whose tag was rewritten
    pub changed_count: usize,
}

/// Run of three or more backticks or tildes opening a code block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence {
    marker: u8,
    len: usize,
}

/// Parsed opening line: `prefix` (indent and fence run) followed by `info`
#[derive(Debug, Clone, Copy)]
pub struct FenceOpen<'a> {
    pub fence: Fence,
    pub prefix: &'a str,
    pub info: &'a str,
}

impl Fence {
    /// Parse `line` (without its line ending) as an opening fence.
    pub fn open(line: &str) -> Option<FenceOpen<'_>> {
        let indent = indent_width(line)?;
        let rest = &line[indent..];
        let marker = *rest.as_bytes().first()?;
        if marker != b'`' && marker != b'~' {
            return None;
        }

        let len = rest.bytes().take_while(|b| *b == marker).count();
        if len < 3 {
            return None;
        }

        let info = &rest[len..];
        // A backtick in a backtick fence's info string makes the line inline code
        if marker == b'`' && info.contains('`') {
            return None;
        }

        Some(FenceOpen {
            fence: Fence { marker, len },
            prefix: &line[..indent + len],
            info,
        })
    }

    /// Whether `line` closes a block opened by this fence
    pub fn is_closed_by(&self, line: &str) -> bool {
        let Some(indent) = indent_width(line) else {
            return false;
        };
        let rest = &line[indent..];
        let len = rest.bytes().take_while(|b| *b == self.marker).count();
        len >= self.len && rest[len..].trim().is_empty()
    }
}

impl<'a> FenceOpen<'a> {
    /// Language tag and the metadata following it
    pub fn tag(&self) -> (&'a str, &'a str) {
        let trimmed = self.info.trim();
        match trimmed.find(char::is_whitespace) {
            Some(split) => (&trimmed[..split], trimmed[split..].trim_start()),
            None => (trimmed, ""),
        }
    }

    pub fn language(&self) -> Language {
        Language::from_tag(self.tag().0)
    }
}

/// Normalize every fenced code block tag in `source`.
pub fn normalize(source: &str) -> Normalized {
    let mut normalized = String::with_capacity(source.len() + 16);
    let mut changed_count = 0;
    let mut open: Option<Fence> = None;

    for raw_line in source.split_inclusive('\n') {
        let (line, ending) = split_line_ending(raw_line);

        if let Some(fence) = open {
            if fence.is_closed_by(line) {
                open = None;
            }
            normalized.push_str(raw_line);
            continue;
        }

        match Fence::open(line) {
            Some(opener) => {
                open = Some(opener.fence);
                match rewrite_info(opener.info) {
                    Some(info) => {
                        changed_count += 1;
                        normalized.push_str(opener.prefix);
                        normalized.push_str(&info);
                        normalized.push_str(ending);
                    }
                    None => normalized.push_str(raw_line),
                }
            }
            None => normalized.push_str(raw_line),
        }
    }

    Normalized {
        normalized,
        changed_count,
    }
}

fn split_line_ending(raw: &str) -> (&str, &str) {
    if let Some(line) = raw.strip_suffix("\r\n") {
        (line, "\r\n")
    } else if let Some(line) = raw.strip_suffix('\n') {
        (line, "\n")
    } else {
        (raw, "")
    }
}

fn indent_width(line: &str) -> Option<usize> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    (indent <= 3).then_some(indent)
}

/// Rewritten info string, or `None` when the tag is already canonical.
fn rewrite_info(info: &str) -> Option<String> {
    let trimmed = info.trim();
    let (tag, meta) = match trimmed.find(char::is_whitespace) {
        Some(split) => (&trimmed[..split], &trimmed[split..]),
        None => (trimmed, ""),
    };

    let canonical = Language::from_tag(tag).as_str();
    if tag == canonical {
        return None;
    }

    Some(format!("{}{}", canonical, meta))
}
