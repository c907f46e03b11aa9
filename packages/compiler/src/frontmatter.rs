//! Leading `---` frontmatter block

use std::collections::BTreeMap;

const DELIMITER: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontmatter<'a> {
    /// Text between the delimiters, if the source opened with a block
    pub raw: Option<&'a str>,
    /// Source after the closing delimiter
    pub body: &'a str,
    /// Lines consumed by the block, delimiters included
    pub line_offset: usize,
}

impl<'a> Frontmatter<'a> {
    /// Simple `key: value` pairs; other lines are ignored
    pub fn fields(&self) -> BTreeMap<String, String> {
        let Some(raw) = self.raw else {
            return BTreeMap::new();
        };

        raw.lines()
            .filter_map(|line| {
                let (key, value) = line.split_once(':')?;
                let key = key.trim();
                if key.is_empty() || key.starts_with('#') || line.starts_with(char::is_whitespace) {
                    return None;
                }
                let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                Some((key.to_string(), value.to_string()))
            })
            .collect()
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

/// Split a leading frontmatter block off `source`.
///
/// The block must start on the first line. Without a closing delimiter the
/// source is returned unchanged.
pub fn strip_frontmatter(source: &str) -> Frontmatter<'_> {
    let unchanged = Frontmatter {
        raw: None,
        body: source,
        line_offset: 0,
    };

    let mut lines = source.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return unchanged;
    };
    if !is_delimiter(first) || !first.ends_with('\n') {
        return unchanged;
    }

    let raw_start = first.len();
    let mut offset = raw_start;
    for (index, line) in lines.enumerate() {
        if is_delimiter(line) {
            return Frontmatter {
                raw: Some(&source[raw_start..offset]),
                body: &source[offset + line.len()..],
                line_offset: index + 2,
            };
        }
        offset += line.len();
    }

    unchanged
}
