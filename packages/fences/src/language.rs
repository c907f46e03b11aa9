use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical code block languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Typescript,
    Jsx,
    Tsx,
    Python,
    Bash,
    Json,
    Yaml,
    Toml,
    Graphql,
    Http,
    Html,
    Xml,
    Css,
    Markdown,
    Mdx,
    Rust,
    Go,
    Java,
    Sql,
    Diff,
    Plain,
}

impl Language {
    pub const ALL: [Language; 22] = [
        Language::Javascript,
        Language::Typescript,
        Language::Jsx,
        Language::Tsx,
        Language::Python,
        Language::Bash,
        Language::Json,
        Language::Yaml,
        Language::Toml,
        Language::Graphql,
        Language::Http,
        Language::Html,
        Language::Xml,
        Language::Css,
        Language::Markdown,
        Language::Mdx,
        Language::Rust,
        Language::Go,
        Language::Java,
        Language::Sql,
        Language::Diff,
        Language::Plain,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Typescript => "typescript",
            Language::Jsx => "jsx",
            Language::Tsx => "tsx",
            Language::Python => "python",
            Language::Bash => "bash",
            Language::Json => "json",
            Language::Yaml => "yaml",
            Language::Toml => "toml",
            Language::Graphql => "graphql",
            Language::Http => "http",
            Language::Html => "html",
            Language::Xml => "xml",
            Language::Css => "css",
            Language::Markdown => "markdown",
            Language::Mdx => "mdx",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
            Language::Sql => "sql",
            Language::Diff => "diff",
            Language::Plain => "plain",
        }
    }

    /// Resolve a fence tag (trimmed, case-insensitive). Unknown or malformed
    /// tags resolve to `Plain`.
    pub fn from_tag(tag: &str) -> Language {
        let tag = tag.trim();
        let well_formed = tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+' | '#'));
        if !well_formed {
            return Language::Plain;
        }

        match tag.to_ascii_lowercase().as_str() {
            "javascript" | "js" | "mjs" | "cjs" | "node" => Language::Javascript,
            "typescript" | "ts" | "mts" | "cts" => Language::Typescript,
            "jsx" => Language::Jsx,
            "tsx" => Language::Tsx,
            "python" | "py" | "python3" => Language::Python,
            "bash" | "sh" | "shell" | "zsh" | "console" | "shellscript" => Language::Bash,
            "json" | "jsonc" | "json5" => Language::Json,
            "yaml" | "yml" => Language::Yaml,
            "toml" => Language::Toml,
            "graphql" | "gql" => Language::Graphql,
            "http" | "curl" => Language::Http,
            "html" | "htm" => Language::Html,
            "xml" | "svg" => Language::Xml,
            "css" | "scss" => Language::Css,
            "markdown" | "md" => Language::Markdown,
            "mdx" => Language::Mdx,
            "rust" | "rs" => Language::Rust,
            "go" | "golang" => Language::Go,
            "java" => Language::Java,
            "sql" | "postgres" | "postgresql" => Language::Sql,
            "diff" | "patch" => Language::Diff,
            _ => Language::Plain,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!(Language::from_tag("js"), Language::Javascript);
        assert_eq!(Language::from_tag(" TS "), Language::Typescript);
        assert_eq!(Language::from_tag("py"), Language::Python);
        assert_eq!(Language::from_tag("shell"), Language::Bash);
        assert_eq!(Language::from_tag("yml"), Language::Yaml);
        assert_eq!(Language::from_tag("gql"), Language::Graphql);
        assert_eq!(Language::from_tag("curl"), Language::Http);
    }

    #[test]
    fn test_plain_fallbacks() {
        for tag in ["", "text", "plaintext", "none", "brainfuck", "c{}", "<js>"] {
            assert_eq!(Language::from_tag(tag), Language::Plain, "tag {:?}", tag);
        }
    }

    #[test]
    fn test_canonical_names_map_to_themselves() {
        for language in Language::ALL {
            assert_eq!(Language::from_tag(language.as_str()), language);
        }
    }
}
