use crate::Heading;
use folio_fences::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Renderable node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RenderNode {
    Heading {
        depth: u8,
        text: String,
        anchor: String,
    },

    Paragraph {
        text: String,
    },

    CodeBlock {
        language: Language,
        #[serde(skip_serializing_if = "Option::is_none")]
        meta: Option<String>,
        code: String,
    },

    List {
        ordered: bool,
        items: Vec<String>,
    },

    Blockquote {
        text: String,
    },

    ThematicBreak,

    /// JSX element, e.g. `<Callout type="warn">`
    Component {
        name: String,
        props: BTreeMap<String, PropValue>,
        children: Vec<RenderNode>,
    },

    /// Block-level `{...}` expression, kept verbatim
    Expression {
        code: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PropValue {
    Literal(String),
    Expression(String),
    /// Attribute given without a value
    Flag,
}

impl RenderNode {
    pub fn paragraph(text: impl Into<String>) -> Self {
        RenderNode::Paragraph { text: text.into() }
    }

    /// Visit this node and all descendants in document order
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a RenderNode)) {
        visit(self);
        if let RenderNode::Component { children, .. } = self {
            for child in children {
                child.walk(visit);
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTree {
    pub nodes: Vec<RenderNode>,
    /// Top-level `import` / `export` statements; not rendered
    pub module_statements: Vec<String>,
}

impl RenderTree {
    pub fn headings(&self) -> Vec<&RenderNode> {
        let mut headings = Vec::new();
        for node in &self.nodes {
            node.walk(&mut |n| {
                if matches!(n, RenderNode::Heading { .. }) {
                    headings.push(n);
                }
            });
        }
        headings
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledDocument {
    pub render_tree: RenderTree,
    pub headings: Vec<Heading>,
    pub frontmatter: BTreeMap<String, String>,
}

/// Outcome of one compile. Never partial: a failure carries no render tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CompilationResult {
    Compiled(CompiledDocument),
    #[serde(rename_all = "camelCase")]
    Failed { error_message: String },
}

impl CompilationResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, CompilationResult::Compiled(_))
    }

    pub fn compiled(&self) -> Option<&CompiledDocument> {
        match self {
            CompilationResult::Compiled(document) => Some(document),
            CompilationResult::Failed { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            CompilationResult::Compiled(_) => None,
            CompilationResult::Failed { error_message } => Some(error_message),
        }
    }
}
