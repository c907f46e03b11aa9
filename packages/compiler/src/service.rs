//! # Compiler Service
//!
//! The compiler behind the preview is created on first use and shared by
//! every pipeline that holds the service.

use crate::frontmatter::strip_frontmatter;
use crate::{
    compile_mdx, table_of_contents, CompilationResult, CompileResult, CompiledDocument, RenderTree,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Source with frontmatter removed, ready for compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprocessed {
    pub body: String,
    pub frontmatter: BTreeMap<String, String>,
    /// Lines removed ahead of `body`
    pub line_offset: usize,
}

impl Preprocessed {
    pub fn new(source: &str) -> Self {
        let frontmatter = strip_frontmatter(source);
        Self {
            body: frontmatter.body.to_string(),
            frontmatter: frontmatter.fields(),
            line_offset: frontmatter.line_offset,
        }
    }

    /// Combine a compiler outcome with the table of contents of this input
    pub fn assemble(self, outcome: CompileResult<RenderTree>) -> CompilationResult {
        match outcome {
            Ok(render_tree) => CompilationResult::Compiled(CompiledDocument {
                headings: table_of_contents(&render_tree),
                render_tree,
                frontmatter: self.frontmatter,
            }),
            Err(error) => CompilationResult::Failed {
                error_message: error.offset_lines(self.line_offset).to_string(),
            },
        }
    }
}

/// Turns preprocessed MDX into a render tree
#[async_trait]
pub trait Compiler: Send + Sync {
    async fn compile(&self, input: &Preprocessed) -> CompileResult<RenderTree>;
}

/// Built-in block compiler
#[derive(Debug, Default, Clone, Copy)]
pub struct MdxCompiler;

#[async_trait]
impl Compiler for MdxCompiler {
    async fn compile(&self, input: &Preprocessed) -> CompileResult<RenderTree> {
        compile_mdx(&input.body)
    }
}

type CompilerFactory = Box<dyn Fn() -> Arc<dyn Compiler> + Send + Sync>;

/// Lazily-initialized compiler shared by reference
pub struct CompilerService {
    compiler: OnceCell<Arc<dyn Compiler>>,
    factory: CompilerFactory,
}

impl CompilerService {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Compiler> + Send + Sync + 'static,
    {
        Self {
            compiler: OnceCell::new(),
            factory: Box::new(factory),
        }
    }

    /// Service backed by `MdxCompiler`
    pub fn mdx() -> Self {
        Self::new(|| Arc::new(MdxCompiler))
    }

    pub fn is_initialized(&self) -> bool {
        self.compiler.initialized()
    }

    pub async fn compiler(&self) -> Arc<dyn Compiler> {
        self.compiler
            .get_or_init(|| async {
                info!("initializing preview compiler");
                (self.factory)()
            })
            .await
            .clone()
    }

    /// Preprocess, compile and assemble `source` in one call
    pub async fn compile_source(&self, source: &str) -> CompilationResult {
        let input = Preprocessed::new(source);
        let compiler = self.compiler().await;
        let outcome = compiler.compile(&input).await;
        input.assemble(outcome)
    }
}

impl fmt::Debug for CompilerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilerService")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

/// Synchronous compile with the built-in compiler, for tools outside the preview loop
pub fn compile_source(source: &str) -> CompilationResult {
    let input = Preprocessed::new(source);
    let outcome = compile_mdx(&input.body);
    input.assemble(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_service_initializes_once_on_first_use() {
        let inits = Arc::new(AtomicUsize::new(0));
        let counter = inits.clone();
        let service = CompilerService::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(MdxCompiler)
        });

        assert!(!service.is_initialized());
        assert_eq!(inits.load(Ordering::SeqCst), 0);

        service.compile_source("# One").await;
        service.compile_source("# Two").await;

        assert!(service.is_initialized());
        assert_eq!(inits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_frontmatter_excluded_and_error_lines_offset() {
        let result = compile_source("---\ntitle: Intro\n---\n# Intro\n\n```js\n");

        assert_eq!(
            result.error_message(),
            Some("Unterminated code fence opened on line 6")
        );
    }

    #[test]
    fn test_compiled_document_carries_toc_and_frontmatter() {
        let result = compile_source("---\ntitle: Intro\n---\n# Intro\n## Setup\n");
        let compiled = result.compiled().unwrap();

        assert_eq!(compiled.frontmatter.get("title").map(String::as_str), Some("Intro"));
        assert_eq!(compiled.headings.len(), 2);
        assert_eq!(compiled.render_tree.nodes.len(), 2);
    }

    #[test]
    fn test_toc_anchors_match_render_tree() {
        for source in [
            "# A\n<Note>\n# A\n</Note>\n## B\n",
            "{\n# not a heading\n}\n",
            "export const meta = {\n# A\n}\n\n# A\n",
            "import { Note } from './note'\n\n# A\n{\n# A\n}\n## A\n",
        ] {
            let result = compile_source(source);
            let compiled = result.compiled().unwrap();

            let tree_anchors: Vec<String> = compiled
                .render_tree
                .headings()
                .into_iter()
                .filter_map(|node| match node {
                    crate::RenderNode::Heading { anchor, .. } => Some(anchor.clone()),
                    _ => None,
                })
                .collect();
            let toc_anchors: Vec<String> = compiled.headings.iter().map(|h| h.anchor.clone()).collect();
            assert_eq!(tree_anchors, toc_anchors, "{:?}", source);
        }

        let nested = compile_source("{\n# not a heading\n}\n");
        assert!(nested.compiled().unwrap().headings.is_empty());
    }
}
