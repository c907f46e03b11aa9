//! # Folio Compiler
//!
//! Live-preview compilation of MDX document source.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ pipeline: debounce + generation ordering    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ preprocess: strip frontmatter               │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ service: lazily-created Compiler            │
//! │  - MDX body → RenderTree                    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ assemble: RenderTree + TOC, or error text   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_compiler::{CompilationPipeline, CompilerService};
//! use std::sync::Arc;
//!
//! let pipeline = CompilationPipeline::new(Arc::new(CompilerService::mdx()));
//! let mut preview = pipeline.subscribe();
//!
//! pipeline.schedule("# Hello");
//! preview.changed().await?;
//! ```

mod error;
mod frontmatter;
mod headings;
mod mdx;
mod pipeline;
mod render;
mod service;

pub use error::{CompileError, CompileResult};
pub use frontmatter::{strip_frontmatter, Frontmatter};
pub use headings::{table_of_contents, Heading};
pub use mdx::compile_mdx;
pub use pipeline::{CompilationPipeline, PendingCompile, PreviewOutput, DEFAULT_DEBOUNCE};
pub use render::{CompilationResult, CompiledDocument, PropValue, RenderNode, RenderTree};
pub use service::{compile_source, Compiler, CompilerService, MdxCompiler, Preprocessed};
