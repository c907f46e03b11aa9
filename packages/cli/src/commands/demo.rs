use super::runtime;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use folio_compiler::CompilationResult;
use folio_fences::normalize;
use folio_store::MemoryStore;
use folio_workspace::{PreviewSession, WorkspaceConfig};
use std::path::Path;
use std::sync::Arc;

const DEMO_SOURCE: &str = "# Hi\n```js\nconsole.log(1)\n```";

#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Slug of the demo document
    #[arg(long, default_value = "intro")]
    pub slug: String,

    /// Title of the demo document
    #[arg(long, default_value = "Intro")]
    pub title: String,
}

pub fn demo(args: DemoArgs, cwd: &Path) -> Result<()> {
    let config = WorkspaceConfig::load(cwd)?;
    runtime()?.block_on(run(args, config, cwd))
}

fn step(label: &str, detail: impl std::fmt::Display) {
    println!("  {} {:<14} {}", "✓".green(), label, detail);
}

async fn run(args: DemoArgs, config: WorkspaceConfig, cwd: &Path) -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let session = PreviewSession::from_config(store, &config, cwd)?;
    let mut preview = session.preview();

    println!("{}", "📝 Folio revision walkthrough".bright_blue().bold());

    let normalized = normalize(DEMO_SOURCE);
    step(
        "normalize",
        format!("{} fence tag(s) canonicalized", normalized.changed_count),
    );

    session.start_new(&args.slug, &args.title);
    session.edit(normalized.normalized.clone())?;
    let saved = session.save_draft().await?;
    step(
        "save draft",
        format!("{} v{} {:?}", saved.slug(), saved.version, saved.state),
    );

    let output = preview.wait_for(|output| output.result.is_some()).await?.clone();
    match output.result {
        Some(CompilationResult::Compiled(document)) => step(
            "preview",
            format!(
                "{} node(s), toc: {}",
                document.render_tree.nodes.len(),
                document
                    .headings
                    .iter()
                    .map(|heading| heading.text.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ),
        Some(CompilationResult::Failed { error_message }) => {
            return Err(anyhow!("preview failed: {}", error_message))
        }
        None => return Err(anyhow!("preview was invalidated")),
    }

    let receipt = session.publish().await?;
    step(
        "publish",
        format!(
            "{} ({} derived artifact(s))",
            receipt.revision_id, receipt.derived_artifact_count
        ),
    );

    let draft = session.create_draft().await?;
    step(
        "create draft",
        format!(
            "v{} {:?}, source carried over: {}",
            draft.version,
            draft.state,
            draft.mdx_source == saved.mdx_source
        ),
    );

    println!();
    println!("✨ {} Walkthrough complete!", "Done".green().bold());
    Ok(())
}
