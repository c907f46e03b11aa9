use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use folio_compiler::{compile_source, CompilationResult, Heading};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct CompileArgs {
    /// MDX file to compile
    pub path: PathBuf,

    /// Print the full compilation result as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn compile(args: CompileArgs, cwd: &Path) -> Result<()> {
    let path = cwd.join(&args.path);
    let source = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    tracing::debug!(path = %path.display(), bytes = source.len(), "compiling");
    let result = compile_source(&source);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    match result {
        CompilationResult::Compiled(document) => {
            if !args.json {
                println!("{} {}", "✓".green(), args.path.display());
                for line in toc_lines(&document.headings) {
                    println!("{}", line);
                }
            }
            Ok(())
        }
        CompilationResult::Failed { error_message } => Err(anyhow!(
            "{} - {}",
            args.path.display(),
            error_message
        )),
    }
}

/// Indented table of contents, one heading per line
fn toc_lines(headings: &[Heading]) -> Vec<String> {
    headings
        .iter()
        .map(|heading| {
            let indent = "  ".repeat(usize::from(heading.depth.saturating_sub(1)) + 1);
            format!("{}{} {}", indent, heading.text, format!("#{}", heading.anchor).dimmed())
        })
        .collect()
}
