use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use folio_fences::normalize as normalize_fences;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// MDX file to normalize
    pub path: PathBuf,

    /// Rewrite the file in place
    #[arg(short, long)]
    pub write: bool,
}

pub fn normalize(args: NormalizeArgs, cwd: &Path) -> Result<()> {
    let path = cwd.join(&args.path);
    let source = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let result = normalize_fences(&source);

    if result.changed_count == 0 {
        println!("{} {} already canonical", "✓".green(), args.path.display());
        return Ok(());
    }

    println!(
        "{} {} fence tag(s) to canonicalize in {}",
        "→".bright_blue(),
        result.changed_count,
        args.path.display()
    );

    if args.write {
        fs::write(&path, &result.normalized)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{} Rewrote {}", "✓".green(), args.path.display());
    }

    Ok(())
}
