use super::runtime;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use folio_store::MemoryStore;
use folio_theme::{load_tokens, ThemeToken, ThemeTokenOverlay, TokenCategory};
use folio_workspace::WorkspaceConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct ThemeArgs {
    /// JSON token file merged over the baseline
    #[arg(short, long)]
    pub tokens: Option<PathBuf>,

    /// List tokens by category instead of printing the style block
    #[arg(short, long)]
    pub list: bool,
}

pub fn theme(args: ThemeArgs, cwd: &Path) -> Result<()> {
    let config = WorkspaceConfig::load(cwd)?;
    let overlay = build_overlay(&config, cwd, args.tokens.as_deref())?;

    if args.list {
        for category in TokenCategory::ALL {
            let tokens: Vec<&ThemeToken> = overlay
                .tokens()
                .filter(|token| token.category == category)
                .collect();
            if tokens.is_empty() {
                continue;
            }
            println!("{}", category.as_str().bright_blue().bold());
            for token in tokens {
                println!("  {} {}", token.property().bright_white(), token.value);
            }
        }
    } else {
        print!("{}", overlay.stylesheet());
    }
    Ok(())
}

/// Overlay over the configured baseline with `tokens` as the persisted set
fn build_overlay(config: &WorkspaceConfig, cwd: &Path, tokens: Option<&Path>) -> Result<ThemeTokenOverlay> {
    let store = MemoryStore::new();
    if let Some(path) = tokens {
        let path = cwd.join(path);
        let records = load_tokens(&path)
            .with_context(|| format!("Failed to load tokens from {}", path.display()))?;
        for record in records {
            store.seed_theme_token(record.name, record.value);
        }
    }

    let mut overlay = ThemeTokenOverlay::with_baseline(Arc::new(store), config.baseline(cwd)?)
        .with_style_id(&config.style_element_id);
    runtime()?.block_on(overlay.load())?;
    Ok(overlay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_token_file_overrides_baseline() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tokens.json"), r##"{"color-accent": "#ff0000"}"##).unwrap();

        let overlay = build_overlay(
            &WorkspaceConfig::default(),
            dir.path(),
            Some(Path::new("tokens.json")),
        )
        .unwrap();

        assert_eq!(overlay.value("color-accent"), Some("#ff0000"));
        assert_eq!(overlay.value("color-background"), Some("#ffffff"));
        assert!(overlay.stylesheet().contains("  --color-accent: #ff0000;\n"));
    }

    #[test]
    fn test_bad_token_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tokens.json"), r#"{"color-accent": "red; }"}"#).unwrap();

        let result = build_overlay(
            &WorkspaceConfig::default(),
            dir.path(),
            Some(Path::new("tokens.json")),
        );
        assert!(result.is_err());
    }
}
