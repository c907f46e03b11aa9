use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_workspace::{WorkspaceConfig, DEFAULT_CONFIG_NAME};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Preview debounce window in milliseconds
    #[arg(long, default_value_t = 350)]
    pub debounce_ms: u64,

    /// JSON token file replacing the built-in theme baseline
    #[arg(long)]
    pub theme_defaults: Option<PathBuf>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let config = WorkspaceConfig {
        debounce_ms: args.debounce_ms,
        theme_defaults: args.theme_defaults,
        ..WorkspaceConfig::default()
    };
    fs::write(&config_path, serde_json::to_string_pretty(&config)? + "\n")?;

    println!(
        "{} Created {}",
        "✓".green(),
        DEFAULT_CONFIG_NAME.bright_white()
    );
    Ok(())
}
