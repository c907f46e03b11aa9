mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    compile, demo, init, normalize, theme, CompileArgs, DemoArgs, InitArgs, NormalizeArgs,
    ThemeArgs,
};
use std::path::PathBuf;

/// Folio CLI - MDX documents with live preview
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a folio.config.json with default settings
    Init(InitArgs),

    /// Canonicalize code fence language tags
    Normalize(NormalizeArgs),

    /// Compile an MDX file and print its table of contents
    Compile(CompileArgs),

    /// Print the theme overlay style block
    Theme(ThemeArgs),

    /// Walk a document through draft, publish and fork against an in-memory store
    Demo(DemoArgs),
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd: PathBuf = std::env::current_dir()?;

    match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Normalize(args) => normalize(args, &cwd),
        Command::Compile(args) => compile(args, &cwd),
        Command::Theme(args) => theme(args, &cwd),
        Command::Demo(args) => demo(args, &cwd),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
