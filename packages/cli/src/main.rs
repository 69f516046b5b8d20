mod commands;
mod config;
mod script;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{replay, tree, ReplayArgs, TreeArgs};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Outline CLI - inspect and replay edits on markdown outlines
#[derive(Parser, Debug)]
#[command(name = "outline")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to outline.config.json in the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output from the editor
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a markdown file and print its outline
    Tree(TreeArgs),

    /// Apply a JSON script of edits to a markdown file
    Replay(ReplayArgs),
}

fn init_tracing(verbose: bool, config: &Config) {
    let fallback = if verbose {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("warn")
    };
    let filter = if verbose {
        EnvFilter::new(fallback)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_file(path)?,
        None => {
            let cwd = std::env::current_dir()?.display().to_string();
            Config::load(&cwd)?
        }
    };
    init_tracing(cli.verbose, &config);

    match cli.command {
        Command::Tree(args) => tree(args, &config),
        Command::Replay(args) => replay(args, &config),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
