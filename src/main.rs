// ABOUTME: Entry point for the caravan CLI application.
// ABOUTME: Parses arguments, builds the command context and dispatches to command handlers.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use caravan::commands::{self, CommandContext};
use caravan::config::Settings;
use caravan::error::Result;
use caravan::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise warn, or debug with --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let output = Output::new(OutputMode::from_flags(cli.quiet, cli.json));
    let result = run(cli, output.clone()).await;

    if let Err(e) = result {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: Output) -> Result<()> {
    let root = match cli.workdir {
        Some(dir) => dir,
        None => env::current_dir()?,
    };
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::discover(&root)?,
    };
    let mut ctx = CommandContext::new(root, settings, output);

    match cli.command {
        Commands::Init(flags) => commands::init(&mut ctx, flags.into()).await.map(|_| ()),
        Commands::Bake(flags) => commands::bake(&mut ctx, flags.into()).await.map(|_| ()),
        Commands::Up { break_lock } => commands::up(&mut ctx, break_lock).await.map(|_| ()),
        Commands::Clean { force, break_lock } => {
            commands::clean(&mut ctx, force, break_lock).await
        }
        Commands::Status => commands::status(&ctx).await.map(|_| ()),
    }
}
