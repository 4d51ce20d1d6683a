use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::generate;
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use syncup::{commands, config::SyncOptions, prompt::TerminalPrompter};

#[derive(Parser)]
#[command(
    name = "syncup",
    version,
    about = "Stash, rebase onto origin and push the current branch",
    long_about = "Run with no arguments inside a git working tree. syncup stashes uncommitted\n\
                  changes (after asking), fetches origin, rebases the current branch onto\n\
                  origin/<branch>, restores the stash and pushes with upstream tracking.\n\n\
                  The primary branch defaults to `main`; override it with\n\
                  SYNCUP_PRIMARY_BRANCH or `git config syncup.primaryBranch <name>`."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "syncup=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match cli.command {
        None => {
            let cwd = std::env::current_dir().context("Cannot read the current directory")?;
            commands::sync::run(&cwd, &SyncOptions::from_env(), &mut TerminalPrompter)?;
        }
        Some(Commands::Completions { shell }) => {
            generate(shell, &mut Cli::command(), "syncup", &mut io::stdout());
        }
    }

    Ok(())
}
