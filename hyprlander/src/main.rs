//! hyprlander: edit a Hyprland configuration by asking for it.
//!
//! Settings live in `<cache dir>/.hyprlander` (override with
//! `HYPRLANDER_HOME`). `init` stores the API key and configuration directory,
//! `update` changes one of them, and `prompt` runs a conversation.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use hyprlander::assist::{PromptRequest, run_prompt};
use hyprlander::exit_codes;
use hyprlander::io::paths::AppPaths;
use hyprlander::io::ui::ConsoleUi;
use hyprlander::logging;
use hyprlander::setup::{init_store, update_store};

#[derive(Parser)]
#[command(
    name = "hyprlander",
    version,
    about = "Edit your Hyprland configuration with an AI assistant"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store the API key and the Hyprland configuration directory.
    Init {
        /// Ask again even when already initialized.
        #[arg(short, long)]
        force: bool,
    },
    /// Change one stored value.
    Update,
    /// Ask the assistant to change the configuration.
    Prompt {
        /// What you want changed, in plain words.
        request: String,
        /// Maximum number of model turns (overrides config.toml).
        #[arg(long)]
        max_turns: Option<u32>,
        /// Write the conversation history as JSON to this path.
        #[arg(long)]
        transcript: Option<PathBuf>,
    },
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::INVALID);
    }
    std::process::exit(exit_codes::OK);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let paths = AppPaths::discover()?;
    let mut ui = ConsoleUi::stdio();
    match cli.command {
        Command::Init { force } => {
            init_store(&mut ui, &paths, force)?;
        }
        Command::Update => {
            update_store(&mut ui, &paths)?;
        }
        Command::Prompt {
            request,
            max_turns,
            transcript,
        } => {
            run_prompt(
                &mut ui,
                &paths,
                &PromptRequest {
                    request,
                    max_turns,
                    transcript,
                },
            )?;
        }
    }
    Ok(())
}
