//! Parley CLI — entry point.
//!
//! # Commands
//!
//! - `parley exec PROMPT [-f FILE]...` — single prompt, streamed reply
//! - `parley [chat]` — interactive REPL (the default)
//! - `parley --config` — show (and bootstrap) the config files

mod helpers;
mod repl;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tracing::info;

use parley_agent::AgentLoop;
use parley_core::config::{loader, AppConfig};
use parley_providers::create_client;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Parley — streaming chat with LLM providers
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    /// Model for this invocation (overrides the config file)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Provider for this invocation (overrides the config file)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Show config file locations, bootstrapping them if needed
    #[arg(long)]
    config: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single prompt and print the streamed reply
    Exec {
        /// The prompt text (may be omitted when files are given)
        prompt: Option<String>,

        /// Files whose contents are appended to the prompt
        #[arg(short, long)]
        file: Vec<PathBuf>,
    },

    /// Chat interactively (the default when no command is given)
    Chat,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logs);

    let config_dir = loader::get_config_dir();
    if cli.config {
        return helpers::open_config(&config_dir);
    }

    let mut config = loader::load_config_from_dir(&config_dir)?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(provider) = cli.provider {
        if !config.providers.contains_key(&provider) {
            eprintln!("Warning: provider '{provider}' is not configured");
        }
        config.provider = provider;
    }

    let agent = build_agent(&config, &config_dir)?;

    match cli.command {
        Some(Commands::Exec { prompt, file }) => {
            info!(model = %config.model, provider = %config.provider, "single-shot prompt");
            let prompt = helpers::splice_files(prompt.as_deref().unwrap_or(""), &file);
            if prompt.trim().is_empty() {
                anyhow::bail!("nothing to send: give a prompt, readable files, or both");
            }
            let mut stream = agent.run(prompt);
            while let Some(fragment) = stream.next().await {
                print!("{fragment}");
                let _ = std::io::stdout().flush();
            }
            println!();
            Ok(())
        }
        Some(Commands::Chat) | None => repl::run(agent, &config).await,
    }
}

/// Build an [`AgentLoop`] from the resolved configuration.
fn build_agent(config: &AppConfig, config_dir: &std::path::Path) -> Result<AgentLoop> {
    let client = create_client(config)
        .with_context(|| format!("cannot use provider '{}'", config.provider))?;
    let instructions = helpers::effective_instructions(&config.instructions, config_dir);
    Ok(AgentLoop::new(Arc::new(client), &config.model, instructions))
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("parley=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
