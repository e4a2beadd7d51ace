//! Shared CLI helpers — prompt assembly, banner, config bootstrap.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::warn;

use parley_core::config::loader::{self, DEFAULT_INSTRUCTIONS};

/// Build the outbound prompt from the user's text plus spliced file contents.
///
/// Each file is appended as a labelled block so the model can tell the files
/// apart from the request itself. Unreadable files are skipped with a
/// warning; the turn still runs with whatever could be read.
pub fn splice_files(prompt: &str, files: &[PathBuf]) -> String {
    let mut out = prompt.to_string();
    for path in files {
        match std::fs::read_to_string(path) {
            Ok(contents) => out.push_str(&format!(
                "\n\n--- Content of {} ---\n{}",
                path.display(),
                contents
            )),
            Err(e) => {
                warn!("skipping {}: {e}", path.display());
                eprintln!(
                    "{}",
                    format!("Warning: could not read {}: {e}", path.display()).yellow()
                );
            }
        }
    }
    out
}

/// Print the banner shown at REPL start.
pub fn print_banner(model: &str, provider: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "Parley".cyan().bold(), version.dimmed());
    println!("{}", format!("{model} via {provider}").dimmed());
    println!(
        "{}",
        "Type a message, \"/clear\" to reset, or \"exit\" to quit.".dimmed()
    );
    println!();
}

/// Print the assistant prefix before a streamed reply.
pub fn print_reply_prefix() {
    print!("{} ", "Assistant:".green().bold());
}

/// Ensure the config directory, settings file, and instructions file exist,
/// then print where they live.
pub fn open_config(dir: &Path) -> Result<()> {
    // Loading bootstraps the settings file as a side effect.
    let config = loader::load_config_from_dir(dir)?;

    let instructions = loader::instructions_path(dir);
    if !instructions.exists() {
        std::fs::write(&instructions, format!("{DEFAULT_INSTRUCTIONS}\n"))
            .with_context(|| format!("failed to write {}", instructions.display()))?;
        println!("Created {}", instructions.display().to_string().cyan());
    }

    let settings = loader::config_file_path(dir)
        .unwrap_or_else(|| dir.join(loader::CONFIG_JSON_NAME));
    println!("Settings:     {}", settings.display());
    println!("Instructions: {}", instructions.display());
    println!(
        "Active:       {} via {}",
        config.model.bold(),
        config.provider.bold()
    );
    Ok(())
}

/// The effective system instructions: the resolved config value, with the
/// contents of `instructions.md` appended when that file exists.
pub fn effective_instructions(base: &str, dir: &Path) -> String {
    let path = loader::instructions_path(dir);
    match std::fs::read_to_string(&path) {
        Ok(extra) if !extra.trim().is_empty() => format!("{base}\n\n{}", extra.trim()),
        _ => base.to_string(),
    }
}
