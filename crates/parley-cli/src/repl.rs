//! Interactive chat REPL with streamed output.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! Ctrl-C while a reply is streaming cancels the turn; Ctrl-C at the prompt
//! exits.

use std::io::Write;

use anyhow::Result;
use colored::Colorize;
use futures::StreamExt;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use parley_agent::AgentLoop;
use parley_core::config::AppConfig;

use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Run the interactive REPL loop.
pub async fn run(agent: AgentLoop, config: &AppConfig) -> Result<()> {
    helpers::print_banner(&config.model, &config.provider);

    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => break,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_exit_command(trimmed) {
            println!("\nGoodbye!");
            break;
        }

        if trimmed == "/clear" {
            agent.clear_history();
            println!("{}", "Conversation cleared.".dimmed());
            continue;
        }

        let _ = editor.add_history_entry(&input);

        debug!(input = trimmed, "processing input");
        stream_turn(&agent, trimmed).await;
    }

    save_history(&mut editor);

    Ok(())
}

/// Drive one turn, printing fragments as they arrive. Ctrl-C cancels the
/// turn without leaving the REPL.
async fn stream_turn(agent: &AgentLoop, prompt: &str) {
    helpers::print_reply_prefix();
    let _ = std::io::stdout().flush();

    let mut stream = agent.run(prompt);
    loop {
        tokio::select! {
            fragment = stream.next() => {
                match fragment {
                    Some(text) => {
                        print!("{text}");
                        let _ = std::io::stdout().flush();
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                agent.cancel();
                // Drain whatever was already buffered, then rearm.
                while stream.next().await.is_some() {}
                agent.resume();
                println!("\n{}", "(interrupted)".dimmed());
                return;
            }
        }
    }
    println!("\n");
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Path to the history file (`~/.parley/history`).
fn history_path() -> std::path::PathBuf {
    parley_core::config::get_config_dir().join("history")
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_commands_case_insensitive() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("EXIT"));
        assert!(is_exit_command("/Quit"));
        assert!(is_exit_command(":q"));
        assert!(!is_exit_command("/clear"));
        assert!(!is_exit_command("hello"));
    }
}
