//! `avocado chat` - interactive multi-turn session.
//!
//! The loop owns the history and threads it through every `run` call.

use std::io::Write;
use std::path::Path;

use avocado_config::{IndexBackend, Profile};
use avocado_core::conversation::ConversationHistory;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{CommandResult, build_pipeline, load_config, resolve_backend};

/// One line of user input, classified.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatInput {
    Exit,
    Clear,
    ShowHistory,
    Empty,
    Question(String),
}

pub fn parse_input(line: &str) -> ChatInput {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" => ChatInput::Empty,
        "exit" | "quit" | "/exit" | "/quit" => ChatInput::Exit,
        "/clear" => ChatInput::Clear,
        "/history" => ChatInput::ShowHistory,
        _ => ChatInput::Question(line.to_string()),
    }
}

pub async fn run(config_path: Option<&Path>, profile: Profile, index: Option<IndexBackend>) -> CommandResult {
    let config = load_config(config_path)?;
    let pipeline = build_pipeline(&config, profile, index).await?;

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║     Avocado Legal Assistant — Interactive     ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Profile:   {profile}");
    println!("  Index:     {}", resolve_backend(&config, profile, index));
    println!("  Model:     {}", config.completion.model);
    println!("  Top-k:     {}", config.profile(profile).top_k);
    println!();
    println!("  Ask a question and press Enter.");
    println!("  /history shows the session, /clear resets it, 'exit' quits.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut history = ConversationHistory::new();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            ChatInput::Exit => break,
            ChatInput::Empty => {}
            ChatInput::Clear => {
                history = ConversationHistory::new();
                println!("  (history cleared)");
            }
            ChatInput::ShowHistory => print_history(&history),
            ChatInput::Question(question) => {
                eprint!("  ...");
                let outcome = pipeline.run(&question, history).await;
                eprint!("\r     \r");
                println!();
                for line in outcome.reply.lines() {
                    println!("  Avocado > {line}");
                }
                println!();
                history = outcome.history;
            }
        }
        prompt()?;
    }

    println!();
    println!("  Goodbye! 🥑");
    println!();
    Ok(())
}

fn prompt() -> CommandResult {
    print!("  You > ");
    std::io::stdout().flush()?;
    Ok(())
}

fn print_history(history: &ConversationHistory) {
    if history.is_empty() {
        println!("  (no turns yet)");
        return;
    }
    for (i, turn) in history.turns().iter().enumerate() {
        println!("  [{}] Q: {}", i + 1, turn.question);
        let first_line = turn.answer.lines().next().unwrap_or_default();
        println!("      A: {first_line}");
    }
}
