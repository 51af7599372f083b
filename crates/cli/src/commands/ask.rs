//! `avocado ask` - one question, one reply.
//!
//! With `--history`, the file is the session store: it is read before the
//! turn and rewritten with the updated history afterwards.

use std::path::Path;

use avocado_config::{IndexBackend, Profile};
use avocado_core::conversation::ConversationHistory;
use avocado_rag::ReplyKind;
use tracing::warn;

use super::{CommandResult, build_pipeline, load_config};

pub async fn run(
    config_path: Option<&Path>,
    question: &str,
    profile: Profile,
    index: Option<IndexBackend>,
    history_path: Option<&Path>,
) -> CommandResult {
    let config = load_config(config_path)?;
    let pipeline = build_pipeline(&config, profile, index).await?;

    let history = match history_path {
        Some(path) => read_history(path)?,
        None => ConversationHistory::new(),
    };

    let outcome = pipeline.run(question, history).await;
    if outcome.kind == ReplyKind::Failed {
        warn!("Reply carries an upstream error");
    }
    println!("{}", outcome.reply);

    if let Some(path) = history_path {
        write_history(path, &outcome.history)?;
    }
    Ok(())
}

/// A missing file is an empty history.
pub fn read_history(path: &Path) -> Result<ConversationHistory, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Ok(ConversationHistory::new());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(ConversationHistory::new());
    }
    serde_json::from_str(&content)
        .map_err(|e| format!("Invalid history file {}: {e}", path.display()).into())
}

pub fn write_history(path: &Path, history: &ConversationHistory) -> CommandResult {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(history)?)?;
    Ok(())
}
