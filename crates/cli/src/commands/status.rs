//! `avocado status` - Show resolved configuration and index sizes.

use std::path::Path;

use avocado_config::{AppConfig, Profile};

use super::{CommandResult, config_path, load_config};

pub async fn run(explicit: Option<&Path>) -> CommandResult {
    let config = load_config(explicit)?;

    println!("🥑 Avocado Status");
    println!("=================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Endpoint:     {}", config.completion.base_url);
    println!("  Model:        {}", config.completion.model);
    println!("  API key:      {}", if config.has_api_key() { "configured" } else { "missing" });
    println!("  Max tokens:   {}", config.completion.max_tokens);
    println!("  Embedding:    {:?} ({})", config.embedding.backend, config.embedding.model);
    println!("  Context cap:  {} chars", config.retrieval.max_context_chars);
    println!(
        "  History:      {} turns kept, {} in prompt",
        config.retrieval.history_max_turns, config.retrieval.history_excerpt_turns
    );

    for profile in [Profile::Large, Profile::Small] {
        let settings = config.profile(profile);
        let records = match avocado_index::build_index(&config, settings.index).await {
            Ok(index) => match index.count().await {
                Ok(n) => format!("{n} records"),
                Err(e) => format!("unavailable ({e})"),
            },
            Err(e) => format!("not ready ({e})"),
        };
        println!(
            "  Profile {:<6} index={} top_k={} temperature={}  {records}",
            profile.to_string(),
            settings.index,
            settings.top_k,
            settings.temperature
        );
    }

    let path = config_path(explicit);
    if path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `avocado onboard` first");
    }

    Ok(())
}
