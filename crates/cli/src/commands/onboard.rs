//! `avocado onboard` - First-time setup.

use std::path::Path;

use avocado_config::AppConfig;

use super::{CommandResult, config_path};

pub async fn run(explicit: Option<&Path>) -> CommandResult {
    let config_path = config_path(explicit);

    println!("🥑 Avocado — First-Time Setup");
    println!("=============================\n");

    if let Some(config_dir) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !config_dir.exists() {
            std::fs::create_dir_all(config_dir)?;
            println!("✅ Created config directory: {}", config_dir.display());
        } else {
            println!("  Config directory exists: {}", config_dir.display());
        }
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Export GITHUB_TOKEN (or set api_key in the config)");
    println!("   2. For the landmark profile, export PINECONE_API_KEY");
    println!("   3. Load embeddings: avocado ingest chunks.jsonl");
    println!("   4. Ask: avocado ask \"What is Article 21?\"\n");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_default_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        run(Some(&path)).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(AppConfig::load_from(&path).is_ok());

        std::fs::write(&path, "# edited\n").unwrap();
        run(Some(&path)).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# edited\n");
        assert!(!written.is_empty());
    }
}
