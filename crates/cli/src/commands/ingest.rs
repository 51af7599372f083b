//! `avocado ingest` - load precomputed embeddings into an index.

use std::path::{Path, PathBuf};

use avocado_config::{IndexBackend, Profile};
use avocado_index::IngestStats;
use tracing::info;

use super::{CommandResult, load_config, resolve_backend};

pub async fn run(
    config_path: Option<&Path>,
    files: &[PathBuf],
    profile: Profile,
    index: Option<IndexBackend>,
    batch_size: usize,
) -> CommandResult {
    let config = load_config(config_path)?;
    let backend = resolve_backend(&config, profile, index);
    let index = avocado_index::build_index(&config, backend).await?;

    let mut total = IngestStats::default();
    for file in files {
        let stats = avocado_index::ingest_file(index.as_ref(), file, batch_size).await?;
        println!(
            "  ✅ {}: {} records inserted ({} skipped)",
            file.display(),
            stats.written,
            stats.skipped
        );
        total.lines += stats.lines;
        total.written += stats.written;
        total.skipped += stats.skipped;
        total.batches += stats.batches;
    }

    let stored = index.count().await?;
    info!(backend = %backend, written = total.written, stored, "Ingestion finished");
    println!();
    println!("  Inserted {} records in {} batches into {backend} index", total.written, total.batches);
    println!("  Index now holds {stored} records");
    if total.skipped > 0 {
        println!("  ⚠️  {} malformed lines skipped (see log)", total.skipped);
    }
    Ok(())
}
