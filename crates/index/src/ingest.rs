//! Bulk loader for precomputed chunk embeddings.
//!
//! Input is JSON Lines, one record per line:
//!
//! ```json
//! {"id": "c1", "embedding": [0.1, ...], "document": "...", "metadata": {"case_title": "..."}}
//! ```
//!
//! Records are upserted in batches. Blank lines are ignored and malformed
//! lines are logged and skipped.

use std::collections::BTreeMap;
use std::path::Path;

use avocado_core::corpus::IndexRecord;
use avocado_core::error::IndexError;
use avocado_core::index::VectorIndex;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Records per upsert call.
pub const DEFAULT_BATCH_SIZE: usize = 2000;

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Non-blank lines read.
    pub lines: usize,
    /// Records the index accepted.
    pub written: usize,
    /// Lines that failed to parse.
    pub skipped: usize,
    /// Upsert calls made.
    pub batches: usize,
}

#[derive(Deserialize)]
struct RawRecord {
    id: String,
    embedding: Vec<f32>,
    #[serde(default)]
    document: String,
    #[serde(default)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl RawRecord {
    fn into_record(self) -> Result<IndexRecord, String> {
        if self.embedding.is_empty() {
            return Err("embedding is empty".into());
        }
        let metadata = self
            .metadata
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let value = match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, value)
            })
            .collect::<BTreeMap<_, _>>();

        Ok(IndexRecord {
            id: self.id,
            embedding: self.embedding,
            document: self.document,
            metadata,
        })
    }
}

/// Parse one JSONL line into a record.
pub fn parse_line(line: &str) -> Result<IndexRecord, String> {
    let raw: RawRecord = serde_json::from_str(line).map_err(|e| e.to_string())?;
    raw.into_record()
}

/// Load a JSONL file into `index`.
pub async fn ingest_file(
    index: &dyn VectorIndex,
    path: &Path,
    batch_size: usize,
) -> Result<IngestStats, IndexError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| IndexError::Storage(format!("Failed to open {}: {e}", path.display())))?;

    info!(path = %path.display(), index = index.name(), "Ingesting records");
    ingest_reader(index, BufReader::new(file), batch_size).await
}

/// Load JSONL records from any buffered reader into `index`.
pub async fn ingest_reader<R>(
    index: &dyn VectorIndex,
    reader: R,
    batch_size: usize,
) -> Result<IngestStats, IndexError>
where
    R: AsyncBufRead + Unpin,
{
    let batch_size = batch_size.max(1);
    let mut stats = IngestStats::default();
    let mut batch = Vec::with_capacity(batch_size);
    let mut lines = reader.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| IndexError::Storage(format!("read failed: {e}")))?
    {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        stats.lines += 1;

        match parse_line(line) {
            Ok(record) => batch.push(record),
            Err(reason) => {
                warn!(line = line_no, %reason, "Skipping malformed record");
                stats.skipped += 1;
                continue;
            }
        }

        if batch.len() >= batch_size {
            flush(index, &mut batch, &mut stats).await?;
        }
    }

    if !batch.is_empty() {
        flush(index, &mut batch, &mut stats).await?;
    }

    info!(
        written = stats.written,
        skipped = stats.skipped,
        batches = stats.batches,
        "Ingestion complete"
    );
    Ok(stats)
}

async fn flush(
    index: &dyn VectorIndex,
    batch: &mut Vec<IndexRecord>,
    stats: &mut IngestStats,
) -> Result<(), IndexError> {
    let records = std::mem::take(batch);
    stats.written += index.upsert(records).await?;
    stats.batches += 1;
    info!(total = stats.written, "Inserted batch");
    Ok(())
}
