//! Index status overview.
//!
//! Summarizes what's loaded: database location and size, document, chunk and
//! embedding counts, the embedding model the vectors were built with, the
//! personal-context size, and one line per stored document.

use anyhow::Result;

use crate::config::Config;
use crate::personal;
use crate::store::{ChunkStore, SqliteStore};

pub async fn run_status(config: &Config) -> Result<()> {
    let store = SqliteStore::open(&config.db.path).await?;
    let counts = store.counts().await?;
    let model = store.stored_model().await?;
    let documents = store.list_documents().await?;
    let personal_chars = personal::load(&config.paths.personal_context)?
        .trim()
        .chars()
        .count();

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("jobjob status");
    println!("=============");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Documents:   {}", counts.documents);
    println!("  Chunks:      {}", counts.chunks);
    println!("  Embedded:    {} / {}", counts.vectors, counts.chunks);
    println!(
        "  Model:       {}",
        model.as_deref().unwrap_or("(none)")
    );
    println!(
        "  Personal context: {}",
        if personal_chars == 0 {
            "(empty)".to_string()
        } else {
            format!("{} chars", personal_chars)
        }
    );

    if !documents.is_empty() {
        println!();
        println!(
            "  {:<32} {:>5} {:>8}   {}",
            "FILE", "KIND", "CHARS", "INGESTED"
        );
        println!("  {}", "-".repeat(64));
        for doc in &documents {
            println!(
                "  {:<32} {:>5} {:>8}   {}",
                doc.file_name,
                doc.kind.as_str(),
                doc.char_count,
                format_ts(doc.ingested_at)
            );
        }
    }
    println!();

    store.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
