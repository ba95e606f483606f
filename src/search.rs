//! The `search` command: print the chunks nearest to a query.

use anyhow::Result;

use crate::config::Config;
use crate::index::open_index;
use crate::models::RetrievedChunk;

pub const NO_DOCUMENTS_WARNING: &str =
    "no documents loaded. Run `jobjob ingest <PATH>` to add your resume and other documents.";

const EXCERPT_CHARS: usize = 240;

pub async fn run_search(config: &Config, query: &str, k: Option<usize>) -> Result<()> {
    if query.trim().is_empty() {
        eprintln!("Warning: search query is empty.");
        return Ok(());
    }

    let (index, store) = open_index(config).await?;
    if index.counts().await?.vectors == 0 {
        eprintln!("Warning: {}", NO_DOCUMENTS_WARNING);
        store.close().await;
        return Ok(());
    }

    let k = k.unwrap_or(config.retrieval.top_k);
    let results = index.search(query, k).await?;

    if results.is_empty() {
        println!("No results.");
    }
    for (i, hit) in results.iter().enumerate() {
        print_hit(i + 1, hit);
    }

    store.close().await;
    Ok(())
}

fn print_hit(rank: usize, hit: &RetrievedChunk) {
    println!(
        "{}. [{:.4}] {} (chunk {})",
        rank, hit.score, hit.chunk.source_file, hit.chunk.chunk_index
    );
    println!("    excerpt: \"{}\"", excerpt(&hit.chunk.text));
    println!();
}

/// Whitespace-collapsed prefix of a chunk, for terminal display.
fn excerpt(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_flattens_whitespace() {
        assert_eq!(excerpt("Led\n\nthe   team"), "Led the team");
    }

    #[test]
    fn excerpt_truncates_on_char_boundary() {
        let long = "é".repeat(EXCERPT_CHARS + 10);
        let out = excerpt(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), EXCERPT_CHARS + 3);
    }
}
