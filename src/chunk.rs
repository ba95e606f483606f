//! Overlapping fixed-size text chunker.
//!
//! Splits extracted document text into [`Chunk`]s of at most `chunk_size`
//! characters. Consecutive chunks share exactly `chunk_overlap` characters.
//! Window ends prefer a paragraph break, then a line break, then a space, as
//! long as the break falls in the second half of the window; otherwise the
//! window is cut hard.
//!
//! Chunks are exact spans of the trimmed text: dropping the first
//! `chunk_overlap` characters of every chunk after the first and
//! concatenating the rest reproduces the text.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::Chunk;

/// Break candidates in order of preference.
const SEPARATORS: &[&[char]] = &[&['\n', '\n'], &['\n'], &[' ']];

/// Split text into overlapping chunks. Whitespace-only text yields no chunks.
pub fn chunk_text(
    document_id: &str,
    source_file: &str,
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Chunk> {
    let trimmed = text.trim();
    if trimmed.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let overlap = chunk_overlap.min(chunk_size - 1);

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut chunk_index: i64 = 0;

    loop {
        let window_end = (start + chunk_size).min(chars.len());
        let end = if window_end < chars.len() {
            find_break(&chars, start, window_end, overlap, chunk_size)
        } else {
            window_end
        };

        let piece: String = chars[start..end].iter().collect();
        chunks.push(make_chunk(
            document_id,
            source_file,
            chunk_index,
            start as i64,
            &piece,
        ));
        chunk_index += 1;

        if end >= chars.len() {
            break;
        }
        // end > start + overlap always holds, so this makes progress
        start = end - overlap;
    }

    chunks
}

/// Find where a window starting at `start` should end.
///
/// The result is always in `(start + overlap, window_end]`.
fn find_break(
    chars: &[char],
    start: usize,
    window_end: usize,
    overlap: usize,
    chunk_size: usize,
) -> usize {
    let min_end = start + (chunk_size / 2).max(overlap + 1);

    for sep in SEPARATORS {
        let mut pos = window_end;
        while pos >= min_end && pos >= start + sep.len() {
            if chars[pos - sep.len()..pos] == **sep {
                return pos;
            }
            pos -= 1;
        }
    }

    window_end
}

fn make_chunk(
    document_id: &str,
    source_file: &str,
    index: i64,
    start_offset: i64,
    text: &str,
) -> Chunk {
    Chunk {
        id: Uuid::new_v4().to_string(),
        document_id: document_id.to_string(),
        source_file: source_file.to_string(),
        chunk_index: index,
        start_offset,
        text: text.to_string(),
        hash: hash_text(text),
    }
}

pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble(chunks: &[Chunk], overlap: usize) -> String {
        let mut out = String::new();
        for (i, c) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(&c.text);
            } else {
                out.extend(c.text.chars().skip(overlap));
            }
        }
        out
    }

    fn prose(paragraphs: usize) -> String {
        (0..paragraphs)
            .map(|i| {
                format!(
                    "Paragraph {} describes a project where I led a team of engineers, \
                     shipped a data pipeline, and improved latency by {} percent.\nIt ran in production.",
                    i,
                    i * 3
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunk_text("doc1", "resume.txt", "Hello, world!", 1000, 200);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].start_offset, 0);
        assert_eq!(chunks[0].text, "Hello, world!");
        assert_eq!(chunks[0].source_file, "resume.txt");
    }

    #[test]
    fn test_empty_and_whitespace_text_yield_no_chunks() {
        assert!(chunk_text("doc1", "a.txt", "", 1000, 200).is_empty());
        assert!(chunk_text("doc1", "a.txt", "  \n\n\t ", 1000, 200).is_empty());
    }

    #[test]
    fn test_2000_chars_size_500_overlap_50() {
        let text: String = "abcdefghij".repeat(200);
        assert_eq!(text.chars().count(), 2000);

        let chunks = chunk_text("doc1", "long.txt", &text, 500, 50);
        assert_eq!(chunks.len(), 5);
        for c in &chunks {
            assert!(c.text.chars().count() <= 500);
        }
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].text.chars().collect();
            let next: Vec<char> = pair[1].text.chars().collect();
            let tail: String = prev[prev.len() - 50..].iter().collect();
            let head: String = next[..50].iter().collect();
            assert_eq!(tail, head);
        }
        assert_eq!(reassemble(&chunks, 50), text);
    }

    #[test]
    fn test_prose_reassembles_exactly() {
        let text = prose(40);
        let chunks = chunk_text("doc1", "cv.md", &text, 300, 40);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.text.chars().count() <= 300);
        }
        assert_eq!(reassemble(&chunks, 40), text.trim());
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let text = prose(10);
        let chunks = chunk_text("doc1", "cv.md", &text, 400, 20);
        // every chunk except the last ends right after a separator
        for c in &chunks[..chunks.len() - 1] {
            assert!(
                c.text.ends_with('\n') || c.text.ends_with(' '),
                "chunk ended mid-word: {:?}",
                c.text
            );
        }
    }

    #[test]
    fn test_start_offsets_match_text() {
        let text = prose(20);
        let chars: Vec<char> = text.chars().collect();
        let chunks = chunk_text("doc1", "cv.md", &text, 250, 30);
        for c in &chunks {
            let start = c.start_offset as usize;
            let len = c.text.chars().count();
            let expected: String = chars[start..start + len].iter().collect();
            assert_eq!(expected, c.text);
        }
    }

    #[test]
    fn test_multibyte_text_is_split_on_char_boundaries() {
        let text = "日本語のテキスト。".repeat(100);
        let chunks = chunk_text("doc1", "jp.txt", &text, 64, 8);
        assert!(chunks.len() > 1);
        assert_eq!(reassemble(&chunks, 8), text);
    }

    #[test]
    fn test_chunk_indices_contiguous() {
        let chunks = chunk_text("doc1", "cv.md", &prose(30), 200, 20);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i as i64, "Index mismatch at position {}", i);
        }
    }

    #[test]
    fn test_zero_overlap() {
        let text: String = "x".repeat(1000);
        let chunks = chunk_text("doc1", "x.txt", &text, 250, 0);
        assert_eq!(chunks.len(), 4);
        assert_eq!(reassemble(&chunks, 0), text);
    }

    #[test]
    fn test_deterministic_text_and_hash() {
        let text = prose(12);
        let c1 = chunk_text("doc1", "cv.md", &text, 200, 25);
        let c2 = chunk_text("doc1", "cv.md", &text, 200, 25);
        assert_eq!(c1.len(), c2.len());
        for (a, b) in c1.iter().zip(c2.iter()) {
            assert_eq!(a.text, b.text);
            assert_eq!(a.hash, b.hash);
            assert_eq!(a.chunk_index, b.chunk_index);
        }
    }
}
