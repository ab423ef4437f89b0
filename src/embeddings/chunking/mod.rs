#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for content chunking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Characters of trailing context repeated at the start of the next chunk
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 150,
            chunk_overlap: 20,
        }
    }
}

/// Split raw extracted text into overlapping, bounded-size chunks.
///
/// The input is trimmed, then split at space boundaries and greedily packed
/// into chunks of at most `chunk_size` characters. Each chunk after the
/// first is seeded with the trailing words of its predecessor, up to
/// `chunk_overlap` characters, so context spanning a boundary stays
/// retrievable. Every character of the trimmed input appears in at least
/// one chunk; a single word longer than `chunk_size` becomes its own
/// oversized chunk rather than being cut mid-word.
///
/// Empty (or whitespace-only) input yields an empty list; callers are
/// expected to reject empty documents before chunking.
#[inline]
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    if text.chars().count() <= config.chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    // Splitting on single spaces keeps runs of whitespace intact: the empty
    // pieces between consecutive spaces rejoin losslessly.
    for word in text.split(' ') {
        let added = word_cost(word, current_len);

        if current_len + added > config.chunk_size && !current.is_empty() {
            chunks.push(current.join(" "));

            let tail = overlap_tail(&current, config.chunk_overlap);
            current_len = joined_len(&tail);
            current = tail;
        }

        current_len += word_cost(word, current_len);
        current.push(word);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    debug!(
        "Chunked {} characters into {} chunks",
        text.chars().count(),
        chunks.len()
    );

    chunks
}

/// Cost of appending a word to a chunk, counting the joining space.
fn word_cost(word: &str, current_len: usize) -> usize {
    let separator = usize::from(current_len > 0);
    word.chars().count() + separator
}

/// Trailing words of a finished chunk that fit inside the overlap budget.
fn overlap_tail<'a>(words: &[&'a str], overlap: usize) -> Vec<&'a str> {
    let mut tail: Vec<&'a str> = Vec::new();
    let mut tail_len = 0usize;

    for word in words.iter().rev() {
        let added = word_cost(word, tail_len);
        if tail_len + added > overlap {
            break;
        }
        tail_len += added;
        tail.push(word);
    }

    tail.reverse();
    tail
}

fn joined_len(words: &[&str]) -> usize {
    if words.is_empty() {
        return 0;
    }
    let chars: usize = words.iter().map(|w| w.chars().count()).sum();
    chars + words.len() - 1
}
