//! Content chunking for retrieval.
//!
//! Pure functions: identical inputs always produce identical chunk
//! sequences, so a re-sync is restartable at no cost.

use crate::error::{RagError, RagResult};
use murmur_core::ChunkStrategy;

/// How far back from a window end `fixed_chars` searches for whitespace
/// so words are not split.
const BOUNDARY_LOOKBACK: usize = 50;

/// Configuration for the sync pipeline's chunking step.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    pub strategy: ChunkStrategy,
    /// Characters per chunk (fixed_chars, paragraphs, hybrid) or
    /// sentences per chunk (sentences).
    pub size: usize,
    /// Character overlap between fixed_chars windows.
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::Paragraphs,
            size: 500,
            overlap: 50,
        }
    }
}

impl ChunkConfig {
    /// Create from the application configuration. An unknown strategy name
    /// falls back to paragraphs.
    pub fn from_config(config: &murmur_config::ChunkingConfig) -> Self {
        Self {
            strategy: ChunkStrategy::from_str(&config.strategy).unwrap_or_default(),
            size: config.chunk_size,
            overlap: config.overlap,
        }
    }
}

/// Split text into ordered chunks using the given strategy.
///
/// `size` is a character limit for every strategy except `sentences`,
/// where it is a sentence count. `overlap` only applies to `fixed_chars`.
/// Empty or whitespace-only input produces an empty sequence; input
/// without any boundary falls back to a single whole-text chunk.
pub fn chunk(
    text: &str,
    strategy: ChunkStrategy,
    size: usize,
    overlap: usize,
) -> RagResult<Vec<String>> {
    if size == 0 {
        return Err(RagError::InvalidConfiguration(
            "chunk size must be greater than zero".to_string(),
        ));
    }

    if text.trim().is_empty() {
        return Ok(vec![]);
    }

    match strategy {
        ChunkStrategy::FixedChars => {
            if overlap >= size {
                return Err(RagError::InvalidConfiguration(format!(
                    "overlap ({}) must be smaller than chunk size ({})",
                    overlap, size
                )));
            }
            Ok(chunk_fixed_chars(text, size, overlap))
        }
        ChunkStrategy::Paragraphs => Ok(chunk_paragraphs(text, size)),
        ChunkStrategy::Sentences => Ok(chunk_sentences(text, size)),
        ChunkStrategy::Hybrid => chunk_hybrid(text, size, size * 2),
    }
}

/// Paragraph chunking at `target_size`, with oversized chunks re-split by
/// sentences. The sentence count per regrouped chunk is derived from the
/// average sentence length so results approximate `target_size`.
pub fn chunk_hybrid(text: &str, target_size: usize, max_size: usize) -> RagResult<Vec<String>> {
    if target_size == 0 || max_size < target_size {
        return Err(RagError::InvalidConfiguration(format!(
            "hybrid sizes must satisfy 0 < target_size ({}) <= max_size ({})",
            target_size, max_size
        )));
    }

    if text.trim().is_empty() {
        return Ok(vec![]);
    }

    let mut final_chunks = Vec::new();

    for chunk in chunk_paragraphs(text, target_size) {
        if chunk.chars().count() <= max_size {
            final_chunks.push(chunk);
            continue;
        }

        // An oversized chunk is always a single paragraph: packing never
        // combines beyond target_size.
        let sentences = split_sentences(&chunk);
        let total_chars: usize = sentences.iter().map(|s| s.chars().count()).sum();
        let avg = (total_chars / sentences.len()).max(1);
        let per_chunk = (target_size / avg).max(1);

        for group in sentences.chunks(per_chunk) {
            final_chunks.push(group.join(" "));
        }
    }

    Ok(final_chunks)
}

/// Windows of `size` characters advancing by `size - overlap`. A window
/// end is pulled back to the nearest preceding whitespace when one exists
/// within the look-back distance; a window reaching end-of-text ends the
/// scan.
fn chunk_fixed_chars(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < len {
        let mut end = (start + size).min(len);

        if end < len {
            let search_start = end.saturating_sub(BOUNDARY_LOOKBACK).max(start);
            if let Some(pos) = (search_start..end).rev().find(|&i| chars[i].is_whitespace()) {
                if pos > start {
                    // Window keeps the boundary whitespace; trim drops it
                    end = pos + 1;
                }
            }
        }

        let window: String = chars[start..end].iter().collect();
        let trimmed = window.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        if end == len {
            break;
        }

        // Guarantee forward progress even when pull-back shrank the window
        // below the overlap
        let next = end.saturating_sub(overlap);
        start = if next > start { next } else { end };
    }

    chunks
}

/// Greedily pack consecutive paragraphs while the running length (with
/// `\n\n` joiners) stays within `max_chars`. A single paragraph longer
/// than `max_chars` becomes its own oversized chunk, never truncated.
fn chunk_paragraphs(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0usize;

    for para in split_paragraphs(text) {
        let para_len = para.chars().count();

        if !current.is_empty() && current_len + para_len + 2 > max_chars {
            chunks.push(current.join("\n\n"));
            current_len = para_len;
            current = vec![para];
        } else {
            current_len += if current.is_empty() { para_len } else { para_len + 2 };
            current.push(para);
        }
    }

    if !current.is_empty() {
        chunks.push(current.join("\n\n"));
    }

    chunks
}

/// Group every `per_chunk` sentences into one chunk. Groups never span a
/// blank-line boundary; a trailing partial group is kept.
fn chunk_sentences(text: &str, per_chunk: usize) -> Vec<String> {
    let mut chunks = Vec::new();

    for para in split_paragraphs(text) {
        let sentences = split_sentences(&para);
        for group in sentences.chunks(per_chunk) {
            chunks.push(group.join(" "));
        }
    }

    chunks
}

/// Split on blank-line boundaries. A line containing only whitespace
/// separates paragraphs.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n").trim().to_string());
                current.clear();
            }
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        paragraphs.push(current.join("\n").trim().to_string());
    }

    paragraphs.retain(|p| !p.is_empty());
    paragraphs
}

/// Split on runs of sentence-terminal punctuation followed by whitespace
/// or end-of-text. Text with no terminator comes back as one sentence.
fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < len {
        if matches!(chars[i], '.' | '!' | '?') {
            let mut j = i + 1;
            while j < len && matches!(chars[j], '.' | '!' | '?') {
                j += 1;
            }

            if j >= len || chars[j].is_whitespace() {
                let sentence: String = chars[start..j].iter().collect();
                let trimmed = sentence.trim();
                if !trimmed.is_empty() {
                    sentences.push(trimmed.to_string());
                }

                while j < len && chars[j].is_whitespace() {
                    j += 1;
                }
                start = j;
            }

            i = j;
        } else {
            i += 1;
        }
    }

    if start < len {
        let rest: String = chars[start..].iter().collect();
        let trimmed = rest.trim();
        if !trimmed.is_empty() {
            sentences.push(trimmed.to_string());
        }
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Collapse all whitespace so chunk joins can be compared to the
    /// source text regardless of separators.
    fn normalized(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_empty_input_is_empty_sequence() {
        for strategy in [
            ChunkStrategy::FixedChars,
            ChunkStrategy::Paragraphs,
            ChunkStrategy::Sentences,
            ChunkStrategy::Hybrid,
        ] {
            assert!(chunk("", strategy, 100, 10).unwrap().is_empty());
            assert!(chunk("   \n\n  ", strategy, 100, 10).unwrap().is_empty());
        }
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(
            chunk("text", ChunkStrategy::FixedChars, 10, 10),
            Err(RagError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            chunk("text", ChunkStrategy::FixedChars, 10, 25),
            Err(RagError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            chunk("text", ChunkStrategy::Paragraphs, 0, 0),
            Err(RagError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            chunk_hybrid("text", 100, 50),
            Err(RagError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_fixed_chars_pure_windows() {
        // No whitespace, so boundary pull-back never fires
        let chunks = chunk("abcdefghij", ChunkStrategy::FixedChars, 4, 2).unwrap();
        assert_eq!(chunks, vec!["abcd", "cdef", "efgh", "ghij"]);
    }

    #[test]
    fn test_fixed_chars_overlap_property() {
        let text = "abcdefghijklmnopqrstuvwxyz0123456789";
        let size = 8;
        let overlap = 3;
        let chunks = chunk(text, ChunkStrategy::FixedChars, size, overlap).unwrap();

        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().rev().take(overlap).collect::<Vec<_>>()
                .into_iter().rev().collect();
            let head: String = pair[1].chars().take(overlap).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_fixed_chars_respects_word_boundaries() {
        let text = "the quick brown fox jumps over the lazy dog and keeps running";
        let chunks = chunk(text, ChunkStrategy::FixedChars, 20, 0).unwrap();

        // No word is ever split
        for c in &chunks {
            for word in c.split_whitespace() {
                assert!(text.contains(word), "split word: {}", word);
            }
        }
        // Nothing but boundary whitespace is lost
        assert_eq!(normalized(&chunks.join(" ")), normalized(text));
    }

    #[test]
    fn test_fixed_chars_no_overlap_covers_text() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunks = chunk(text, ChunkStrategy::FixedChars, 12, 0).unwrap();
        assert_eq!(normalized(&chunks.join(" ")), normalized(text));
    }

    #[test]
    fn test_paragraphs_greedy_packing() {
        let text = "First paragraph here.\n\nSecond one.\n\nThird paragraph with more words in it.";
        let chunks = chunk(text, ChunkStrategy::Paragraphs, 40, 0).unwrap();

        assert_eq!(chunks[0], "First paragraph here.\n\nSecond one.");
        assert_eq!(chunks[1], "Third paragraph with more words in it.");
        assert_eq!(normalized(&chunks.join(" ")), normalized(text));
    }

    #[test]
    fn test_paragraphs_oversized_paragraph_kept_whole() {
        let long = "x".repeat(300);
        let text = format!("short one\n\n{}\n\nanother short", long);
        let chunks = chunk(&text, ChunkStrategy::Paragraphs, 50, 0).unwrap();

        assert!(chunks.iter().any(|c| c.len() == 300), "oversized paragraph must not be truncated");
        assert_eq!(normalized(&chunks.join(" ")), normalized(&text));
    }

    #[test]
    fn test_paragraphs_blank_lines_with_spaces() {
        let text = "one\n   \ntwo";
        let chunks = chunk(text, ChunkStrategy::Paragraphs, 4, 0).unwrap();
        assert_eq!(chunks, vec!["one", "two"]);
    }

    #[test]
    fn test_sentences_grouping() {
        let text = "One. Two! Three? Four. Five.";
        let chunks = chunk(text, ChunkStrategy::Sentences, 2, 0).unwrap();
        assert_eq!(chunks, vec!["One. Two!", "Three? Four.", "Five."]);
    }

    #[test]
    fn test_sentences_respect_paragraph_boundaries() {
        let chunks = chunk("A.\n\nB. C.", ChunkStrategy::Sentences, 2, 0).unwrap();
        assert_eq!(chunks, vec!["A.", "B. C."]);
    }

    #[test]
    fn test_sentences_trailing_without_punctuation() {
        let chunks = chunk("Done. And then some more", ChunkStrategy::Sentences, 5, 0).unwrap();
        assert_eq!(chunks, vec!["Done. And then some more"]);
    }

    #[test]
    fn test_sentences_punctuation_runs() {
        let chunks = chunk("Wait... really?! Yes.", ChunkStrategy::Sentences, 1, 0).unwrap();
        assert_eq!(chunks, vec!["Wait...", "really?!", "Yes."]);
    }

    #[test]
    fn test_no_boundaries_single_chunk() {
        let text = "just a run of words with no terminators or blank lines";
        assert_eq!(
            chunk(text, ChunkStrategy::Paragraphs, 10_000, 0).unwrap(),
            vec![text.to_string()]
        );
        assert_eq!(
            chunk(text, ChunkStrategy::Sentences, 5, 0).unwrap(),
            vec![text.to_string()]
        );
        assert_eq!(
            chunk_hybrid(text, 10_000, 20_000).unwrap(),
            vec![text.to_string()]
        );
    }

    #[test]
    fn test_hybrid_resplits_oversized_chunks() {
        let sentences: Vec<String> = (0..20)
            .map(|i| format!("Sentence number {} has a handful of words.", i))
            .collect();
        let big_paragraph = sentences.join(" ");
        let text = format!("Small intro.\n\n{}", big_paragraph);

        let chunks = chunk_hybrid(&text, 100, 200).unwrap();

        assert_eq!(chunks[0], "Small intro.");
        assert!(chunks.len() > 2, "oversized paragraph should be re-split");
        // Regrouped chunks approximate the target, never wildly exceed it
        for c in &chunks[1..] {
            assert!(c.chars().count() <= 200, "chunk too large: {}", c.len());
        }
        assert_eq!(normalized(&chunks.join(" ")), normalized(&text));
    }

    #[test]
    fn test_chunking_is_idempotent() {
        let text = "First. Second. Third.\n\nFourth paragraph here.";
        for strategy in [
            ChunkStrategy::FixedChars,
            ChunkStrategy::Paragraphs,
            ChunkStrategy::Sentences,
            ChunkStrategy::Hybrid,
        ] {
            let a = chunk(text, strategy, 10, 2).unwrap();
            let b = chunk(text, strategy, 10, 2).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_utf8_safety() {
        let text = "日本語のテキスト。 Mixed with ünïcode. ─── And symbols.";
        for strategy in [
            ChunkStrategy::FixedChars,
            ChunkStrategy::Paragraphs,
            ChunkStrategy::Sentences,
        ] {
            let chunks = chunk(text, strategy, 10, 2).unwrap();
            assert!(!chunks.is_empty());
        }
    }
}
