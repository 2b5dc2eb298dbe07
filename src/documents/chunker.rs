// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Splits extracted document text into overlapping chunks sized for embedding

use super::extract::RawDocument;

/// Configuration for text chunking
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Target chunk size in characters
    pub target_chars: usize,
    /// Overlap carried from the end of one chunk into the next
    pub overlap_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            target_chars: 1024,
            overlap_chars: 128,
        }
    }
}

/// A segment of extracted document text small enough to embed individually
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChunk {
    pub text: String,
    /// File name the chunk was extracted from
    pub source: String,
    /// Position of the chunk within its source document
    pub index: usize,
}

/// Split one document into overlapping chunks.
pub fn chunk_document(document: &RawDocument, config: &ChunkerConfig) -> Vec<DocumentChunk> {
    chunk_text(&document.text, config)
        .into_iter()
        .enumerate()
        .map(|(index, text)| DocumentChunk {
            text,
            source: document.name.clone(),
            index,
        })
        .collect()
}

/// Split text into chunks of roughly `target_chars` characters, breaking at
/// whitespace boundaries where possible. Adjacent chunks share an overlap of
/// up to `overlap_chars` so sentences cut at a boundary stay retrievable.
pub fn chunk_text(text: &str, config: &ChunkerConfig) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let target = config.target_chars.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let mut end = (start + target).min(chars.len());

        if end < chars.len() {
            // Back up to the last whitespace, unless that would shrink the
            // chunk below half the target (long unbroken token)
            let mut cut = end;
            while cut > start && !chars[cut - 1].is_whitespace() {
                cut -= 1;
            }
            if cut > start + target / 2 {
                end = cut;
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if end >= chars.len() {
            break;
        }

        // Next chunk starts inside the overlap window, snapped forward to a
        // whitespace boundary so words are never split across chunks
        let overlap_start = end.saturating_sub(config.overlap_chars.min(target - 1));
        let mut next = overlap_start;
        while next < end && !chars[next].is_whitespace() {
            next += 1;
        }
        let next = if next < end { next + 1 } else { end };
        // Must always advance
        start = next.max(start + 1);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(target: usize, overlap: usize) -> ChunkerConfig {
        ChunkerConfig {
            target_chars: target,
            overlap_chars: overlap,
        }
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunk_text("Maximum axle load is 11,500 kg", &ChunkerConfig::default());
        assert_eq!(chunks, vec!["Maximum axle load is 11,500 kg".to_string()]);
    }

    #[test]
    fn test_empty_text_produces_no_chunks() {
        assert!(chunk_text("", &ChunkerConfig::default()).is_empty());
        assert!(chunk_text("   \n\t  ", &ChunkerConfig::default()).is_empty());
    }

    #[test]
    fn test_chunks_break_at_whitespace() {
        let words: Vec<String> = (0..100).map(|i| format!("word{:03}", i)).collect();
        let text = words.join(" ");

        let chunks = chunk_text(&text, &config(50, 10));
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            // No chunk starts or ends mid-word
            for word in chunk.split_whitespace() {
                assert!(words.iter().any(|w| w == word), "split word: {}", word);
            }
        }
    }

    #[test]
    fn test_every_word_appears_in_some_chunk() {
        let words: Vec<String> = (0..200).map(|i| format!("tok{}", i)).collect();
        let text = words.join(" ");
        let chunks = chunk_text(&text, &config(64, 16));

        let joined = chunks.join(" ");
        for word in &words {
            assert!(joined.contains(word.as_str()), "missing word: {}", word);
        }
    }

    #[test]
    fn test_adjacent_chunks_overlap() {
        let words: Vec<String> = (0..100).map(|i| format!("word{:03}", i)).collect();
        let text = words.join(" ");
        let chunks = chunk_text(&text, &config(60, 20));
        assert!(chunks.len() > 2);

        for pair in chunks.windows(2) {
            let last_word = pair[0].split_whitespace().last().unwrap();
            // Overlap means the next chunk repeats trailing words of this one
            assert!(
                pair[1].contains(last_word) || pair[0].len() < 60,
                "no overlap between '{}' and '{}'",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_long_unbroken_token_is_hard_cut() {
        let text = "a".repeat(300);
        let chunks = chunk_text(&text, &config(100, 10));
        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| c.len() <= 100));
    }

    #[test]
    fn test_chunk_document_records_source_and_index() {
        let doc = RawDocument {
            name: "rules.pdf".to_string(),
            text: (0..50)
                .map(|i| format!("sentence number {}", i))
                .collect::<Vec<_>>()
                .join(". "),
        };
        let chunks = chunk_document(&doc, &config(100, 20));
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.source, "rules.pdf");
            assert_eq!(chunk.index, i);
        }
    }
}
