//! Text chunking module
//!
//! Splits normalized text into overlapping fixed-size windows for embedding.

use insurellm_common::config::ChunkingConfig;
use tracing::debug;

/// Split text into overlapping fixed-size chunks.
///
/// Windows advance by `chunk_size - overlap` characters, so consecutive
/// chunks share exactly `overlap` characters; the final chunk may be
/// shorter. Every character of the input is covered by at least one chunk.
/// Operates on char boundaries, so multi-byte text never splits a scalar
/// value. Requires `overlap < chunk_size` (validated at config load).
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + config.chunk_size).min(total);
        chunks.push(chars[start..end].iter().collect());
        if end == total {
            break;
        }
        start = end - config.overlap;
    }

    debug!(
        input_len = total,
        chunk_count = chunks.len(),
        chunk_size = config.chunk_size,
        overlap = config.overlap,
        "Text chunked"
    );

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size,
            overlap,
        }
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunk_text("", &ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn test_short_text_yields_single_chunk() {
        let chunks = chunk_text("short", &ChunkingConfig::default());
        assert_eq!(chunks, vec!["short"]);
    }

    #[test]
    fn test_window_offsets() {
        // 2500 chars with size 1200 / overlap 200 must produce windows at
        // [0,1200), [1000,2200), [2000,2500).
        let text: String = (0..2500).map(|i| ((i % 26) as u8 + b'a') as char).collect();
        let chunks = chunk_text(&text, &config(1200, 200));

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], text[0..1200]);
        assert_eq!(chunks[1], text[1000..2200]);
        assert_eq!(chunks[2], text[2000..2500]);
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let text: String = "x".repeat(100);
        let chunks = chunk_text(&text, &config(40, 10));

        for pair in chunks.windows(2) {
            let prev_tail: String = pair[0].chars().rev().take(10).collect();
            let next_head: String = pair[1].chars().take(10).collect();
            let prev_tail: String = prev_tail.chars().rev().collect();
            assert_eq!(prev_tail, next_head);
        }
    }

    #[test]
    fn test_full_coverage_reconstruction() {
        let text: String = (0..997).map(|i| ((i % 26) as u8 + b'A') as char).collect();
        let cfg = config(100, 25);
        let chunks = chunk_text(&text, &cfg);

        // Dropping each chunk's leading overlap (after the first) and
        // concatenating must reconstruct the input exactly.
        let mut rebuilt = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                rebuilt.push_str(chunk);
            } else {
                rebuilt.extend(chunk.chars().skip(cfg.overlap));
            }
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text: String = (0..3000).map(|i| ((i % 26) as u8 + b'a') as char).collect();
        let cfg = ChunkingConfig::default();
        assert_eq!(chunk_text(&text, &cfg), chunk_text(&text, &cfg));
    }

    #[test]
    fn test_multibyte_text_chunks_on_char_boundaries() {
        let text: String = "é".repeat(50);
        let chunks = chunk_text(&text, &config(20, 5));
        assert!(chunks.iter().all(|c| c.chars().count() <= 20));
        let rebuilt: String = chunks
            .iter()
            .enumerate()
            .flat_map(|(i, c)| c.chars().skip(if i == 0 { 0 } else { 5 }))
            .collect();
        assert_eq!(rebuilt, text);
    }
}
