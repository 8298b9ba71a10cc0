//! Splits a document into bounded-length pieces for synthesis.
//!
//! Piper handles a few thousand characters per call comfortably; whole books
//! do not fit. The chunker walks the text with a cursor, preferring to break
//! at whitespace so words are never cut in half.

use crate::pipeline::PipelineError;

/// Upper bound on chunk length, in characters. Not user-configurable.
pub const MAX_CHUNK_LEN: usize = 2000;

/// Split `text` into trimmed pieces of at most `max_len` characters each.
///
/// The split point is the last whitespace inside the window when one exists
/// strictly after the cursor; otherwise the window is cut at `max_len`
/// mid-word. That fallback keeps the cursor advancing at least one character
/// per iteration, so the loop terminates on any input, including text with
/// no whitespace at all.
///
/// Windows that trim to nothing (runs of whitespace) produce no chunk, so
/// the result is non-empty exactly when `text` has non-whitespace content.
/// Rejoining the chunks with single spaces yields the whitespace-normalized
/// form of the input; exact byte-level reconstruction is not a goal.
pub fn chunk_text(text: &str, max_len: usize) -> Result<Vec<String>, PipelineError> {
    if max_len == 0 {
        return Err(PipelineError::InvalidConfiguration);
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < text.len() {
        let window = &text[start..];
        // Candidate end: at most `max_len` characters past the cursor.
        let mut end = start
            + window
                .char_indices()
                .nth(max_len)
                .map_or(window.len(), |(offset, _)| offset);
        if end < text.len() {
            // Break at the last whitespace strictly after the cursor. A
            // whitespace at offset 0 is the separator left over from the
            // previous split and cannot be a split point.
            if let Some(ws) = text[start..end].rfind(char::is_whitespace) {
                if ws > 0 {
                    end = start + ws;
                }
            }
        }

        let piece = text[start..end].trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
        start = end;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lengths(chunks: &[String]) -> Vec<usize> {
        chunks.iter().map(|c| c.chars().count()).collect()
    }

    #[test]
    fn splits_at_whitespace_within_the_window() {
        let chunks = chunk_text("The quick brown fox jumps over the lazy dog", 10).unwrap();
        assert_eq!(
            chunks,
            vec!["The quick", "brown", "fox", "jumps", "over the", "lazy dog"]
        );
        assert!(lengths(&chunks).iter().all(|&len| len <= 10));
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert_eq!(chunk_text("", 10).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn whitespace_only_input_yields_no_chunks() {
        assert_eq!(chunk_text("  \n\t  ", 4).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn zero_max_len_is_rejected() {
        assert!(matches!(
            chunk_text("anything", 0),
            Err(PipelineError::InvalidConfiguration)
        ));
    }

    #[test]
    fn whitespace_free_text_is_cut_at_the_window() {
        let chunks = chunk_text(&"a".repeat(25), 10).unwrap();
        assert_eq!(chunks, vec!["a".repeat(10), "a".repeat(10), "a".repeat(5)]);
    }

    #[test]
    fn terminates_with_max_len_one() {
        let chunks = chunk_text("ab cd", 1).unwrap();
        assert_eq!(chunks, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn terminates_when_window_starts_at_the_only_whitespace() {
        // After the first split the next window opens on the separator space
        // and contains no other whitespace; the cut must fall back to the
        // window boundary instead of stalling.
        let text = format!("{} {}", "a".repeat(9), "b".repeat(21));
        let chunks = chunk_text(&text, 10).unwrap();
        assert_eq!(chunks[0], "a".repeat(9));
        assert!(chunks[1..].iter().all(|c| c.chars().all(|ch| ch == 'b')));
        assert_eq!(chunks.iter().map(String::len).sum::<usize>(), 9 + 21);
        assert!(lengths(&chunks).iter().all(|&len| len <= 10));
    }

    #[test]
    fn max_len_counts_characters_not_bytes() {
        let chunks = chunk_text("ééééé ééééé", 7).unwrap();
        assert_eq!(chunks, vec!["ééééé", "ééééé"]);
    }

    #[test]
    fn rejoined_chunks_preserve_the_word_sequence() {
        let text = "First paragraph with several words.\n\nSecond   paragraph,\twith odd\nspacing and a reasonably long tail of words to force multiple windows.";
        let chunks = chunk_text(text, 24).unwrap();
        let rejoined = chunks.join(" ");
        assert_eq!(
            rejoined.split_whitespace().collect::<Vec<_>>(),
            text.split_whitespace().collect::<Vec<_>>()
        );
        assert!(lengths(&chunks).iter().all(|&len| len <= 24));
    }
}
