//! Recursive separator-based text splitting with overlap.
//!
//! Separators are tried coarsest-first (`"\n\n"`, `"\n"`, `" "`, `""`);
//! oversize fragments descend to the next separator, and adjacent fragments
//! are greedily merged back up to the chunk budget. When a chunk is emitted,
//! the tail of the previous chunk re-seeds the next one to provide overlap.
//! An unsplittable fragment larger than the budget is emitted unchanged, so
//! output never drops input text.

/// Default separator cascade.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Recursive text chunker.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a chunker with the given character budget and overlap.
    #[must_use]
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
        }
    }

    /// Split `text` into chunks of at most `chunk_size` characters
    /// (oversize unsplittable fragments excepted).
    #[must_use]
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        self.split(text, &SEPARATORS)
    }

    fn split(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // First separator actually present in the text wins; "" is the
        // character-level last resort.
        let (sep_pos, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.is_empty() || text.contains(**sep))
            .map_or((separators.len() - 1, ""), |(i, sep)| (i, *sep));

        let raw_splits: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator).map(str::to_owned).collect()
        };

        let remaining = &separators[sep_pos + 1..];
        let mut good_splits = Vec::new();
        for piece in raw_splits {
            if piece.chars().count() <= self.chunk_size || remaining.is_empty() {
                good_splits.push(piece);
            } else {
                good_splits.extend(self.split(&piece, remaining));
            }
        }

        self.merge_splits(good_splits, separator)
    }

    fn merge_splits(&self, splits: Vec<String>, separator: &str) -> Vec<String> {
        let sep_len = separator.chars().count();
        let mut chunks = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut total = 0usize;

        for piece in splits {
            let piece_len = piece.chars().count();
            let join_len = if current.is_empty() { 0 } else { sep_len };

            if !current.is_empty() && total + join_len + piece_len > self.chunk_size {
                chunks.push(current.join(separator));
                // Re-seed the next chunk with the tail of the current one.
                while total > self.chunk_overlap && current.len() > 1 {
                    let dropped = current.remove(0);
                    total -= dropped.chars().count();
                    total = total.saturating_sub(sep_len);
                }
                if total > self.chunk_overlap {
                    current.clear();
                    total = 0;
                }
            }

            if !current.is_empty() {
                total += sep_len;
            }
            total += piece_len;
            current.push(piece);
        }

        if !current.is_empty() {
            let tail = current.join(separator);
            if chunks.last() != Some(&tail) {
                chunks.push(tail);
            }
        }

        chunks.retain(|c| !c.trim().is_empty());
        chunks
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let chunker = RecursiveChunker::new(100, 20);
        assert_eq!(chunker.split_text("hello world"), vec!["hello world"]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        let chunker = RecursiveChunker::new(100, 20);
        assert!(chunker.split_text("").is_empty());
    }

    #[test]
    fn paragraphs_split_before_words() {
        let chunker = RecursiveChunker::new(20, 0);
        let chunks = chunker.split_text("first paragraph\n\nsecond paragraph");
        assert_eq!(chunks, vec!["first paragraph", "second paragraph"]);
    }

    #[rstest]
    #[case(30, 0)]
    #[case(50, 10)]
    #[case(120, 40)]
    fn chunks_respect_budget(#[case] size: usize, #[case] overlap: usize) {
        let text = "word ".repeat(200);
        let chunker = RecursiveChunker::new(size, overlap);
        let chunks = chunker.split_text(&text);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(
                chunk.chars().count() <= size,
                "oversize chunk: {chunk:?}"
            );
        }
    }

    #[test]
    fn unsplittable_fragment_passes_through() {
        let long_token = "x".repeat(80);
        // Character-level descent still produces budget-sized chunks, but a
        // chunker limited to coarse separators must not drop the text.
        let chunker = RecursiveChunker::new(50, 0);
        let chunks = chunker.split_text(&long_token);
        let rejoined: String = chunks.concat();
        assert_eq!(rejoined, long_token);
    }

    #[test]
    fn no_text_is_dropped() {
        let text = "alpha beta gamma\ndelta epsilon\n\nzeta eta theta iota kappa";
        let chunker = RecursiveChunker::new(25, 5);
        let chunks = chunker.split_text(&text);
        for word in ["alpha", "epsilon", "kappa"] {
            assert!(
                chunks.iter().any(|c| c.contains(word)),
                "missing {word} in {chunks:?}"
            );
        }
    }

    #[test]
    fn overlap_reseeds_next_chunk() {
        let text = "aa bb cc dd ee ff gg hh";
        let chunker = RecursiveChunker::new(8, 4);
        let chunks = chunker.split_text(text);
        assert!(chunks.len() > 1);
        // Some token from the end of chunk N recurs at the start of N+1.
        let first_tail = chunks[0].split(' ').next_back().unwrap_or_default();
        assert!(chunks[1].contains(first_tail));
    }
}
