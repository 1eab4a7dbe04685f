//! Recursive character text splitter

use std::collections::VecDeque;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text on the coarsest separator that keeps pieces under `chunk_size`,
/// then merges neighbouring pieces back together with `chunk_overlap` characters
/// of shared context.
///
/// Lengths are counted in characters. No chunk ever exceeds `chunk_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// An overlap of `chunk_size` or more is reduced to `chunk_size - 1`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with(text, &SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let finer = separators.get(position + 1..).unwrap_or(&[]);

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|p| !p.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) <= self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting, separator));
                fitting.clear();
            }
            if finer.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_with(piece, finer));
            }
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting, separator));
        }
        chunks
    }

    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(piece);
            let joiner = if current.is_empty() { 0 } else { separator_len };

            if total + len + joiner > self.chunk_size && !current.is_empty() {
                push_joined(&mut chunks, &current, separator);
                // Drop from the front until only the overlap remains and the next piece fits
                while total > self.chunk_overlap
                    || (total > 0
                        && total + len + if current.is_empty() { 0 } else { separator_len }
                            > self.chunk_size)
                {
                    let Some(first) = current.pop_front() else {
                        break;
                    };
                    let joiner = if current.is_empty() { 0 } else { separator_len };
                    total -= char_len(first) + joiner;
                }
            }

            let joiner = if current.is_empty() { 0 } else { separator_len };
            current.push_back(piece);
            total += len + joiner;
        }
        push_joined(&mut chunks, &current, separator);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, pieces: &VecDeque<&str>, separator: &str) {
    let joined = pieces.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        let splitter = TextSplitter::new(100, 20);
        assert_eq!(splitter.split_text("hello world"), vec!["hello world"]);
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text("   \n\n  ").is_empty());
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let splitter = TextSplitter::new(30, 0);
        let text = "first paragraph here\n\nsecond paragraph here\n\nthird";
        let chunks = splitter.split_text(text);
        assert_eq!(
            chunks,
            vec!["first paragraph here", "second paragraph here\n\nthird"]
        );
    }

    #[test]
    fn test_chunks_never_exceed_size() {
        let splitter = TextSplitter::new(50, 10);
        let text = "=== TOP PROCESSES ===\n".to_string()
            + &(0..40)
                .map(|i| format!("- worker{} (PID: {}) - CPU: 1.0%", i, 1000 + i))
                .collect::<Vec<_>>()
                .join("\n")
            + "\n"
            + &"x".repeat(170);
        let chunks = splitter.split_text(&text);
        assert!(chunks.len() > 10);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50, "chunk too long: {chunk:?}");
        }
        // The unbroken run is cut at the character level
        assert!(chunks.iter().any(|c| c == &"x".repeat(50)));
    }

    #[test]
    fn test_overlap_repeats_trailing_words() {
        let splitter = TextSplitter::new(20, 10);
        let chunks = splitter.split_text("alpha beta gamma delta epsilon zeta");
        assert_eq!(
            chunks,
            vec!["alpha beta gamma", "beta gamma delta", "delta epsilon zeta"]
        );
        for pair in chunks.windows(2) {
            let last_word = pair[0].rsplit(' ').next().unwrap();
            assert!(pair[1].contains(last_word));
        }
    }

    #[test]
    fn test_multibyte_characters() {
        let splitter = TextSplitter::new(4, 0);
        let chunks = splitter.split_text("°C°C°C°C°C");
        assert_eq!(chunks, vec!["°C°C", "°C°C", "°C"]);
    }

    #[test]
    fn test_overlap_is_clamped() {
        let splitter = TextSplitter::new(5, 50);
        let chunks = splitter.split_text("aaaaa bbbbb ccccc");
        assert_eq!(chunks, vec!["aaaaa", "bbbbb", "ccccc"]);
    }
}
