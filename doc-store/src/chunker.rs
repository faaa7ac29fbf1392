//! Lazy, restartable text chunking with character-based windows and soft breaks.
//!
//! A window of `size` characters is cut at the best separator found in its second half
//! (paragraph, line, sentence, clause, word), otherwise at the hard window end.
//! Consecutive chunks overlap by `overlap` characters; every chunk advances by at least one.

use serde::Serialize;

use crate::errors::{Result, StoreError};

/// Separator preference, first match wins.
const SEPARATORS: [&str; 8] = ["\n\n", "\n", ". ", "! ", "? ", "; ", ", ", " "];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ChunkerConfig {
    /// Window size in characters.
    pub size: usize,
    /// Characters shared by consecutive chunks.
    pub overlap: usize,
}

impl ChunkerConfig {
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        let cfg = Self { size, overlap };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(StoreError::Config("chunk size must be > 0".into()));
        }
        if self.overlap >= self.size {
            return Err(StoreError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.overlap, self.size
            )));
        }
        Ok(())
    }

    /// Chunk iterator over `text`.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunker<'a> {
        Chunker::new(text, *self)
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            size: 1000,
            overlap: 200,
        }
    }
}

/// One chunk borrowed from the source text. `start`/`end` are character offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkSpan<'a> {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

/// Iterator over [`ChunkSpan`]s. Cloning restarts from the clone's position.
#[derive(Clone, Debug)]
pub struct Chunker<'a> {
    text: &'a str,
    cfg: ChunkerConfig,
    /// Character cursor.
    pos: usize,
    /// Byte offset matching `pos`.
    byte_pos: usize,
    total_chars: usize,
    index: usize,
}

impl<'a> Chunker<'a> {
    pub fn new(text: &'a str, cfg: ChunkerConfig) -> Self {
        Self {
            text,
            cfg,
            pos: 0,
            byte_pos: 0,
            total_chars: text.chars().count(),
            index: 0,
        }
    }
}

impl<'a> Iterator for Chunker<'a> {
    type Item = ChunkSpan<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.total_chars {
            return None;
        }

        let rest = &self.text[self.byte_pos..];
        let remaining = self.total_chars - self.pos;
        let (len_chars, len_bytes) = if remaining <= self.cfg.size {
            (remaining, rest.len())
        } else {
            let window_bytes = byte_len_of_n_chars(rest, self.cfg.size);
            let window = &rest[..window_bytes];
            match find_break(window, self.cfg.size) {
                Some(b) => (window[..b].chars().count(), b),
                None => (self.cfg.size, window_bytes),
            }
        };

        let start = self.pos;
        let end = start + len_chars;
        let span = ChunkSpan {
            index: self.index,
            start,
            end,
            text: &rest[..len_bytes],
        };
        self.index += 1;

        if end >= self.total_chars {
            self.pos = self.total_chars;
            self.byte_pos = self.text.len();
        } else {
            let next = end.saturating_sub(self.cfg.overlap).max(start + 1);
            let advance = byte_len_of_n_chars(rest, next - start);
            self.pos = next;
            self.byte_pos += advance;
        }
        Some(span)
    }
}

/// Byte offset just past the best separator in the second half of `window`.
fn find_break(window: &str, size_chars: usize) -> Option<usize> {
    let half_bytes = byte_len_of_n_chars(window, size_chars / 2);
    SEPARATORS.iter().find_map(|sep| {
        window
            .rfind(sep)
            .map(|i| i + sep.len())
            .filter(|&b| b > half_bytes && b <= window.len())
    })
}

/// Byte length of the first `n` chars of `s` (clamped).
fn byte_len_of_n_chars(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

/// Rebuilds the original text from spans, dropping each overlap.
pub fn reconstruct(spans: &[ChunkSpan<'_>]) -> String {
    let mut out = String::new();
    let mut prev_end = 0usize;
    for s in spans {
        let skip = prev_end.saturating_sub(s.start);
        out.extend(s.text.chars().skip(skip));
        prev_end = prev_end.max(s.end);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(size: usize, overlap: usize) -> ChunkerConfig {
        ChunkerConfig::new(size, overlap).unwrap()
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert_eq!(cfg(100, 10).chunks("").count(), 0);
    }

    #[test]
    fn short_input_is_single_chunk() {
        let spans: Vec<_> = cfg(100, 10).chunks("hello world").collect();
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].start, spans[0].end), (0, 11));
        assert_eq!(spans[0].text, "hello world");

        let exact = "x".repeat(100);
        assert_eq!(cfg(100, 10).chunks(&exact).count(), 1);
    }

    #[test]
    fn hard_windows_without_separators() {
        let text = "a".repeat(250);
        let spans: Vec<_> = cfg(100, 20).chunks(&text).collect();
        let bounds: Vec<_> = spans.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(bounds, vec![(0, 100), (80, 180), (160, 250)]);
    }

    #[test]
    fn prefers_paragraph_break_in_second_half() {
        let text = format!("{}\n\n{}", "a".repeat(70), "b".repeat(70));
        let spans: Vec<_> = cfg(100, 0).chunks(&text).collect();
        assert_eq!(spans[0].text, format!("{}\n\n", "a".repeat(70)));
        assert_eq!(spans[1].text, "b".repeat(70));
    }

    #[test]
    fn ignores_break_in_first_half() {
        let text = format!("ab {}", "c".repeat(200));
        let spans: Vec<_> = cfg(100, 0).chunks(&text).collect();
        assert_eq!(spans[0].end, 100);
    }

    #[test]
    fn round_trip_for_many_lengths() {
        let base = "The quick brown fox. Jumps over; the lazy dog!\nNew line here, and more words?\n\n";
        let long: String = base.chars().cycle().take(700).collect();
        for n in 0..=long.chars().count() {
            let text: String = long.chars().take(n).collect();
            let spans: Vec<_> = cfg(120, 30).chunks(&text).collect();
            assert_eq!(reconstruct(&spans), text, "length {n}");
            if n > 0 {
                assert_eq!(spans[0].start, 0);
                assert_eq!(spans.last().unwrap().end, n);
            }
            for w in spans.windows(2) {
                assert!(w[1].start > w[0].start);
                assert!(w[1].start <= w[0].end, "gap at length {n}");
            }
        }
    }

    #[test]
    fn multibyte_text_is_split_on_char_boundaries() {
        let text = "héllo wörld ünïcödé ".repeat(20);
        let spans: Vec<_> = cfg(50, 10).chunks(&text).collect();
        assert!(spans.len() > 1);
        assert_eq!(reconstruct(&spans), text);
        for s in &spans {
            assert_eq!(s.text.chars().count(), s.end - s.start);
        }
    }

    #[test]
    fn clone_restarts_iteration() {
        let text = "z".repeat(300);
        let chunker = cfg(100, 0).chunks(&text);
        let first: Vec<_> = chunker.clone().collect();
        let second: Vec<_> = chunker.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(ChunkerConfig::new(100, 100).is_err());
        assert!(ChunkerConfig::new(0, 0).is_err());
    }
}
