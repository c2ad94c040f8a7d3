//! Recursive character chunking.
//!
//! Splits on the coarsest separator present in the text, merges the pieces
//! greedily up to the chunk size, and recurses into pieces that are still too
//! large with the next separator. Each piece keeps its trailing separator, so
//! every chunk is an exact slice of the source.

use super::{Chunk, Chunker, ChunkingConfig};
use crate::error::Result;
use std::collections::VecDeque;
use tracing::debug;

/// Separator priority: paragraph, line, sentence, word, then a hard cut.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "? ", "! ", " ", ""];

/// Byte range of a piece of the source, with its length in characters.
#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
    chars: usize,
}

/// Splitter that prefers paragraph, sentence and word boundaries.
#[derive(Default)]
pub struct RecursiveChunker {
    config: ChunkingConfig,
}

impl RecursiveChunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Cut `text[start..end]` into pieces ending with `separator`.
    fn pieces(text: &str, start: usize, end: usize, separator: &str) -> Vec<Span> {
        let slice = &text[start..end];

        if separator.is_empty() {
            return slice
                .char_indices()
                .map(|(offset, c)| Span {
                    start: start + offset,
                    end: start + offset + c.len_utf8(),
                    chars: 1,
                })
                .collect();
        }

        let mut offset = start;
        slice
            .split_inclusive(separator)
            .map(|piece| {
                let span = Span {
                    start: offset,
                    end: offset + piece.len(),
                    chars: piece.chars().count(),
                };
                offset = span.end;
                span
            })
            .collect()
    }

    fn split(&self, text: &str, start: usize, end: usize, separators: &[&str], out: &mut Vec<Span>) {
        let slice = &text[start..end];
        let index = separators
            .iter()
            .position(|sep| sep.is_empty() || slice.contains(*sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(index).copied().unwrap_or("");
        let remaining = separators.get(index + 1..).unwrap_or(&[]);

        let mut fitting: Vec<Span> = Vec::new();
        for piece in Self::pieces(text, start, end, separator) {
            if piece.chars <= self.config.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                self.merge(&fitting, out);
                fitting.clear();
            }

            if remaining.is_empty() {
                out.push(piece);
            } else {
                self.split(text, piece.start, piece.end, remaining, out);
            }
        }

        if !fitting.is_empty() {
            self.merge(&fitting, out);
        }
    }

    /// Greedily merge adjacent pieces into chunks, carrying up to
    /// `chunk_overlap` characters of trailing pieces into the next chunk.
    fn merge(&self, pieces: &[Span], out: &mut Vec<Span>) {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut window: VecDeque<Span> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            if total + piece.chars > size && !window.is_empty() {
                out.push(Self::join(&window, total));

                while total > overlap || (total + piece.chars > size && total > 0) {
                    match window.pop_front() {
                        Some(front) => total -= front.chars,
                        None => break,
                    }
                }
            }

            window.push_back(piece);
            total += piece.chars;
        }

        if !window.is_empty() {
            out.push(Self::join(&window, total));
        }
    }

    fn join(window: &VecDeque<Span>, total: usize) -> Span {
        Span {
            start: window.front().map(|s| s.start).unwrap_or(0),
            end: window.back().map(|s| s.end).unwrap_or(0),
            chars: total,
        }
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, text: &str) -> Result<Vec<Chunk>> {
        self.config.validate()?;

        let spans = if text.chars().count() <= self.config.chunk_size {
            vec![Span {
                start: 0,
                end: text.len(),
                chars: text.chars().count(),
            }]
        } else {
            let mut spans = Vec::new();
            self.split(text, 0, text.len(), DEFAULT_SEPARATORS, &mut spans);
            spans
        };

        let chunks: Vec<Chunk> = spans
            .into_iter()
            .filter(|span| !text[span.start..span.end].trim().is_empty())
            .enumerate()
            .map(|(order, span)| Chunk {
                order,
                text: text[span.start..span.end].to_string(),
                start: span.start,
                end: span.end,
            })
            .collect();

        debug!(
            "Split {} chars into {} chunks (size={}, overlap={})",
            text.chars().count(),
            chunks.len(),
            self.config.chunk_size,
            self.config.chunk_overlap
        );

        Ok(chunks)
    }
}
