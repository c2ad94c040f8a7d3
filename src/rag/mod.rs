//! Retrieval-augmented question answering over one transcript.
//!
//! The index is built from transcript chunks by [`build_index`], queried with
//! [`retrieve`], and the hits are formatted into the QA prompt.

pub mod context;
mod indexer;
mod retriever;

pub use context::format_context_for_prompt;
pub use indexer::build_index;
pub use retriever::{retrieve, RetrievalResult, Source};

use serde::Serialize;

/// An answer with the chunks it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Generated answer text.
    pub answer: String,
    /// Retrieved chunks, nearest first.
    pub sources: Vec<Source>,
}
