//! Context formatting for the question-answering prompt.

use super::RetrievalResult;

/// Join retrieved chunk texts for the prompt, nearest first.
///
/// Chunk metadata is dropped; each text is trimmed and separated by a blank line.
pub fn format_context_for_prompt(result: &RetrievalResult) -> String {
    result
        .texts()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::chunks_of;
    use crate::vector_store::Neighbor;

    fn result(texts: &[&str]) -> RetrievalResult {
        RetrievalResult {
            neighbors: chunks_of(texts)
                .into_iter()
                .enumerate()
                .map(|(i, chunk)| Neighbor {
                    chunk,
                    distance: i as f32 * 0.5,
                })
                .collect(),
        }
    }

    #[test]
    fn test_prompt_context() {
        let result = result(&["  first chunk ", "second chunk\n", "   "]);
        assert_eq!(format_context_for_prompt(&result), "first chunk\n\nsecond chunk");
        assert_eq!(format_context_for_prompt(&RetrievalResult::default()), "");
    }
}
