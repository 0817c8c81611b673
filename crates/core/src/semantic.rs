use crate::models::SemanticConfig;
use crate::sentences::split_sentences;

/// Narrow seam over sentence-embedding similarity so the chunker can be
/// exercised with a deterministic stub.
pub trait SentenceSimilarity {
    /// Cosine-style score in `[0, 1]`, higher means more related.
    fn similarity(&self, left: &str, right: &str) -> f32;
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Packs sentences greedily under the word budget. When a sentence overflows
/// the current chunk, the chunk is closed; its last sentence is carried into
/// the next chunk as a one-sentence overlap when the boundary pair scores at
/// or above the similarity threshold. Finished chunks below the minimum word
/// count are discarded.
///
/// A single sentence longer than the budget is still appended whole; sizing
/// is best-effort, not a hard cap.
pub fn semantic_chunk_text<S: SentenceSimilarity>(
    text: &str,
    config: &SemanticConfig,
    scorer: &S,
) -> Vec<String> {
    let sentences = split_sentences(text);
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_words = 0;

    for (index, sentence) in sentences.iter().enumerate() {
        let words = word_count(sentence);
        if current_words + words <= config.chunk_words {
            current.push(sentence.clone());
            current_words += words;
            continue;
        }

        // The boundary gate never fires for the final sentence; there is no
        // next chunk for the overlap to seed.
        let mut carried = None;
        if index < sentences.len() - 1 {
            if let Some(last) = current.last() {
                if scorer.similarity(last, sentence) >= config.similarity_threshold {
                    carried = Some(last.clone());
                }
            }
        }

        let finished = current.join(" ");
        if word_count(&finished) >= config.min_words_to_keep_last {
            chunks.push(finished);
        }

        current = carried.into_iter().collect();
        current.push(sentence.clone());
        current_words = current.iter().map(|item| word_count(item)).sum();
    }

    if !current.is_empty() {
        let finished = current.join(" ");
        if word_count(&finished) >= config.min_words_to_keep_last {
            chunks.push(finished);
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns the same score for every pair.
    struct FixedScore(f32);

    impl SentenceSimilarity for FixedScore {
        fn similarity(&self, _left: &str, _right: &str) -> f32 {
            self.0
        }
    }

    fn sentence(word: &str, count: usize) -> String {
        let mut words = vec![word.to_string(); count];
        words[count - 1] = format!("{word}.");
        words.join(" ")
    }

    fn config(chunk_words: usize, min_words: usize) -> SemanticConfig {
        SemanticConfig {
            chunk_words,
            min_words_to_keep_last: min_words,
            similarity_threshold: 0.75,
        }
    }

    #[test]
    fn similar_boundary_carries_one_sentence_of_overlap() {
        // Three 6-word sentences against a 12-word budget: the third
        // overflows and the second is carried over.
        let text = format!(
            "{} {} {}",
            sentence("Alpha", 6),
            sentence("Beta", 6),
            sentence("Gamma", 6)
        );
        // A fourth sentence keeps the overflow off the final-sentence path.
        let text = format!("{text} {}", sentence("Delta", 6));

        let chunks = semantic_chunk_text(&text, &config(12, 1), &FixedScore(0.9));
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].ends_with("Beta."));
        assert!(chunks[1].starts_with("Beta"));
        assert!(chunks[1].contains("Gamma"));
        assert!(chunks[2].starts_with("Delta"));
    }

    #[test]
    fn dissimilar_boundary_starts_a_fresh_chunk() {
        let text = format!(
            "{} {} {} {}",
            sentence("Alpha", 6),
            sentence("Beta", 6),
            sentence("Gamma", 6),
            sentence("Delta", 6)
        );

        let chunks = semantic_chunk_text(&text, &config(12, 1), &FixedScore(0.5));
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].starts_with("Gamma"));
        assert!(!chunks[1].contains("Beta"));
    }

    #[test]
    fn undersized_chunks_are_discarded() {
        let text = format!("{} {}", sentence("Alpha", 3), sentence("Beta", 40));
        // First chunk closes at 3 words, below the minimum of 5.
        let chunks = semantic_chunk_text(&text, &config(10, 5), &FixedScore(0.0));
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].starts_with("Beta"));
    }

    #[test]
    fn document_shorter_than_minimum_yields_nothing() {
        let chunks = semantic_chunk_text("Too short.", &config(500, 50), &FixedScore(0.9));
        assert!(chunks.is_empty());
    }

    #[test]
    fn oversized_sentence_is_kept_whole() {
        let text = format!("{} {}", sentence("Alpha", 4), sentence("Huge", 30));
        let chunks = semantic_chunk_text(&text, &config(10, 1), &FixedScore(0.0));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].split_whitespace().count(), 30);
    }
}
