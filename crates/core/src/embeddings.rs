use crate::semantic::SentenceSimilarity;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 256;

/// Text-to-vector seam. The shipped implementation is a deterministic
/// hashing embedder; swapping in a real model is a matter of implementing
/// this trait.
pub trait Embedder {
    fn dimensions(&self) -> usize;
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Hashes lowercased word unigrams and character trigrams into a fixed
/// number of buckets and L2-normalizes the result. No model weights, fully
/// reproducible, good enough to make cosine ranking meaningful on plain
/// prose.
#[derive(Debug, Clone, Copy)]
pub struct HashedNgramEmbedder {
    pub dimensions: usize,
}

impl Default for HashedNgramEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

fn fnv1a(bytes: impl Iterator<Item = u8>) -> u64 {
    let mut hash = 1469598103934665603u64;
    for byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}

impl Embedder for HashedNgramEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();

        for word in lowered.split_whitespace() {
            let word: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
            if word.is_empty() {
                continue;
            }

            let bucket = fnv1a(word.bytes()) % vector.len() as u64;
            vector[bucket as usize] += 2.0;

            let chars: Vec<char> = word.chars().collect();
            for trigram in chars.windows(3) {
                let bucket =
                    fnv1a(trigram.iter().collect::<String>().bytes()) % vector.len() as u64;
                vector[bucket as usize] += 1.0;
            }
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }
    let dot: f32 = left.iter().zip(right).map(|(a, b)| a * b).sum();
    let left_norm: f32 = left.iter().map(|value| value * value).sum::<f32>().sqrt();
    let right_norm: f32 = right.iter().map(|value| value * value).sum::<f32>().sqrt();
    if left_norm == 0.0 || right_norm == 0.0 {
        return 0.0;
    }
    dot / (left_norm * right_norm)
}

/// Scores sentence pairs by embedding both sides and taking the cosine.
pub struct EmbeddingSimilarity<E: Embedder> {
    embedder: E,
}

impl<E: Embedder> EmbeddingSimilarity<E> {
    pub fn new(embedder: E) -> Self {
        Self { embedder }
    }
}

impl<E: Embedder> SentenceSimilarity for EmbeddingSimilarity<E> {
    fn similarity(&self, left: &str, right: &str) -> f32 {
        cosine_similarity(&self.embedder.embed(left), &self.embedder.embed(right))
    }
}
