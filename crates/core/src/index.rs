use crate::embeddings::{cosine_similarity, Embedder};
use crate::error::QueryError;
use crate::ingest::{load_chunk_folder, LoadedChunk};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub chunk_id: String,
    pub source: String,
    pub text: String,
    pub vector: Vec<f32>,
}

/// A retrieval hit, best first.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk_id: String,
    pub source: String,
    pub text: String,
    pub score: f32,
}

/// Flat in-memory similarity index. Search is a linear cosine scan, which is
/// plenty for per-corpus scale; persistence is plain serde JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    dimensions: usize,
    built_at: DateTime<Utc>,
    entries: Vec<IndexedChunk>,
}

impl VectorIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            built_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, chunk: IndexedChunk) -> Result<(), QueryError> {
        if chunk.vector.len() != self.dimensions {
            return Err(QueryError::Request(format!(
                "vector dimension {} does not match index dimension {}",
                chunk.vector.len(),
                self.dimensions
            )));
        }
        self.entries.push(chunk);
        Ok(())
    }

    pub fn search(&self, query_vector: &[f32], top_k: usize) -> Vec<RetrievedChunk> {
        let mut hits: Vec<RetrievedChunk> = self
            .entries
            .iter()
            .map(|entry| RetrievedChunk {
                chunk_id: entry.chunk_id.clone(),
                source: entry.source.clone(),
                text: entry.text.clone(),
                score: cosine_similarity(query_vector, &entry.vector),
            })
            .collect();
        hits.sort_by(|left, right| right.score.total_cmp(&left.score));
        hits.truncate(top_k);
        hits
    }

    pub fn save(&self, path: &Path) -> Result<(), QueryError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, QueryError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Embeds every chunk found under `chunks_folder` (either chunk-file shape)
/// into a fresh index.
pub fn build_index_from_chunks<E: Embedder>(
    chunks_folder: &Path,
    embedder: &E,
) -> Result<VectorIndex, QueryError> {
    let loaded = load_chunk_folder(chunks_folder)
        .map_err(|error| QueryError::Request(error.to_string()))?;

    let mut index = VectorIndex::new(embedder.dimensions());
    for LoadedChunk {
        chunk_id,
        source,
        text,
    } in loaded
    {
        let vector = embedder.embed(&text);
        index.insert(IndexedChunk {
            chunk_id,
            source,
            text,
            vector,
        })?;
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashedNgramEmbedder;
    use tempfile::tempdir;

    fn entry(id: &str, text: &str, vector: Vec<f32>) -> IndexedChunk {
        IndexedChunk {
            chunk_id: id.to_string(),
            source: format!("{id}.json"),
            text: text.to_string(),
            vector,
        }
    }

    #[test]
    fn search_ranks_by_cosine() {
        let mut index = VectorIndex::new(2);
        index.insert(entry("near", "near", vec![1.0, 0.0])).unwrap();
        index.insert(entry("far", "far", vec![0.0, 1.0])).unwrap();
        index
            .insert(entry("close", "close", vec![0.9, 0.1]))
            .unwrap();

        let hits = index.search(&[1.0, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_id, "near");
        assert_eq!(hits[1].chunk_id, "close");
    }

    #[test]
    fn mismatched_dimension_is_rejected() {
        let mut index = VectorIndex::new(4);
        let result = index.insert(entry("bad", "bad", vec![1.0]));
        assert!(matches!(result, Err(QueryError::Request(_))));
    }

    #[test]
    fn save_and_load_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("store").join("index.json");

        let mut index = VectorIndex::new(3);
        index
            .insert(entry("a-0000", "alpha", vec![1.0, 0.0, 0.0]))
            .unwrap();
        index.save(&path)?;

        let restored = VectorIndex::load(&path)?;
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.dimensions(), 3);
        let hits = restored.search(&[1.0, 0.0, 0.0], 1);
        assert_eq!(hits[0].chunk_id, "a-0000");
        Ok(())
    }

    #[test]
    fn index_builder_embeds_chunk_files() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        std::fs::write(
            dir.path().join("doc.json"),
            serde_json::json!({
                "file": "doc.json",
                "chunks": ["pump maintenance schedule", "boiler inspection notes"]
            })
            .to_string(),
        )?;

        let embedder = HashedNgramEmbedder { dimensions: 32 };
        let index = build_index_from_chunks(dir.path(), &embedder)?;
        assert_eq!(index.len(), 2);

        let hits = index.search(&embedder.embed("pump maintenance"), 1);
        assert_eq!(hits[0].chunk_id, "doc-0000");
        Ok(())
    }
}
