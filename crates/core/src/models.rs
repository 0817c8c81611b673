use serde::{Deserialize, Serialize};

/// One page of extracted document text, as produced by the extraction step
/// and consumed by the chunkers. Pages may arrive unsorted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub doc_id: String,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub content: String,
}

/// Accepted shapes for an input document file: either a list of page
/// records or a single object carrying the whole text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DocumentFile {
    Pages(Vec<Page>),
    Single(SingleDocument),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SingleDocument {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl DocumentFile {
    /// Flattens the document to one string, page contents joined in page
    /// order by a single space. Used by the semantic chunker, which trades
    /// page provenance for sentence-accurate boundaries.
    pub fn into_flat_text(self) -> String {
        match self {
            DocumentFile::Pages(mut pages) => {
                pages.sort_by_key(|page| page.page_number);
                pages
                    .iter()
                    .map(|page| page.content.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            }
            DocumentFile::Single(single) => single.content.or(single.text).unwrap_or_default(),
        }
    }
}

/// A fixed-window chunk with page provenance. Serialized field order matches
/// the on-disk contract consumed by the indexing step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowChunk {
    pub chunk_index: usize,
    pub content: String,
    pub n_words: usize,
    pub pages: Vec<u32>,
    pub page_range: Option<(u32, u32)>,
    pub doc_id: String,
    pub source_file: String,
    pub chunk_id: String,
}

/// Output of the semantic chunker for one document: content strings only,
/// no page metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticChunkFile {
    pub file: String,
    pub chunks: Vec<String>,
}

/// Sliding-window chunker parameters.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Target words per chunk.
    pub chunk_words: usize,
    /// Words shared between consecutive chunks.
    pub overlap_words: usize,
    /// Stream-ending chunks below this word count are dropped.
    pub min_words_to_keep_last: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_words: 500,
            overlap_words: 50,
            min_words_to_keep_last: 50,
        }
    }
}

/// Semantic chunker parameters.
#[derive(Debug, Clone, Copy)]
pub struct SemanticConfig {
    pub chunk_words: usize,
    pub min_words_to_keep_last: usize,
    /// Boundary sentences at least this similar are carried into the next
    /// chunk as a one-sentence overlap.
    pub similarity_threshold: f32,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            chunk_words: 500,
            min_words_to_keep_last: 50,
            similarity_threshold: 0.75,
        }
    }
}

/// A grounded answer with its supporting source files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<String>,
}
