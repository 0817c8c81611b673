pub mod answer;
pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod models;
pub mod semantic;
pub mod sentences;

pub use answer::{
    small_talk_reply, AnswerEngine, Generator, HttpGenerator, RetrievalSettings,
};
pub use chunking::{
    build_word_stream, make_window_chunks, normalize_page_text, DocumentMeta, WordStream,
};
pub use embeddings::{
    cosine_similarity, Embedder, EmbeddingSimilarity, HashedNgramEmbedder,
    DEFAULT_EMBEDDING_DIMENSIONS,
};
pub use error::{IngestError, QueryError};
pub use extract::{
    discover_pdf_files, extract_folder, extract_pdf_pages, ExtractedPdf, ExtractionReport,
    LopdfExtractor, OcrConfig, PdfExtractor, SkippedPdf,
};
pub use index::{build_index_from_chunks, IndexedChunk, RetrievedChunk, VectorIndex};
pub use ingest::{
    chunk_folder_semantic, chunk_folder_windows, discover_json_files, load_chunk_folder,
    ChunkedDocument, ChunkingReport, LoadedChunk, SkippedDocument,
};
pub use models::{
    Answer, ChunkingConfig, DocumentFile, Page, SemanticChunkFile, SemanticConfig, WindowChunk,
};
pub use semantic::{semantic_chunk_text, SentenceSimilarity};
pub use sentences::split_sentences;
