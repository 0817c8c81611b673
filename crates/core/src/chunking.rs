use crate::error::IngestError;
use crate::models::{ChunkingConfig, Page, WindowChunk};
use regex::Regex;

impl ChunkingConfig {
    /// Rejects window settings that would loop forever or degenerate into a
    /// step of one. Both were silently accepted upstream of this rewrite.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.chunk_words == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk_words must be positive".to_string(),
            ));
        }
        if self.overlap_words == 0 || self.overlap_words >= self.chunk_words {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap_words must satisfy 0 < overlap < chunk_words, got overlap={} chunk={}",
                self.overlap_words, self.chunk_words
            )));
        }
        Ok(())
    }

    pub fn step(&self) -> usize {
        self.chunk_words.saturating_sub(self.overlap_words).max(1)
    }
}

/// Cleans one page of extracted text before tokenization: rejoins words
/// hyphenated across line breaks, then collapses all whitespace runs to a
/// single space.
pub fn normalize_page_text(text: &str) -> Result<String, IngestError> {
    if text.trim().is_empty() {
        return Ok(String::new());
    }
    // "trans-\nmission" -> "transmission"
    let rejoined = Regex::new(r"-\s*\n\s*")?.replace_all(text, "");
    Ok(rejoined.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// A document flattened to a single token sequence, each token tagged with
/// the page it came from. The two vectors always have equal length.
#[derive(Debug, Clone, Default)]
pub struct WordStream {
    pub words: Vec<String>,
    pub pages: Vec<u32>,
}

impl WordStream {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Flattens pages into a word stream in ascending page order. Pages that
/// normalize to nothing contribute no tokens.
pub fn build_word_stream(pages: &[Page]) -> Result<WordStream, IngestError> {
    let mut ordered: Vec<&Page> = pages.iter().collect();
    ordered.sort_by_key(|page| page.page_number);

    let mut stream = WordStream::default();
    for page in ordered {
        let normalized = normalize_page_text(&page.content)?;
        if normalized.is_empty() {
            continue;
        }
        for token in normalized.split_whitespace() {
            stream.words.push(token.to_string());
            stream.pages.push(page.page_number);
        }
    }
    Ok(stream)
}

/// Document identity carried onto every emitted chunk.
#[derive(Debug, Clone)]
pub struct DocumentMeta {
    pub doc_id: String,
    pub source_file: String,
    /// File stem used to mint chunk ids, `"{base}-{index:04}"`.
    pub base: String,
}

/// Slides a fixed window over the word stream. Windows advance by
/// `chunk_words - overlap_words`; the stream-ending window is dropped when
/// it falls below `min_words_to_keep_last`.
pub fn make_window_chunks(
    stream: &WordStream,
    document: &DocumentMeta,
    config: &ChunkingConfig,
) -> Result<Vec<WindowChunk>, IngestError> {
    config.validate()?;
    debug_assert_eq!(stream.words.len(), stream.pages.len());

    let mut chunks = Vec::new();
    let total = stream.len();
    if total == 0 {
        return Ok(chunks);
    }

    let step = config.step();
    let mut start = 0;
    let mut index = 0;

    while start < total {
        let end = (start + config.chunk_words).min(total);
        let window = &stream.words[start..end];
        if end == total && window.len() < config.min_words_to_keep_last {
            break;
        }

        let mut pages: Vec<u32> = stream.pages[start..end].to_vec();
        pages.sort_unstable();
        pages.dedup();
        let page_range = match (pages.first(), pages.last()) {
            (Some(first), Some(last)) => Some((*first, *last)),
            _ => None,
        };

        chunks.push(WindowChunk {
            chunk_index: index,
            content: window.join(" "),
            n_words: window.len(),
            pages,
            page_range,
            doc_id: document.doc_id.clone(),
            source_file: document.source_file.clone(),
            chunk_id: format!("{}-{:04}", document.base, index),
        });

        index += 1;
        start += step;
    }

    Ok(chunks)
}
