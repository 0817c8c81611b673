use crate::chunking::{build_word_stream, make_window_chunks, DocumentMeta};
use crate::error::IngestError;
use crate::models::{ChunkingConfig, DocumentFile, SemanticChunkFile, SemanticConfig, WindowChunk};
use crate::semantic::{semantic_chunk_text, SentenceSimilarity};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn discover_json_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(folder).into_iter().filter_map(|item| item.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let is_json = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort_unstable();
    files
}

pub struct ChunkedDocument {
    pub source: PathBuf,
    pub output: PathBuf,
    pub chunk_count: usize,
}

pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

/// Per-run outcome: documents are isolated, one bad file never aborts the
/// corpus.
pub struct ChunkingReport {
    pub documents: Vec<ChunkedDocument>,
    pub skipped: Vec<SkippedDocument>,
}

fn file_names(path: &Path) -> Result<(String, String), IngestError> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?;
    let base = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?;
    Ok((name.to_string(), base.to_string()))
}

fn load_document(path: &Path) -> Result<DocumentFile, IngestError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Runs the sliding-window chunker over every page JSON in `input`, writing
/// one pretty-printed `{base}_chunks.json` array per document.
pub fn chunk_folder_windows(
    input: &Path,
    output: &Path,
    config: &ChunkingConfig,
) -> Result<ChunkingReport, IngestError> {
    config.validate()?;
    let files = nonempty_corpus(input)?;
    fs::create_dir_all(output)?;

    let mut documents = Vec::new();
    let mut skipped = Vec::new();

    for path in files {
        let result = (|| {
            let (name, base) = file_names(&path)?;
            let pages = match load_document(&path)? {
                DocumentFile::Pages(pages) => pages,
                DocumentFile::Single(_) => {
                    return Err(IngestError::InvalidArgument(
                        "document has no page records".to_string(),
                    ));
                }
            };
            if pages.is_empty() {
                return Err(IngestError::InvalidArgument("no pages found".to_string()));
            }

            let doc_id = pages
                .iter()
                .map(|page| page.doc_id.clone())
                .find(|id| !id.is_empty())
                .unwrap_or_else(|| base.clone());
            let meta = DocumentMeta {
                doc_id,
                source_file: name,
                base: base.clone(),
            };

            let stream = build_word_stream(&pages)?;
            let chunks = make_window_chunks(&stream, &meta, config)?;

            let out_path = output.join(format!("{base}_chunks.json"));
            fs::write(&out_path, serde_json::to_string_pretty(&chunks)?)?;
            Ok::<_, IngestError>(ChunkedDocument {
                source: path.clone(),
                output: out_path,
                chunk_count: chunks.len(),
            })
        })();

        match result {
            Ok(document) => documents.push(document),
            Err(error) => skipped.push(SkippedDocument {
                path,
                reason: error.to_string(),
            }),
        }
    }

    Ok(ChunkingReport { documents, skipped })
}

/// Runs the semantic chunker over every document JSON in `input`. Both the
/// page-array and single-object shapes are accepted and flattened; output is
/// `{"file": <name>, "chunks": [...]}` under the input file's own name.
pub fn chunk_folder_semantic<S: SentenceSimilarity>(
    input: &Path,
    output: &Path,
    config: &SemanticConfig,
    scorer: &S,
) -> Result<ChunkingReport, IngestError> {
    let files = nonempty_corpus(input)?;
    fs::create_dir_all(output)?;

    let mut documents = Vec::new();
    let mut skipped = Vec::new();

    for path in files {
        let result = (|| {
            let (name, _base) = file_names(&path)?;
            let text = load_document(&path)?.into_flat_text();
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

            let chunks = semantic_chunk_text(&text, config, scorer);
            let record = SemanticChunkFile {
                file: name.clone(),
                chunks,
            };

            let out_path = output.join(&name);
            fs::write(&out_path, serde_json::to_string_pretty(&record)?)?;
            Ok::<_, IngestError>(ChunkedDocument {
                source: path.clone(),
                output: out_path,
                chunk_count: record.chunks.len(),
            })
        })();

        match result {
            Ok(document) => documents.push(document),
            Err(error) => skipped.push(SkippedDocument {
                path,
                reason: error.to_string(),
            }),
        }
    }

    Ok(ChunkingReport { documents, skipped })
}

fn nonempty_corpus(input: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let files = discover_json_files(input);
    if files.is_empty() {
        return Err(IngestError::InvalidArgument(format!(
            "no json files found in {}",
            input.display()
        )));
    }
    Ok(files)
}

/// One indexable chunk loaded back from either chunk-file shape.
#[derive(Debug, Clone)]
pub struct LoadedChunk {
    pub chunk_id: String,
    pub source: String,
    pub text: String,
}

#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum ChunkFile {
    Windowed(Vec<WindowChunk>),
    Semantic(SemanticChunkFile),
}

/// Reads a folder of chunk JSON files (window or semantic output) back into
/// flat indexable records, skipping blank chunks.
pub fn load_chunk_folder(folder: &Path) -> Result<Vec<LoadedChunk>, IngestError> {
    let mut loaded = Vec::new();
    for path in nonempty_corpus(folder)? {
        let raw = fs::read_to_string(&path)?;
        match serde_json::from_str::<ChunkFile>(&raw)? {
            ChunkFile::Windowed(chunks) => {
                for chunk in chunks {
                    if chunk.content.trim().is_empty() {
                        continue;
                    }
                    loaded.push(LoadedChunk {
                        chunk_id: chunk.chunk_id,
                        source: chunk.source_file,
                        text: chunk.content,
                    });
                }
            }
            ChunkFile::Semantic(record) => {
                let base = record.file.trim_end_matches(".json");
                for (index, chunk) in record.chunks.into_iter().enumerate() {
                    if chunk.trim().is_empty() {
                        continue;
                    }
                    loaded.push(LoadedChunk {
                        chunk_id: format!("{base}-{index:04}"),
                        source: record.file.clone(),
                        text: chunk,
                    });
                }
            }
        }
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::SentenceSimilarity;
    use serde_json::Value;
    use tempfile::tempdir;

    struct NeverSimilar;

    impl SentenceSimilarity for NeverSimilar {
        fn similarity(&self, _left: &str, _right: &str) -> f32 {
            0.0
        }
    }

    fn small_config() -> ChunkingConfig {
        ChunkingConfig {
            chunk_words: 10,
            overlap_words: 2,
            min_words_to_keep_last: 2,
        }
    }

    fn write_pages(dir: &Path, base: &str, pages: Value) {
        fs::write(dir.join(format!("{base}.json")), pages.to_string()).unwrap();
    }

    #[test]
    fn window_run_writes_decorated_chunk_files() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let out = dir.path().join("chunks");
        let content = (0..24).map(|i| format!("tok{i}")).collect::<Vec<_>>().join(" ");
        write_pages(
            dir.path(),
            "manual",
            serde_json::json!([
                {"doc_id": "manual.pdf", "page_number": 1, "content": content}
            ]),
        );

        let report = chunk_folder_windows(dir.path(), &out, &small_config())?;
        assert_eq!(report.documents.len(), 1);
        assert!(report.skipped.is_empty());

        let written = fs::read_to_string(out.join("manual_chunks.json"))?;
        let chunks: Vec<WindowChunk> = serde_json::from_str(&written)?;
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].doc_id, "manual.pdf");
        assert_eq!(chunks[0].source_file, "manual.json");
        assert_eq!(chunks[0].chunk_id, "manual-0000");
        assert_eq!(chunks[2].chunk_id, "manual-0002");
        assert_eq!(chunks[0].page_range, Some((1, 1)));
        Ok(())
    }

    #[test]
    fn malformed_document_is_skipped_not_fatal() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let out = dir.path().join("chunks");
        fs::write(dir.path().join("broken.json"), "{ not json")?;
        write_pages(
            dir.path(),
            "good",
            serde_json::json!([
                {"doc_id": "good", "page_number": 1,
                 "content": "enough words to form one small chunk here today"}
            ]),
        );

        let report = chunk_folder_windows(dir.path(), &out, &small_config())?;
        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("broken.json"));
        Ok(())
    }

    #[test]
    fn empty_corpus_is_the_only_fatal_case() {
        let dir = tempdir().unwrap();
        let result = chunk_folder_windows(dir.path(), &dir.path().join("out"), &small_config());
        assert!(matches!(result, Err(IngestError::InvalidArgument(_))));
    }

    #[test]
    fn semantic_run_accepts_single_object_documents() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let out = dir.path().join("chunks");
        let sentences: Vec<String> = (0..8)
            .map(|i| format!("Sentence number {i} has exactly six words."))
            .collect();
        fs::write(
            dir.path().join("flat.json"),
            serde_json::json!({"content": sentences.join(" ")}).to_string(),
        )?;

        let config = SemanticConfig {
            chunk_words: 14,
            min_words_to_keep_last: 2,
            similarity_threshold: 0.75,
        };
        let report = chunk_folder_semantic(dir.path(), &out, &config, &NeverSimilar)?;
        assert_eq!(report.documents.len(), 1);

        let written = fs::read_to_string(out.join("flat.json"))?;
        let record: SemanticChunkFile = serde_json::from_str(&written)?;
        assert_eq!(record.file, "flat.json");
        assert!(!record.chunks.is_empty());
        for chunk in &record.chunks {
            assert!(chunk.split_whitespace().count() >= 2);
        }
        Ok(())
    }

    #[test]
    fn chunk_loader_reads_both_output_shapes() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("a_chunks.json"),
            serde_json::json!([{
                "chunk_index": 0, "content": "window text", "n_words": 2,
                "pages": [1], "page_range": [1, 1], "doc_id": "a",
                "source_file": "a.json", "chunk_id": "a-0000"
            }])
            .to_string(),
        )?;
        fs::write(
            dir.path().join("b.json"),
            serde_json::json!({"file": "b.json", "chunks": ["semantic text", " "]}).to_string(),
        )?;

        let mut loaded = load_chunk_folder(dir.path())?;
        loaded.sort_by(|left, right| left.chunk_id.cmp(&right.chunk_id));
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].chunk_id, "a-0000");
        assert_eq!(loaded[1].chunk_id, "b-0000");
        assert_eq!(loaded[1].source, "b.json");
        Ok(())
    }
}
