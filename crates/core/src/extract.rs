use crate::error::IngestError;
use crate::models::Page;
use base64::{engine::general_purpose::STANDARD, Engine};
use lopdf::Document;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Remote OCR endpoint for PDFs without a text layer. Passed explicitly;
/// extraction runs text-layer-only when absent.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

pub trait PdfExtractor {
    fn extract_pages(&self, path: &Path, doc_id: &str) -> Result<Vec<Page>, IngestError>;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path, doc_id: &str) -> Result<Vec<Page>, IngestError> {
        let document =
            Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;

        let mut pages = Vec::new();
        for (page_number, _page_id) in document.get_pages() {
            let text = document
                .extract_text(&[page_number])
                .map_err(|error| IngestError::PdfParse(error.to_string()))?;

            if !text.trim().is_empty() {
                pages.push(Page {
                    doc_id: doc_id.to_string(),
                    page_number,
                    content: text.trim().to_string(),
                });
            }
        }

        if pages.is_empty() {
            return Err(IngestError::PdfParse(format!(
                "pdf had no readable page text: {}",
                path.display()
            )));
        }

        Ok(pages)
    }
}

#[derive(Debug, Serialize)]
struct OcrRequest {
    pdf_base64: String,
    source_path: String,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    pages: Vec<OcrPage>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OcrPage {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    text: Option<String>,
}

/// Extracts a PDF via the text layer, falling back to the OCR endpoint when
/// the document parses but carries no readable text.
pub fn extract_pdf_pages(
    path: &Path,
    doc_id: &str,
    ocr: Option<&OcrConfig>,
) -> Result<Vec<Page>, IngestError> {
    match LopdfExtractor.extract_pages(path, doc_id) {
        Ok(pages) => Ok(pages),
        Err(IngestError::PdfParse(parse_error)) => {
            let Some(config) = ocr else {
                return Err(IngestError::PdfParse(parse_error));
            };
            ocr_pdf_pages(path, doc_id, config).map_err(|ocr_error| {
                IngestError::PdfParse(format!(
                    "{parse_error}; ocr fallback failed: {ocr_error}"
                ))
            })
        }
        Err(error) => Err(error),
    }
}

fn ocr_pdf_pages(path: &Path, doc_id: &str, config: &OcrConfig) -> Result<Vec<Page>, IngestError> {
    tokio::task::block_in_place(|| ocr_pdf_pages_blocking(path, doc_id, config))
}

fn ocr_pdf_pages_blocking(
    path: &Path,
    doc_id: &str,
    config: &OcrConfig,
) -> Result<Vec<Page>, IngestError> {
    let pdf = fs::read(path)?;
    let payload = OcrRequest {
        pdf_base64: STANDARD.encode(pdf),
        source_path: path.to_string_lossy().to_string(),
    };

    let mut request = Client::new()
        .post(&config.endpoint)
        .header("content-type", "application/json")
        .json(&payload);
    if let Some(api_key) = &config.api_key {
        request = request.bearer_auth(api_key);
    }

    let response = request.send()?;
    if !response.status().is_success() {
        return Err(IngestError::OcrFailed(format!(
            "ocr request to {} returned {}",
            config.endpoint,
            response.status()
        )));
    }

    let body: OcrResponse = response.json()?;
    let pages = ocr_response_pages(body, doc_id);
    if pages.is_empty() {
        return Err(IngestError::OcrFailed(format!(
            "ocr response had no readable text: {}",
            path.display()
        )));
    }
    Ok(pages)
}

/// Per-page results win; a flat `text` field is split on form feeds,
/// numbering the pieces from 1.
fn ocr_response_pages(body: OcrResponse, doc_id: &str) -> Vec<Page> {
    let listed: Vec<Page> = body
        .pages
        .into_iter()
        .filter_map(|entry| {
            let text = entry.text?.trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(Page {
                doc_id: doc_id.to_string(),
                page_number: entry.page.unwrap_or(1),
                content: text,
            })
        })
        .collect();
    if !listed.is_empty() {
        return listed;
    }

    body.text
        .unwrap_or_default()
        .split('\u{000c}')
        .enumerate()
        .filter_map(|(index, piece)| {
            let piece = piece.trim();
            if piece.is_empty() {
                return None;
            }
            Some(Page {
                doc_id: doc_id.to_string(),
                page_number: (index + 1) as u32,
                content: piece.to_string(),
            })
        })
        .collect()
}

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(folder).into_iter().filter_map(|item| item.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort_unstable();
    files
}

pub struct ExtractedPdf {
    pub source: PathBuf,
    pub output: PathBuf,
    pub page_count: usize,
}

pub struct SkippedPdf {
    pub path: PathBuf,
    pub reason: String,
}

pub struct ExtractionReport {
    pub documents: Vec<ExtractedPdf>,
    pub skipped: Vec<SkippedPdf>,
}

/// Extracts every PDF under `folder` and writes one `{base}.json` page array
/// per document into `output`. Unreadable PDFs are reported, not fatal.
pub fn extract_folder(
    folder: &Path,
    output: &Path,
    ocr: Option<&OcrConfig>,
) -> Result<ExtractionReport, IngestError> {
    let files = discover_pdf_files(folder);
    if files.is_empty() {
        return Err(IngestError::InvalidArgument(format!(
            "no pdf files found in {}",
            folder.display()
        )));
    }

    fs::create_dir_all(output)?;

    let mut documents = Vec::new();
    let mut skipped = Vec::new();

    for path in files {
        let result = (|| {
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?;
            let base = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?;

            let pages = extract_pdf_pages(&path, name, ocr)?;
            let out_path = output.join(format!("{base}.json"));
            fs::write(&out_path, serde_json::to_string_pretty(&pages)?)?;
            Ok::<_, IngestError>(ExtractedPdf {
                source: path.clone(),
                output: out_path,
                page_count: pages.len(),
            })
        })();

        match result {
            Ok(document) => documents.push(document),
            Err(error) => skipped.push(SkippedPdf {
                path,
                reason: error.to_string(),
            }),
        }
    }

    Ok(ExtractionReport { documents, skipped })
}
