mod http;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use doc_qa_core::{
    build_index_from_chunks, chunk_folder_semantic, chunk_folder_windows, extract_folder,
    AnswerEngine, ChunkingConfig, ChunkingReport, EmbeddingSimilarity, HashedNgramEmbedder,
    HttpGenerator, OcrConfig, RetrievalSettings, SemanticConfig, VectorIndex,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "doc-qa", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct WindowArgs {
    /// Target words per chunk.
    #[arg(long, default_value = "500")]
    chunk_words: usize,

    /// Words shared between consecutive chunks.
    #[arg(long, default_value = "50")]
    overlap_words: usize,

    /// Drop a stream-ending chunk smaller than this.
    #[arg(long, default_value = "50")]
    min_words_to_keep_last: usize,
}

#[derive(Args)]
struct GeneratorArgs {
    /// Text-generation endpoint (POST {prompt, max_new_tokens}).
    #[arg(long, env = "DOC_QA_GENERATOR_ENDPOINT")]
    generator_endpoint: String,

    /// Bearer token for the generation endpoint.
    #[arg(long, env = "DOC_QA_GENERATOR_API_KEY")]
    generator_api_key: Option<String>,

    #[arg(long, default_value = "300")]
    max_new_tokens: u32,
}

#[derive(Subcommand)]
enum Command {
    /// Extract page text from a PDF folder into per-document JSON files.
    Extract {
        /// Folder that contains PDFs recursively.
        #[arg(long)]
        folder: PathBuf,
        /// Output folder for `{base}.json` page arrays.
        #[arg(long)]
        output: PathBuf,
        /// Remote OCR endpoint for PDFs without a text layer.
        #[arg(long, env = "DOC_QA_OCR_ENDPOINT")]
        ocr_endpoint: Option<String>,
        /// Bearer token for the OCR endpoint.
        #[arg(long, env = "DOC_QA_OCR_API_KEY")]
        ocr_api_key: Option<String>,
    },
    /// Slice page JSONs into overlapping fixed-size chunks with page provenance.
    Chunk {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Chunk on sentence boundaries with similarity-gated overlap.
    ChunkSemantic {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value = "500")]
        chunk_words: usize,
        #[arg(long, default_value = "50")]
        min_words_to_keep_last: usize,
        /// Boundary sentences at least this similar carry over one sentence.
        #[arg(long, default_value = "0.75")]
        similarity_threshold: f32,
    },
    /// Embed chunk files into a vector index.
    Index {
        /// Folder of chunk JSON files (window or semantic output).
        #[arg(long)]
        chunks: PathBuf,
        /// Where to write the serialized index.
        #[arg(long)]
        index: PathBuf,
    },
    /// Answer one query against a saved index.
    Query {
        #[arg(long)]
        index: PathBuf,
        #[arg(long)]
        query: String,
        /// Chunks to keep for the prompt after reranking.
        #[arg(long, default_value = "3")]
        top_k: usize,
        #[command(flatten)]
        generator: GeneratorArgs,
    },
    /// Serve POST /query over a saved index.
    Serve {
        #[arg(long)]
        index: PathBuf,
        #[arg(long, default_value = "5000")]
        port: u16,
        #[command(flatten)]
        generator: GeneratorArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Extract {
            folder,
            output,
            ocr_endpoint,
            ocr_api_key,
        } => {
            let ocr = ocr_endpoint.map(|endpoint| OcrConfig {
                endpoint,
                api_key: ocr_api_key,
            });
            let report = extract_folder(&folder, &output, ocr.as_ref())
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            for skipped in &report.skipped {
                warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped pdf");
            }
            for document in &report.documents {
                info!(
                    source = %document.source.display(),
                    pages = document.page_count,
                    "extracted"
                );
            }
            println!(
                "{} documents extracted, {} skipped, at {}",
                report.documents.len(),
                report.skipped.len(),
                Utc::now().to_rfc3339()
            );
        }
        Command::Chunk {
            input,
            output,
            window,
        } => {
            let config = ChunkingConfig {
                chunk_words: window.chunk_words,
                overlap_words: window.overlap_words,
                min_words_to_keep_last: window.min_words_to_keep_last,
            };
            let report = chunk_folder_windows(&input, &output, &config)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            print_chunking_report(&report, &output);
        }
        Command::ChunkSemantic {
            input,
            output,
            chunk_words,
            min_words_to_keep_last,
            similarity_threshold,
        } => {
            let config = SemanticConfig {
                chunk_words,
                min_words_to_keep_last,
                similarity_threshold,
            };
            let scorer = EmbeddingSimilarity::new(HashedNgramEmbedder::default());
            let report = chunk_folder_semantic(&input, &output, &config, &scorer)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            print_chunking_report(&report, &output);
        }
        Command::Index { chunks, index } => {
            let embedder = HashedNgramEmbedder::default();
            let built = build_index_from_chunks(&chunks, &embedder)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            built
                .save(&index)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            println!(
                "{} chunks indexed into {} at {}",
                built.len(),
                index.display(),
                Utc::now().to_rfc3339()
            );
        }
        Command::Query {
            index,
            query,
            top_k,
            generator,
        } => {
            let engine = load_engine(&index, &generator, top_k)?;
            let answer = engine
                .answer(&query)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!("{}", answer.answer);
            for (position, source) in answer.sources.iter().enumerate() {
                println!("Source {}: {}", position + 1, source);
            }
        }
        Command::Serve {
            index,
            port,
            generator,
        } => {
            let engine = load_engine(&index, &generator, RetrievalSettings::default().top_k)?;
            http::serve(Arc::new(engine), port).await?;
        }
    }

    Ok(())
}

fn load_engine(
    index_path: &Path,
    generator: &GeneratorArgs,
    top_k: usize,
) -> anyhow::Result<AnswerEngine<HashedNgramEmbedder, HttpGenerator>> {
    let index = VectorIndex::load(index_path)
        .map_err(|error| anyhow::anyhow!("unable to load index: {error}"))?;
    info!(chunks = index.len(), path = %index_path.display(), "index loaded");

    let backend = HttpGenerator::new(
        &generator.generator_endpoint,
        generator.generator_api_key.clone(),
        generator.max_new_tokens,
    )
    .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    let settings = RetrievalSettings {
        top_k,
        ..RetrievalSettings::default()
    };
    Ok(AnswerEngine::new(
        index,
        HashedNgramEmbedder::default(),
        backend,
        settings,
    ))
}

fn print_chunking_report(report: &ChunkingReport, output: &Path) {
    for skipped in &report.skipped {
        warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped document");
    }
    for document in &report.documents {
        info!(
            source = %document.source.display(),
            chunks = document.chunk_count,
            "chunked"
        );
    }
    println!(
        "{} documents chunked into {}, {} skipped",
        report.documents.len(),
        output.display(),
        report.skipped.len()
    );
}
