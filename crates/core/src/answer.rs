use crate::embeddings::Embedder;
use crate::error::QueryError;
use crate::index::{RetrievedChunk, VectorIndex};
use crate::models::Answer;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

const SMALL_TALK: [(&str, &str); 8] = [
    ("hi", "Hello! How can I help you today?"),
    ("hello", "Hi there!"),
    ("hey", "Hey! How's it going?"),
    ("thanks", "You're welcome!"),
    ("bye", "Goodbye! Have a great day!"),
    ("good morning", "Good morning!"),
    ("good night", "Good night!"),
    ("how are you", "I'm doing great, thanks for asking! How about you?"),
];

/// Canned reply for greetings and pleasantries, keyed on the lowercased,
/// trimmed query. Anything else goes through retrieval.
pub fn small_talk_reply(query: &str) -> Option<&'static str> {
    let normalized = query.trim().to_lowercase();
    SMALL_TALK
        .iter()
        .find(|(key, _)| *key == normalized)
        .map(|(_, reply)| *reply)
}

/// Text generation backend. The engine only needs prompt-in, text-out.
#[async_trait]
pub trait Generator {
    async fn generate(&self, prompt: &str) -> Result<String, QueryError>;
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    prompt: &'a str,
    max_new_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    generated_text: String,
}

/// Calls a remote text-generation endpoint with optional bearer auth.
pub struct HttpGenerator {
    endpoint: Url,
    api_key: Option<String>,
    max_new_tokens: u32,
    client: reqwest::Client,
}

impl HttpGenerator {
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        max_new_tokens: u32,
    ) -> Result<Self, QueryError> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
            api_key,
            max_new_tokens,
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, QueryError> {
        let mut request = self.client.post(self.endpoint.clone()).json(&GenerationRequest {
            prompt,
            max_new_tokens: self.max_new_tokens,
        });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(QueryError::BackendResponse {
                backend: "generator".to_string(),
                details: response.status().to_string(),
            });
        }

        let body: GenerationResponse = response.json().await?;
        Ok(body.generated_text.trim().to_string())
    }
}

/// Retrieval shape: fetch a wider candidate set, rerank, keep the best few
/// for the prompt.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalSettings {
    pub fetch_k: usize,
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { fetch_k: 8, top_k: 3 }
    }
}

/// Answers queries over an index: small talk short-circuit, cosine
/// retrieval, lexical rerank, then a grounded prompt to the generator.
pub struct AnswerEngine<E: Embedder, G: Generator> {
    index: VectorIndex,
    embedder: E,
    generator: G,
    settings: RetrievalSettings,
}

impl<E: Embedder, G: Generator> AnswerEngine<E, G> {
    pub fn new(index: VectorIndex, embedder: E, generator: G, settings: RetrievalSettings) -> Self {
        Self {
            index,
            embedder,
            generator,
            settings,
        }
    }

    pub async fn answer(&self, query: &str) -> Result<Answer, QueryError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(QueryError::Request("query is empty".to_string()));
        }

        if let Some(reply) = small_talk_reply(query) {
            return Ok(Answer {
                answer: reply.to_string(),
                sources: Vec::new(),
            });
        }

        let query_vector = self.embedder.embed(query);
        let mut hits = self.index.search(&query_vector, self.settings.fetch_k);
        rerank_by_term_overlap(query, &mut hits);
        hits.truncate(self.settings.top_k);

        let context = hits
            .iter()
            .map(|hit| hit.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = build_prompt(&context, query);
        let answer = self.generator.generate(&prompt).await?;

        let mut sources = Vec::new();
        for hit in &hits {
            if !sources.contains(&hit.source) {
                sources.push(hit.source.clone());
            }
        }

        Ok(Answer { answer, sources })
    }
}

fn build_prompt(context: &str, query: &str) -> String {
    format!(
        "Answer the following question using only the context below.\n\
         If the answer is not in the context, say you don't know.\n\n\
         Context:\n{context}\n\nQuestion: {query}\n\nAnswer:"
    )
}

/// Cheap stand-in for a cross-encoder rerank: fraction of query terms
/// present in the chunk, blended with the retrieval score as a tiebreaker.
fn rerank_by_term_overlap(query: &str, hits: &mut [RetrievedChunk]) {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|term| term.to_lowercase())
        .filter(|term| term.len() > 2)
        .collect();
    if terms.is_empty() {
        return;
    }

    let overlap = |text: &str| -> f32 {
        let lowered = text.to_lowercase();
        let matched = terms.iter().filter(|term| lowered.contains(*term)).count();
        matched as f32 / terms.len() as f32
    };

    hits.sort_by(|left, right| {
        let left_score = overlap(&left.text) + left.score * 0.01;
        let right_score = overlap(&right.text) + right.score * 0.01;
        right_score.total_cmp(&left_score)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashedNgramEmbedder;
    use crate::index::IndexedChunk;

    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, QueryError> {
            Ok(format!("echo: {prompt}"))
        }
    }

    fn engine_with(texts: &[(&str, &str)]) -> AnswerEngine<HashedNgramEmbedder, EchoGenerator> {
        let embedder = HashedNgramEmbedder { dimensions: 64 };
        let mut index = VectorIndex::new(64);
        for (id, text) in texts {
            index
                .insert(IndexedChunk {
                    chunk_id: (*id).to_string(),
                    source: format!("{id}.json"),
                    text: (*text).to_string(),
                    vector: embedder.embed(text),
                })
                .unwrap();
        }
        AnswerEngine::new(index, embedder, EchoGenerator, RetrievalSettings::default())
    }

    #[tokio::test]
    async fn small_talk_bypasses_retrieval() {
        let engine = engine_with(&[]);
        let answer = engine.answer("  Hello ").await.unwrap();
        assert_eq!(answer.answer, "Hi there!");
        assert!(answer.sources.is_empty());
    }

    #[tokio::test]
    async fn empty_query_is_an_error() {
        let engine = engine_with(&[]);
        assert!(matches!(
            engine.answer("   ").await,
            Err(QueryError::Request(_))
        ));
    }

    #[tokio::test]
    async fn grounded_answer_cites_matching_sources() {
        let engine = engine_with(&[
            ("pump", "The hydraulic pump operates at 200 bar working pressure."),
            ("hr", "Vacation requests must be filed two weeks in advance."),
        ]);

        let answer = engine.answer("hydraulic pump pressure").await.unwrap();
        assert!(answer.answer.contains("hydraulic pump"));
        assert!(answer.answer.contains("say you don't know"));
        assert_eq!(answer.sources[0], "pump.json");
    }

    #[test]
    fn rerank_prefers_term_coverage_over_raw_score() {
        let mut hits = vec![
            RetrievedChunk {
                chunk_id: "a".to_string(),
                source: "a.json".to_string(),
                text: "nothing relevant here".to_string(),
                score: 0.99,
            },
            RetrievedChunk {
                chunk_id: "b".to_string(),
                source: "b.json".to_string(),
                text: "valve torque specification table".to_string(),
                score: 0.10,
            },
        ];
        rerank_by_term_overlap("valve torque", &mut hits);
        assert_eq!(hits[0].chunk_id, "b");
    }

    #[test]
    fn unknown_phrases_are_not_small_talk() {
        assert!(small_talk_reply("what is the torque spec").is_none());
        assert_eq!(
            small_talk_reply("GOOD MORNING"),
            Some("Good morning!")
        );
    }
}
