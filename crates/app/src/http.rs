use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use doc_qa_core::{AnswerEngine, HashedNgramEmbedder, HttpGenerator, QueryError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

pub type SharedEngine = Arc<AnswerEngine<HashedNgramEmbedder, HttpGenerator>>;

#[derive(Debug, Deserialize)]
struct QueryRequest {
    #[serde(default)]
    query: String,
}

pub fn router(engine: SharedEngine) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/query", post(query))
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn query(
    State(engine): State<SharedEngine>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match engine.answer(&request.query).await {
        Ok(answer) => Ok(Json(json!({
            "answer": answer.answer,
            "sources": answer.sources,
        }))),
        Err(QueryError::Request(reason)) => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": reason })),
        )),
        Err(error) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": error.to_string() })),
        )),
    }
}

pub async fn serve(engine: SharedEngine, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "query server listening");
    axum::serve(listener, router(engine)).await?;
    Ok(())
}
