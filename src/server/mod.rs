// HTTP API
// Thin axum layer over the engine handle

pub mod errors;


use std::convert::Infallible;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::RagError;
use crate::config::Config;
use crate::engine::{EngineHandle, HealthStatus, KnowledgeBase};
use crate::synthesis::Answer;

pub use errors::{ApiError, ErrorBody};

pub struct AppState {
    pub engine: EngineHandle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[inline]
pub fn build_router(engine: EngineHandle) -> Router {
    let shared = Arc::new(AppState { engine });

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ask", post(ask))
        .route("/ask/stream", post(ask_stream))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "GET /health",
            "ask": "POST /ask",
            "ask_stream": "POST /ask/stream",
        }
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(state.engine.health().await)
}

async fn ask(
    State(state): State<Arc<AppState>>,
    request: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<Answer>, ApiError> {
    Ok(Json(answer_question(&state, request).await?))
}

/// Same as `/ask`, but the answer is sent as server-sent events: one `data`
/// event per word, then a `metadata` event carrying sources and confidence.
/// Errors raised before the first event use the regular JSON error body.
async fn ask_stream(
    State(state): State<Arc<AppState>>,
    request: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let answer = answer_question(&state, request).await?;
    let events = answer_events(&answer);

    Ok(Sse::new(stream::iter(events.into_iter().map(Ok))).keep_alive(KeepAlive::default()))
}

async fn answer_question(
    state: &AppState,
    request: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Answer, ApiError> {
    let Json(request) = request?;
    let knowledge_base = state.engine.get().await?;

    let answer = tokio::task::spawn_blocking(move || knowledge_base.ask(&request.question))
        .await
        .map_err(|e| RagError::Internal(format!("Question task failed: {}", e)))??;

    Ok(answer)
}

/// Words after the first carry their leading space so clients can concatenate
fn answer_events(answer: &Answer) -> Vec<Event> {
    let mut events: Vec<Event> = answer
        .answer
        .split_whitespace()
        .enumerate()
        .map(|(index, word)| {
            if index == 0 {
                Event::default().data(word)
            } else {
                Event::default().data(format!(" {}", word))
            }
        })
        .collect();

    let metadata = serde_json::json!({
        "sources": answer.sources,
        "confidence": answer.confidence,
    });
    events.push(Event::default().event("metadata").data(metadata.to_string()));
    events
}

/// Bind the listener, build the knowledge base in the background, and serve until ctrl-c.
///
/// `/health` answers as soon as the listener is bound; `/ask` returns
/// `index_not_ready` until the build finishes.
#[inline]
pub async fn serve(config: Config) -> anyhow::Result<()> {
    config.validate().context("Invalid configuration")?;
    // Fail before binding rather than after the index is built
    config
        .completion
        .api_key()
        .context("Completion API key is required to serve")?;

    let engine = EngineHandle::from_config(&config);
    let app = build_router(engine.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on http://{}", addr);

    tokio::spawn(async move {
        let result = engine
            .initialize_with(move || KnowledgeBase::from_config(&config))
            .await;
        if let Err(e) = result {
            error!("Knowledge base unavailable, /ask will keep returning 503: {}", e);
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
