// Engine module
// Owns the built index and answers questions; tracks initialization state for callers


use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::completion::{CompletionClient, SarvamClient};
use crate::config::{Config, RetrievalConfig};
use crate::corpus::{Corpus, LoadReport, load_corpus};
use crate::embeddings::{EmbeddingProvider, OllamaClient};
use crate::retrieval::{RetrievedChunk, Retriever, VectorIndex};
use crate::synthesis::{Answer, AnswerSynthesizer};
use crate::{RagError, Result};

/// A fully built question-answering pipeline
pub struct KnowledgeBase {
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    load_report: LoadReport,
    indexed_at: DateTime<Utc>,
}

impl KnowledgeBase {
    /// Embed every chunk of `corpus` and build the index over the vectors
    #[inline]
    pub fn build(
        settings: &RetrievalConfig,
        corpus: Corpus,
        load_report: LoadReport,
        embedder: Arc<dyn EmbeddingProvider>,
        completion: Arc<dyn CompletionClient>,
    ) -> Result<Self> {
        let dimension = embedder.dimension();
        info!(
            "Embedding {} chunks with {} ({} dimensions)",
            corpus.len(),
            embedder.model_id(),
            dimension
        );

        let bar = if console::user_attended_stderr() {
            ProgressBar::new(corpus.len() as u64).with_style(
                ProgressStyle::with_template("{bar:40} [{pos}/{len}] Embedding chunks")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            )
        } else {
            ProgressBar::hidden()
        };

        let texts = corpus.texts();
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(embedder.batch_size().max(1)) {
            let embedded = embedder.encode(batch).map_err(|e| {
                RagError::Embedding(format!("Failed to embed corpus chunks: {:#}", e))
            })?;
            if embedded.len() != batch.len() {
                return Err(RagError::Embedding(format!(
                    "Embedding provider returned {} vectors for {} chunks",
                    embedded.len(),
                    batch.len()
                )));
            }
            vectors.extend(embedded);
            bar.inc(batch.len() as u64);
        }
        bar.finish_and_clear();

        let index = VectorIndex::build(dimension, vectors)?;
        let retriever = Retriever::new(corpus, index, embedder, settings.top_k)?;
        let synthesizer = AnswerSynthesizer::new(completion, settings.max_continuations);

        info!("Index built with {} chunks", retriever.corpus().len());

        Ok(Self {
            retriever,
            synthesizer,
            load_report,
            indexed_at: Utc::now(),
        })
    }

    /// Wire the configured clients, load the corpus and build.
    ///
    /// The completion API key is checked before any embedding work starts.
    #[inline]
    pub fn from_config(config: &Config) -> Result<Self> {
        let completion = SarvamClient::from_config(&config.completion)?;

        let embedder = OllamaClient::new(&config.embedding)
            .context("Failed to create Ollama client")?;
        embedder
            .health_check()
            .map_err(|e| RagError::Embedding(format!("{:#}", e)))?;

        let (corpus, report) = load_corpus(
            config.data_dir(),
            &config.corpus.sources,
            config.retrieval.max_chunk_chars,
        );

        Self::build(
            &config.retrieval,
            corpus,
            report,
            Arc::new(embedder),
            Arc::new(completion),
        )
    }

    /// Answer one question
    #[inline]
    pub fn ask(&self, question: &str) -> Result<Answer> {
        let context = self.retrieve(question)?;
        self.synthesizer.synthesize(question, &context)
    }

    /// Context chunks for `question`; blank questions are rejected
    #[inline]
    pub fn retrieve(&self, question: &str) -> Result<Vec<RetrievedChunk>> {
        if question.trim().is_empty() {
            return Err(RagError::EmptyQuestion);
        }
        self.retriever.retrieve(question)
    }

    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.retriever.corpus().len()
    }

    #[inline]
    pub fn embedding_model(&self) -> &str {
        self.retriever.embedding_model()
    }

    #[inline]
    pub fn completion_model(&self) -> &str {
        self.synthesizer.completion_model()
    }

    #[inline]
    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    #[inline]
    pub fn indexed_at(&self) -> DateTime<Utc> {
        self.indexed_at
    }
}

pub enum EngineState {
    Initializing,
    Ready(Arc<KnowledgeBase>),
    Failed(String),
}

/// What `/health` and `status` report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub ready: bool,
    pub chunks: usize,
    pub model: String,
    pub completion_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Shared slot holding the knowledge base once it has been built
#[derive(Clone)]
pub struct EngineHandle {
    state: Arc<RwLock<EngineState>>,
    embedding_model: String,
    completion_model: String,
}

impl EngineHandle {
    /// A handle in the initializing state, reporting the configured model names
    #[inline]
    pub fn new(embedding_model: impl Into<String>, completion_model: impl Into<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(EngineState::Initializing)),
            embedding_model: embedding_model.into(),
            completion_model: completion_model.into(),
        }
    }

    #[inline]
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.embedding.model, &config.completion.model)
    }

    #[inline]
    pub async fn set_ready(&self, knowledge_base: KnowledgeBase) {
        *self.state.write().await = EngineState::Ready(Arc::new(knowledge_base));
    }

    #[inline]
    pub async fn set_failed(&self, reason: impl Into<String>) {
        *self.state.write().await = EngineState::Failed(reason.into());
    }

    #[inline]
    pub async fn is_ready(&self) -> bool {
        let state = self.state.read().await;
        matches!(*state, EngineState::Ready(_))
    }

    /// The knowledge base, or `IndexNotReady` while building or after a failed build
    #[inline]
    pub async fn get(&self) -> Result<Arc<KnowledgeBase>> {
        let state = self.state.read().await;
        match &*state {
            EngineState::Ready(kb) => Ok(Arc::clone(kb)),
            EngineState::Initializing | EngineState::Failed(_) => Err(RagError::IndexNotReady),
        }
    }

    /// Run `build` on a blocking thread and store its outcome
    #[inline]
    pub async fn initialize_with<F>(&self, build: F) -> Result<()>
    where
        F: FnOnce() -> Result<KnowledgeBase> + Send + 'static,
    {
        let built = tokio::task::spawn_blocking(build)
            .await
            .map_err(|e| RagError::Internal(format!("Index build task failed: {}", e)))?;

        match built {
            Ok(knowledge_base) => {
                info!(
                    "Knowledge base ready with {} chunks",
                    knowledge_base.chunk_count()
                );
                self.set_ready(knowledge_base).await;
                Ok(())
            }
            Err(e) => {
                error!("Failed to build knowledge base: {}", e);
                self.set_failed(e.to_string()).await;
                Err(e)
            }
        }
    }

    #[inline]
    pub async fn health(&self) -> HealthStatus {
        let mut health = HealthStatus {
            status: "initializing",
            ready: false,
            chunks: 0,
            model: self.embedding_model.clone(),
            completion_model: self.completion_model.clone(),
            indexed_at: None,
            error: None,
        };

        let state = self.state.read().await;
        match &*state {
            EngineState::Initializing => {}
            EngineState::Ready(kb) => {
                health.status = "healthy";
                health.ready = true;
                health.chunks = kb.chunk_count();
                health.model = kb.embedding_model().to_string();
                health.completion_model = kb.completion_model().to_string();
                health.indexed_at = Some(kb.indexed_at());
            }
            EngineState::Failed(reason) => {
                health.status = "failed";
                health.error = Some(reason.clone());
            }
        }

        health
    }
}
