use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::RagError;
use crate::config::Config;
use crate::corpus::load_corpus;
use crate::embeddings::OllamaClient;
use crate::engine::KnowledgeBase;
use crate::server;

/// Overrides applied on top of the loaded configuration
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
}

impl Overrides {
    #[inline]
    pub fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(data_dir) = self.data_dir {
            config.corpus.data_dir = data_dir;
        }
    }
}

/// Load configuration from `config_dir` and apply command-line overrides
#[inline]
pub fn load_config(config_dir: &Path, overrides: Overrides) -> Result<Config> {
    let mut config = Config::load(config_dir)?;
    overrides.apply(&mut config);
    config
        .validate()
        .context("Configuration is invalid after applying command-line options")?;
    Ok(config)
}

/// Run the HTTP API until interrupted
#[inline]
pub async fn serve(config: Config) -> Result<()> {
    info!(
        "Starting kosh-rag on {}:{} with corpus at {}",
        config.server.host,
        config.server.port,
        config.data_dir().display()
    );
    server::serve(config).await
}

/// Build the knowledge base once and answer a single question
#[inline]
pub async fn ask_once(config: Config, question: String, json: bool) -> Result<()> {
    // Reject before any embedding work
    if question.trim().is_empty() {
        return Err(RagError::EmptyQuestion.into());
    }

    let answer = tokio::task::spawn_blocking(move || {
        let knowledge_base = KnowledgeBase::from_config(&config)?;
        knowledge_base.ask(&question)
    })
    .await
    .context("Question task failed")??;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&answer).context("Failed to serialize answer")?
        );
        return Ok(());
    }

    println!("{}", answer.answer);
    println!();
    println!("📚 Sources (confidence {:.2}):", answer.confidence);
    for source in &answer.sources {
        println!(
            "   • [{}] {} (ID: {})",
            source.kind, source.title, source.id
        );
    }

    Ok(())
}

/// Report corpus, model and connectivity status without embedding anything
#[inline]
pub fn show_status(config: &Config) -> Result<()> {
    println!("📊 kosh-rag Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("📁 Corpus ({}):", config.data_dir().display());
    let (corpus, report) = load_corpus(
        config.data_dir(),
        &config.corpus.sources,
        config.retrieval.max_chunk_chars,
    );
    for name in &report.loaded {
        let chunks = report.chunks_per_source.get(name).copied().unwrap_or(0);
        println!("   ✅ {}: {} chunks", name, chunks);
    }
    for name in &report.missing {
        println!("   ⚠️  {}: missing", name);
    }
    for (name, reason) in &report.failed {
        println!("   ❌ {}: {}", name, reason);
    }
    println!("   📦 Total chunks: {}", corpus.len());

    println!();
    println!("🤖 Ollama Status:");
    match OllamaClient::new(&config.embedding) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!(
                    "   ✅ Ollama: Connected ({}:{})",
                    config.embedding.host, config.embedding.port
                );
            }
            Err(e) => {
                println!("   ⚠️  Ollama: Unavailable - {:#}", e);
            }
        },
        Err(e) => {
            println!("   ❌ Ollama: Invalid configuration - {:#}", e);
        }
    }
    println!(
        "   📋 Model: {} ({} dimensions)",
        config.embedding.model, config.embedding.embedding_dimension
    );

    println!();
    println!("💬 Completion Service:");
    println!("   🌐 Endpoint: {}", config.completion.endpoint);
    println!("   📋 Model: {}", config.completion.model);
    match config.completion.api_key() {
        Ok(_) => println!("   ✅ API key: set (${})", config.completion.api_key_env),
        Err(e) => println!("   ❌ API key: {}", e),
    }

    println!();
    println!("🔍 Retrieval:");
    println!("   Top K: {}", config.retrieval.top_k);
    println!("   Max chunk chars: {}", config.retrieval.max_chunk_chars);
    println!("   Max continuations: {}", config.retrieval.max_continuations);

    Ok(())
}
