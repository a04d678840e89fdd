// Configuration management module
// TOML settings for the embedding, completion, retrieval, corpus and server layers

pub mod interactive;
pub mod settings;


pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    CompletionConfig, Config, ConfigError, CorpusConfig, EmbeddingConfig, RetrievalConfig,
    ServerConfig,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
