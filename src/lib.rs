use thiserror::Error;

use crate::completion::CompletionError;
use crate::retrieval::IndexError;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Question cannot be empty")]
    EmptyQuestion,

    #[error("Knowledge base is not ready yet")]
    IndexNotReady,

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<config::ConfigError> for RagError {
    #[inline]
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub mod commands;
pub mod completion;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod engine;
pub mod retrieval;
pub mod server;
pub mod synthesis;

#[cfg(test)]
pub(crate) mod test_support;
