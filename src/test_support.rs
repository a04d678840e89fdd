// Test doubles shared by unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::completion::{
    Choice, ChoiceMessage, CompletionClient, CompletionError, CompletionResponse, Message,
};
use crate::embeddings::EmbeddingProvider;

/// Embedder with a fixed vector per known text; unknown texts embed to zeros
pub struct FakeEmbedder {
    dimension: usize,
    vectors: HashMap<String, Vec<f32>>,
    fail: bool,
}

impl FakeEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: HashMap::new(),
            fail: false,
        }
    }

    pub fn failing(dimension: usize) -> Self {
        Self {
            fail: true,
            ..Self::new(dimension)
        }
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

impl EmbeddingProvider for FakeEmbedder {
    fn model_id(&self) -> &str {
        "fake-embedder"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if self.fail {
            anyhow::bail!("embedding backend unavailable");
        }
        Ok(texts
            .iter()
            .map(|text| {
                self.vectors
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| vec![0.0; self.dimension])
            })
            .collect())
    }
}

/// Completion client that replays a fixed script and records every request
pub struct ScriptedCompletion {
    script: Mutex<VecDeque<Result<CompletionResponse, CompletionError>>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedCompletion {
    pub fn new(script: Vec<Result<CompletionResponse, CompletionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl CompletionClient for ScriptedCompletion {
    fn model_id(&self) -> &str {
        "scripted-model"
    }

    fn complete(&self, messages: &[Message]) -> Result<CompletionResponse, CompletionError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(messages.to_vec());
        self.script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::Transport("script exhausted".to_string())))
    }
}

/// A response with a single choice
pub fn reply(content: &str, finish_reason: &str) -> Result<CompletionResponse, CompletionError> {
    Ok(CompletionResponse {
        choices: vec![Choice {
            message: Some(ChoiceMessage {
                content: Some(content.to_string()),
            }),
            finish_reason: Some(finish_reason.to_string()),
        }],
    })
}

/// A well-formed response with no choices
pub fn no_choices() -> Result<CompletionResponse, CompletionError> {
    Ok(CompletionResponse::default())
}
