// Shared mock servers and fixtures for the integration tests
#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use kosh_rag::config::{CompletionConfig, EmbeddingConfig};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const TEST_DIMENSION: usize = 64;
pub const TEST_MODEL: &str = "all-minilm";

/// Unit-length bag-of-words vector; texts sharing words land close together
pub fn bag_of_words(text: &str, dimension: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dimension];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let hash = word
            .to_lowercase()
            .bytes()
            .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
        vector[hash % dimension] += 1.0;
    }
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

/// Answers `/api/embed` with one bag-of-words vector per input
pub struct EmbedResponder {
    pub dimension: usize,
}

impl Respond for EmbedResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).expect("embed request is JSON");
        let embeddings: Vec<Vec<f32>> = body["input"]
            .as_array()
            .expect("input is an array")
            .iter()
            .map(|text| bag_of_words(text.as_str().unwrap_or_default(), self.dimension))
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({
            "model": body["model"],
            "embeddings": embeddings,
        }))
    }
}

/// Mount `/api/tags` and `/api/embed` on `server`
pub async fn mount_ollama(server: &MockServer, dimension: usize) {
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{ "name": format!("{}:latest", TEST_MODEL), "size": 45_000_000 }]
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(EmbedResponder { dimension })
        .mount(server)
        .await;
}

pub fn embedding_config(server: &MockServer) -> EmbeddingConfig {
    EmbeddingConfig {
        protocol: "http".to_string(),
        host: server.address().ip().to_string(),
        port: server.address().port(),
        model: TEST_MODEL.to_string(),
        batch_size: 2,
        embedding_dimension: TEST_DIMENSION as u32,
    }
}

pub fn completion_config(server: &MockServer, api_key_env: &str) -> CompletionConfig {
    CompletionConfig {
        endpoint: format!("{}/v1/chat/completions", server.uri()),
        api_key_env: api_key_env.to_string(),
        timeout_seconds: 5,
        ..CompletionConfig::default()
    }
}

pub fn completion_body(content: &str, finish_reason: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "sarvam-m",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": finish_reason
        }]
    })
}

/// Replays canned chat-completion bodies in order, repeating the last one
pub struct ScriptedCompletion {
    bodies: Vec<Value>,
    calls: AtomicUsize,
}

impl ScriptedCompletion {
    pub fn new(bodies: Vec<Value>) -> Self {
        Self {
            bodies,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Respond for ScriptedCompletion {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let body = self
            .bodies
            .get(call)
            .or_else(|| self.bodies.last())
            .cloned()
            .unwrap_or_else(|| json!({ "choices": [] }));
        ResponseTemplate::new(200).set_body_json(body)
    }
}

/// Parsed JSON bodies of every request `server` received on `endpoint`
pub async fn request_bodies(server: &MockServer, endpoint: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == endpoint)
        .map(|request| serde_json::from_slice(&request.body).expect("request body is JSON"))
        .collect()
}

/// A small corpus: datasets and models present, the other default sources missing
pub fn write_corpus(dir: &Path) {
    std::fs::write(
        dir.join("datasets.json"),
        json!([
            {
                "id": "ds-rain",
                "title": "District Rainfall Statistics",
                "description": "Monthly rainfall measurements for every district",
                "tags": ["climate", "rainfall"]
            },
            {
                "id": "ds-soil",
                "title": "Soil Health Cards",
                "about_dataset": "Soil nutrient readings from farm samples",
                "tags": ["agriculture", "soil"]
            }
        ])
        .to_string(),
    )
    .expect("write datasets.json");

    std::fs::write(
        dir.join("models.json"),
        json!({
            "id": "m-crop",
            "title": "Crop Yield Predictor",
            "about_model": "Predicts crop yield from rainfall and soil readings",
            "key_capabilities": ["regression", "forecasting"]
        })
        .to_string(),
    )
    .expect("write models.json");
}
