// Corpus module
// Loads the named JSON resources and turns their records into chunks

pub mod chunking;


use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use chunking::{Chunk, ChunkMetadata, Record, build_chunk, build_chunks};

/// Resources loaded when the configuration does not name any
pub const DEFAULT_SOURCES: &[&str] = &[
    "articles.json",
    "dashboard.json",
    "datasets.json",
    "models.json",
    "toolkit.json",
    "tutorials.json",
    "usecases.json",
];

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Corpus source {name} not found at {}", path.display())]
    SourceMissing { name: String, path: PathBuf },

    #[error("Failed to read corpus source {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse corpus source {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// All chunks built from the corpus, in load order.
///
/// Each chunk carries its own metadata, so the text list and the metadata list
/// handed to the index are always the same length and index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    chunks: Vec<Chunk>,
}

/// What happened to each configured source during a load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub missing: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub chunks_per_source: BTreeMap<String, usize>,
}

impl Corpus {
    #[inline]
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    #[inline]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    #[inline]
    pub fn texts(&self) -> Vec<String> {
        self.chunks.iter().map(|c| c.text.clone()).collect()
    }

    #[inline]
    pub fn metadata(&self) -> Vec<ChunkMetadata> {
        self.chunks.iter().map(|c| c.metadata.clone()).collect()
    }
}

impl LoadReport {
    #[inline]
    pub fn total_chunks(&self) -> usize {
        self.chunks_per_source.values().sum()
    }
}

/// Load every named source under `data_dir`.
///
/// Missing or unreadable sources are logged and skipped; the load itself never fails.
#[inline]
pub fn load_corpus<S: AsRef<str>>(
    data_dir: &Path,
    sources: &[S],
    max_chars: usize,
) -> (Corpus, LoadReport) {
    let mut chunks = Vec::new();
    let mut report = LoadReport::default();

    for name in sources {
        let name = name.as_ref();
        match load_source(data_dir, name) {
            Ok(records) => {
                let source_chunks = build_chunks(&records, name, max_chars);
                debug!(
                    "{} records in {} produced {} chunks",
                    records.len(),
                    name,
                    source_chunks.len()
                );
                report
                    .chunks_per_source
                    .insert(name.to_string(), source_chunks.len());
                report.loaded.push(name.to_string());
                chunks.extend(source_chunks);
                info!("Loaded {}", name);
            }
            Err(e @ CorpusError::SourceMissing { .. }) => {
                warn!("{}, skipping", e);
                report.missing.push(name.to_string());
            }
            Err(e) => {
                warn!("{}, skipping", e);
                report.failed.push((name.to_string(), e.to_string()));
            }
        }
    }

    info!("Total chunks created: {}", chunks.len());
    (Corpus::new(chunks), report)
}

/// Read one source as a list of records
#[inline]
pub fn load_source(data_dir: &Path, name: &str) -> Result<Vec<Record>, CorpusError> {
    let path = data_dir.join(name);
    if !path.exists() {
        return Err(CorpusError::SourceMissing {
            name: name.to_string(),
            path,
        });
    }

    let content = fs::read_to_string(&path).map_err(|source| CorpusError::Read {
        name: name.to_string(),
        source,
    })?;

    let value: Value = serde_json::from_str(&content).map_err(|source| CorpusError::Parse {
        name: name.to_string(),
        source,
    })?;

    Ok(records_from_value(value, name))
}

/// A top-level array yields one record per object; a top-level object is one record
fn records_from_value(value: Value, name: &str) -> Vec<Record> {
    match value {
        Value::Object(record) => vec![record],
        Value::Array(items) => {
            let total = items.len();
            let records: Vec<Record> = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(record) => Some(record),
                    _ => None,
                })
                .collect();
            if records.len() < total {
                debug!(
                    "Skipped {} non-object entries in {}",
                    total - records.len(),
                    name
                );
            }
            records
        }
        other => {
            warn!(
                "{} holds a JSON {} instead of records, ignoring it",
                name,
                json_kind(&other)
            );
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
