
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Hard cap on chunk length, in characters
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 1200;

/// Placeholder for a missing id or title
pub const NOT_AVAILABLE: &str = "N/A";

/// Narrative fields in rendering order, with the label each one is printed under.
/// Tags are rendered last and handled separately.
pub const FIELD_LABELS: &[(&str, &str)] = &[
    ("title", "Title"),
    ("description", "Description"),
    ("about_dataset", "About"),
    ("about_model", "About"),
    ("about_use_case", "About"),
    ("content", "Content"),
    ("overview", "Overview"),
    ("key_capabilities", "Key Capabilities"),
];

const TAGS_FIELD: &str = "tags";
const TAGS_LABEL: &str = "Tags";

/// One corpus record: a JSON object with no guaranteed fields
pub type Record = Map<String, Value>;

/// Describes where a chunk came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source resource name, e.g. `datasets.json`
    pub source: String,
    pub id: String,
    pub title: String,
    /// Source name without its file extension, e.g. `datasets`
    #[serde(rename = "type")]
    pub kind: String,
}

/// Searchable text derived from a single record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Build the chunk for one record, or `None` when the record renders no text.
///
/// Present fields are printed as `Label: value` lines in [`FIELD_LABELS`] order,
/// followed by the tags line, and the result is cut at `max_chars` characters.
#[inline]
pub fn build_chunk(record: &Record, source: &str, max_chars: usize) -> Option<Chunk> {
    let mut lines: Vec<String> = FIELD_LABELS
        .iter()
        .filter_map(|(field, label)| {
            record
                .get(*field)
                .and_then(render_value)
                .map(|value| format!("{}: {}", label, value))
        })
        .collect();

    if let Some(tags) = record.get(TAGS_FIELD).and_then(|tags| render_tags(tags, source)) {
        lines.push(format!("{}: {}", TAGS_LABEL, tags));
    }

    let text = truncate_chars(&lines.join("\n"), max_chars);
    if text.trim().is_empty() {
        return None;
    }

    Some(Chunk {
        text,
        metadata: ChunkMetadata {
            source: source.to_string(),
            id: metadata_field(record, "id"),
            title: metadata_field(record, "title"),
            kind: source_kind(source),
        },
    })
}

/// Chunk every record of one source, skipping records that render empty
#[inline]
pub fn build_chunks<'a, I>(records: I, source: &str, max_chars: usize) -> Vec<Chunk>
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .filter_map(|record| build_chunk(record, source, max_chars))
        .collect()
}

/// Strip the file-format suffix from a source name
#[inline]
pub fn source_kind(source: &str) -> String {
    source
        .strip_suffix(".json")
        .unwrap_or(source)
        .to_string()
}

/// Keep at most `max_chars` characters; never splits a code point
#[inline]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text.get(..byte_index).unwrap_or(text).to_string(),
        None => text.to_string(),
    }
}

fn render_value(value: &Value) -> Option<String> {
    let rendered = match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Array(items) if items.iter().all(is_scalar) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::Null => None,
                    Value::String(s) if s.trim().is_empty() => None,
                    Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .join(", "),
        ),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    };
    rendered.filter(|text| !text.trim().is_empty())
}

fn render_tags(tags: &Value, source: &str) -> Option<String> {
    if is_blank(tags) {
        return None;
    }

    if let Value::Array(items) = tags {
        if let Some(names) = items
            .iter()
            .map(Value::as_str)
            .collect::<Option<Vec<_>>>()
        {
            let joined = names
                .into_iter()
                .filter(|name| !name.trim().is_empty())
                .join(", ");
            return (!joined.is_empty()).then_some(joined);
        }
    }

    warn!(
        "Tags in {} are not a list of strings, using raw value: {}",
        source, tags
    );
    Some(match tags {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(true) | Value::Number(_) => false,
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn metadata_field(record: &Record, field: &str) -> String {
    match record.get(field) {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
