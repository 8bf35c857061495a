//! Best-stream selection over provider aggregator output
//!
//! The aggregator answers with one of several JSON shapes. They are decoded
//! once into [`ProviderOutput`], flattened by [`unify`], and ranked by
//! [`pick_best_stream`]:
//!
//! 1. A manifest (HLS) stream beats every file stream.
//! 2. File streams rank by the best quality label they offer.
//! 3. Ties keep the first stream seen.

use serde_json::{Map, Value};

use crate::models::{CandidateStream, ProviderResult, Quality};

/// Score given to manifest streams; above every file quality
const MANIFEST_SCORE: u32 = 9999;

/// Aggregator response, decoded at the boundary
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutput {
    /// Nothing usable (null, a scalar, or an unrecognized object)
    Empty,
    /// A single provider answered with one embedded stream
    SingleStream {
        source_id: String,
        embed_id: String,
        stream: CandidateStream,
    },
    /// Already a list of providers
    ProviderList(Vec<ProviderResult>),
}

impl ProviderOutput {
    /// Classify a raw aggregator payload.
    ///
    /// Streams with an unknown `type` are dropped here so selection only
    /// ever sees manifest or file streams.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => {
                ProviderOutput::ProviderList(items.into_iter().map(decode_provider).collect())
            }
            Value::Object(obj) if has_value(&obj, "stream") => {
                let source_id = string_field(&obj, "sourceId").unwrap_or_else(|| "unknown".into());
                let embed_id = string_field(&obj, "embedId").unwrap_or_else(|| "Unnamed".into());
                match obj.get("stream").cloned().and_then(decode_stream) {
                    Some(stream) => ProviderOutput::SingleStream {
                        source_id,
                        embed_id,
                        stream,
                    },
                    None => ProviderOutput::Empty,
                }
            }
            Value::Object(obj) if has_value(&obj, "streams") => {
                ProviderOutput::ProviderList(vec![decode_provider(Value::Object(obj))])
            }
            _ => ProviderOutput::Empty,
        }
    }
}

fn has_value(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key).is_some_and(|v| !v.is_null())
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn decode_stream(value: Value) -> Option<CandidateStream> {
    match serde_json::from_value(value) {
        Ok(stream) => Some(stream),
        Err(e) => {
            tracing::debug!(error = %e, "Skipping unrecognized stream");
            None
        }
    }
}

fn decode_provider(value: Value) -> ProviderResult {
    let Value::Object(mut obj) = value else {
        return ProviderResult {
            provider_id: "unknown".into(),
            provider_name: "Unnamed".into(),
            streams: Vec::new(),
        };
    };

    let provider_id = string_field(&obj, "id")
        .or_else(|| string_field(&obj, "sourceId"))
        .unwrap_or_else(|| "unknown".into());
    let provider_name = string_field(&obj, "name")
        .or_else(|| string_field(&obj, "embedId"))
        .unwrap_or_else(|| "Unnamed".into());
    let streams = match obj.remove("streams") {
        Some(Value::Array(items)) => items.into_iter().filter_map(decode_stream).collect(),
        _ => Vec::new(),
    };

    ProviderResult {
        provider_id,
        provider_name,
        streams,
    }
}

/// Flatten any aggregator shape into the canonical provider list
pub fn unify(output: ProviderOutput) -> Vec<ProviderResult> {
    match output {
        ProviderOutput::Empty => Vec::new(),
        ProviderOutput::SingleStream {
            source_id,
            embed_id,
            stream,
        } => vec![ProviderResult {
            provider_id: source_id,
            provider_name: embed_id,
            streams: vec![stream],
        }],
        ProviderOutput::ProviderList(list) => list,
    }
}

/// Highest score among the quality labels of a file stream.
///
/// Labels outside the ranked set score 0, the same as `unknown`.
pub fn highest_file_score<'a>(labels: impl IntoIterator<Item = &'a String>) -> u32 {
    labels
        .into_iter()
        .filter_map(|label| Quality::from_label(label))
        .map(|q| q.score())
        .max()
        .unwrap_or(0)
}

fn stream_score(stream: &CandidateStream) -> u32 {
    match stream {
        CandidateStream::Manifest { .. } => MANIFEST_SCORE,
        CandidateStream::File { qualities, .. } => highest_file_score(qualities.keys()),
    }
}

/// Pick the single best stream across all providers.
///
/// A candidate must score strictly above the running best (which starts at
/// 0) to be taken, so the first stream at the winning score is kept and a
/// file stream with no ranked quality is never chosen.
pub fn pick_best_stream(providers: &[ProviderResult]) -> Option<&CandidateStream> {
    let mut chosen = None;
    let mut chosen_score = 0;

    for stream in providers.iter().flat_map(|p| p.streams.iter()) {
        let score = stream_score(stream);
        if score > chosen_score {
            chosen_score = score;
            chosen = Some(stream);
        }
    }

    chosen
}
