//! Canonical transcript schema and the ASR response normalizer.
//!
//! Speech providers disagree wildly about response shapes: some return a bare
//! string, some `{text, segments}`, some bury everything under
//! `results[].alternatives[]` with `{seconds, nanos}` timestamps. Everything
//! downstream of ASR consumes only the canonical [`Transcript`]; this module
//! is the single place that knows about provider shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A word with its timing, in fractional seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

/// One transcript segment. `words` is present iff the provider supplied
/// word-level timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<Word>>,
}

/// The canonical transcript every pipeline stage consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub segments: Vec<Segment>,
}

impl Transcript {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            segments: Vec::new(),
        }
    }

    /// True when at least one segment carries word-level timing.
    pub fn has_words(&self) -> bool {
        self.segments
            .iter()
            .any(|s| s.words.as_ref().is_some_and(|w| !w.is_empty()))
    }

    /// All words across segments, in order.
    pub fn words(&self) -> Vec<&Word> {
        self.segments
            .iter()
            .filter_map(|s| s.words.as_ref())
            .flatten()
            .collect()
    }
}

/// Structural classification of a raw provider payload.
enum AsrPayload<'a> {
    Null,
    Text(&'a str),
    /// `{text: string, segments: array}`
    WithText(&'a str, &'a [Value]),
    /// `{segments: array}` without a top-level text
    WithSegments(&'a [Value]),
    /// `{results: [{alternatives: [{transcript, words?}]}]}`
    GoogleResults(&'a [Value]),
    Unknown,
}

fn classify(raw: &Value) -> AsrPayload<'_> {
    match raw {
        Value::Null => AsrPayload::Null,
        Value::String(s) => AsrPayload::Text(s),
        Value::Object(map) => {
            let segments = map.get("segments").and_then(Value::as_array);
            if let Some(text) = map.get("text").and_then(Value::as_str) {
                // A missing segments array is the same as an empty one, so
                // `{"text": "..."}` alone still lands here.
                return AsrPayload::WithText(
                    text,
                    segments.map(Vec::as_slice).unwrap_or_default(),
                );
            }
            match segments {
                Some(segments) => AsrPayload::WithSegments(segments),
                None => match map.get("results").and_then(Value::as_array) {
                    Some(results) => AsrPayload::GoogleResults(results),
                    None => AsrPayload::Unknown,
                },
            }
        }
        _ => AsrPayload::Unknown,
    }
}

/// Normalize any provider payload into the canonical schema. Total: every
/// input maps to a transcript with finite, non-negative times.
pub fn normalize(raw: &Value) -> Transcript {
    match classify(raw) {
        AsrPayload::Null => Transcript::from_text(""),
        AsrPayload::Text(s) => Transcript::from_text(s),
        AsrPayload::WithText(text, segments) => Transcript {
            text: text.to_string(),
            segments: segments.iter().map(segment_from_value).collect(),
        },
        AsrPayload::WithSegments(segments) => {
            let segments: Vec<Segment> = segments.iter().map(segment_from_value).collect();
            let text = segments
                .iter()
                .map(|s| s.text.as_str())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            Transcript { text, segments }
        }
        AsrPayload::GoogleResults(results) => normalize_google(results),
        AsrPayload::Unknown => Transcript::from_text(raw.to_string()),
    }
}

fn segment_from_value(value: &Value) -> Segment {
    let text = value
        .get("text")
        .or_else(|| value.get("transcript"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let start = value
        .get("start")
        .or_else(|| value.get("begin"))
        .or_else(|| value.get("seek"))
        .map(time_value)
        .unwrap_or(0.0);
    let end = match value.get("end") {
        Some(end) => time_value(end),
        None => match value.get("duration") {
            Some(duration) => start + time_value(duration),
            None => 0.0,
        },
    };
    let words = value.get("words").and_then(Value::as_array).map(|words| {
        words.iter().map(word_from_value).collect::<Vec<Word>>()
    });
    Segment {
        text,
        start,
        end,
        words,
    }
}

fn word_from_value(value: &Value) -> Word {
    let word = value
        .get("word")
        .or_else(|| value.get("text"))
        .or_else(|| value.get("token"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let start = value
        .get("start")
        .or_else(|| value.get("startTime"))
        .map(time_value)
        .unwrap_or(0.0);
    let end = value
        .get("end")
        .or_else(|| value.get("endTime"))
        .map(time_value)
        .unwrap_or(0.0);
    Word { word, start, end }
}

/// Google speech shape: first-alternative transcripts joined with spaces.
/// Word timing, when present, becomes one single-word segment per word so
/// downstream code uniformly sees timed segments.
fn normalize_google(results: &[Value]) -> Transcript {
    let mut parts: Vec<&str> = Vec::new();
    let mut segments: Vec<Segment> = Vec::new();

    for result in results {
        let alternative = result
            .get("alternatives")
            .and_then(Value::as_array)
            .and_then(|alts| alts.first());
        let Some(alternative) = alternative else {
            continue;
        };
        if let Some(transcript) = alternative.get("transcript").and_then(Value::as_str) {
            parts.push(transcript);
        }
        if let Some(words) = alternative.get("words").and_then(Value::as_array) {
            for value in words {
                let word = word_from_value(value);
                segments.push(Segment {
                    text: word.word.clone(),
                    start: word.start,
                    end: word.end,
                    words: Some(vec![word]),
                });
            }
        }
    }

    Transcript {
        text: parts.join(" "),
        segments,
    }
}

/// Tolerant numeric coercion: numbers and numeric strings pass through,
/// `{seconds, nanos}` objects convert to fractional seconds, anything else
/// (including non-finite values) becomes 0.
fn time_value(value: &Value) -> f64 {
    let raw = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.parse().unwrap_or(0.0),
        Value::Object(map) => {
            let seconds = map.get("seconds").map(time_value).unwrap_or(0.0);
            let nanos = map.get("nanos").map(time_value).unwrap_or(0.0);
            seconds + nanos / 1e9
        }
        _ => 0.0,
    };
    if raw.is_finite() {
        raw
    } else {
        0.0
    }
}
