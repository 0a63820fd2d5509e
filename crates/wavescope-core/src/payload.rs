//! Tolerant decoding of the optional annotation payload
//!
//! ```json
//! {
//!   "segments": [{ "start": 1.0, "end": 2.0, "label": "Intro", "color": "#4a9", "editable": true }],
//!   "tags":     [{ "start": 3.2, "end": 3.6, "label": "applause", "confidence": 0.87 }],
//!   "keywords": [{ "start": 5.0, "end": 5.4, "label": "budget" }],
//!   "speakers": [{ "speaker": "A", "start": 0.0, "end": 4.1 }]
//! }
//! ```
//!
//! Each feature is decoded on its own. A feature that is present but
//! malformed is dropped with a warning and recorded in `skipped`; the others
//! still load and the waveform renders regardless.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::annotations::SpeakerInterval;
use crate::types::Seconds;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SegmentRecord {
    #[serde(alias = "startTime")]
    pub start: Seconds,
    #[serde(alias = "endTime")]
    pub end: Seconds,
    #[serde(default, alias = "labelText")]
    pub label: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub editable: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TagRecord {
    #[serde(alias = "startTime")]
    pub start: Seconds,
    #[serde(alias = "endTime")]
    pub end: Seconds,
    pub label: String,
    #[serde(default, alias = "score")]
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeywordRecord {
    #[serde(alias = "startTime")]
    pub start: Seconds,
    #[serde(alias = "endTime")]
    pub end: Seconds,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationPayload {
    pub segments: Option<Vec<SegmentRecord>>,
    pub tags: Option<Vec<TagRecord>>,
    pub keywords: Option<Vec<KeywordRecord>>,
    pub speakers: Option<Vec<SpeakerInterval>>,
    /// Features that were present but could not be decoded
    pub skipped: Vec<&'static str>,
}

impl AnnotationPayload {
    /// Parse a payload document
    ///
    /// Only invalid JSON is an error. A document that is not an object yields
    /// an empty payload.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        let Some(doc) = value.as_object() else {
            log::warn!("payload: expected a JSON object, ignoring annotations");
            return Self::default();
        };

        let mut skipped = Vec::new();
        Self {
            segments: feature(doc, "segments", &mut skipped),
            tags: feature(doc, "tags", &mut skipped),
            keywords: feature(doc, "keywords", &mut skipped),
            speakers: feature(doc, "speakers", &mut skipped),
            skipped,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_none() && self.tags.is_none() && self.keywords.is_none() && self.speakers.is_none()
    }
}

fn feature<T: DeserializeOwned>(doc: &Map<String, Value>, key: &'static str, skipped: &mut Vec<&'static str>) -> Option<Vec<T>> {
    let value = doc.get(key)?;
    match Vec::<T>::deserialize(value) {
        Ok(records) => Some(records),
        Err(e) => {
            log::warn!("payload: skipping {}: {}", key, e);
            skipped.push(key);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_payload() {
        let json = r##"{
            "segments": [{ "start": 1.0, "end": 2.0, "label": "Intro", "color": "#4a9", "editable": true }],
            "tags": [{ "startTime": 3.2, "endTime": 3.6, "label": "applause", "score": 0.87 }],
            "keywords": [{ "start": 5.0, "end": 5.4, "label": "budget" }],
            "speakers": [{ "speaker": "A", "start": 0.0, "end": 4.1 }]
        }"##;
        let payload = AnnotationPayload::from_json(json).unwrap();
        assert!(payload.skipped.is_empty());

        let segments = payload.segments.unwrap();
        assert_eq!(segments[0].label, "Intro");
        assert!(segments[0].editable);
        assert_eq!(payload.tags.unwrap()[0].confidence, 0.87);
        assert_eq!(payload.keywords.unwrap()[0].label, "budget");
        assert_eq!(payload.speakers.unwrap()[0].speaker, "A");
    }

    #[test]
    fn test_malformed_feature_skipped_others_kept() {
        let json = r#"{
            "tags": [{ "start": 1.0, "label": "missing end" }],
            "keywords": [{ "start": 5.0, "end": 5.4, "label": "budget" }],
            "speakers": "not a list"
        }"#;
        let payload = AnnotationPayload::from_json(json).unwrap();
        assert!(payload.tags.is_none());
        assert!(payload.speakers.is_none());
        assert!(payload.segments.is_none());
        assert_eq!(payload.keywords.map(|k| k.len()), Some(1));
        assert_eq!(payload.skipped, vec!["tags", "speakers"]);
    }

    #[test]
    fn test_non_object_is_empty() {
        let payload = AnnotationPayload::from_json("[1, 2, 3]").unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(AnnotationPayload::from_json("{ nope").is_err());
    }

    #[test]
    fn test_segment_defaults() {
        let json = r#"{ "segments": [{ "start": 0.5, "end": 1.5 }] }"#;
        let segments = AnnotationPayload::from_json(json).unwrap().segments.unwrap();
        assert_eq!(segments[0].label, "");
        assert!(!segments[0].editable);
        assert!(segments[0].color.is_none());
    }
}
