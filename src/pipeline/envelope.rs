//! The job envelope carried on both queue hops, gzip-compressed JSON
//! per §4.3. Before stage B runs, `content`/`metadata` are absent;
//! stage B fills them in before handing the envelope to stage C.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::model::{Document, Tlp, Value};
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub hexdigest: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default)]
    pub tlp: Tlp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub store: bool,

    /// Present once stage B has extracted text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl JobEnvelope {
    pub fn from_document(document: &Document) -> Self {
        JobEnvelope {
            hexdigest: document.hexdigest.clone(),
            filename: document.filename.clone(),
            uri: document.uri.clone(),
            tlp: document.tlp,
            owner: document.owner.clone(),
            store: document.store,
            content: None,
            content_type: None,
            metadata: BTreeMap::new(),
        }
    }

    /// gzip(JSON(self)) — the wire format for both `docs` and
    /// `analyze` tube payloads, per §4.3.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&json)
            .map_err(|e| Error::CorruptJob(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| Error::CorruptJob(e.to_string()))
    }

    /// Inverse of `encode`. A corrupt (non-gzip or non-JSON) payload is
    /// surfaced as `Error::CorruptJob` so the caller can log, delete,
    /// and continue per §7.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut decoder = GzDecoder::new(payload);
        let mut json = Vec::new();
        decoder
            .read_to_end(&mut json)
            .map_err(|e| Error::CorruptJob(e.to_string()))?;
        serde_json::from_slice(&json).map_err(|e| Error::CorruptJob(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Document;

    fn sample_document() -> Document {
        Document {
            hexdigest: "abc123".to_string(),
            filename: "report.pdf".to_string(),
            content_type: None,
            uri: Some("https://example.com/r.pdf".to_string()),
            tlp: Tlp::Amber,
            owner: Some("analyst".to_string()),
            store: true,
        }
    }

    #[test]
    fn test_round_trip() {
        let envelope = JobEnvelope::from_document(&sample_document());
        let payload = envelope.encode().unwrap();
        let decoded = JobEnvelope::decode(&payload).unwrap();
        assert_eq!(decoded.hexdigest, "abc123");
        assert_eq!(decoded.filename, "report.pdf");
        assert!(decoded.content.is_none());
    }

    #[test]
    fn test_decode_corrupt_payload_errors() {
        let err = JobEnvelope::decode(b"not gzip").unwrap_err();
        assert!(matches!(err, Error::CorruptJob(_)));
    }

    #[test]
    fn test_content_round_trips_after_extraction() {
        let mut envelope = JobEnvelope::from_document(&sample_document());
        envelope.content = Some("extracted text".to_string());
        envelope
            .metadata
            .insert("Creation-Date".to_string(), Value::String("2024-01-02T03:04:05Z".to_string()));

        let payload = envelope.encode().unwrap();
        let decoded = JobEnvelope::decode(&payload).unwrap();
        assert_eq!(decoded.content.as_deref(), Some("extracted text"));
        assert_eq!(decoded.metadata.len(), 1);
    }
}
