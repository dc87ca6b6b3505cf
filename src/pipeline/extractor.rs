//! The `Extractor` trait: stage B's black-box `(text, metadata)`
//! collaborator. Binary-format extraction (PDF, Office, HTML) is an
//! out-of-scope external collaborator per §1; this module ships the
//! plain-text passthrough implementation the rest of the pipeline
//! exercises against, plus the seam for an HTTP-backed extractor.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::model::Value;
use crate::Result;

#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<(String, BTreeMap<String, Value>)>;
}

/// Treats the blob as UTF-8 (lossily) plain text. Used whenever
/// `content_type` is absent or already `text/plain`.
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        PlainTextExtractor
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for PlainTextExtractor {
    async fn extract(
        &self,
        bytes: &[u8],
        _content_type: Option<&str>,
    ) -> Result<(String, BTreeMap<String, Value>)> {
        let text = String::from_utf8_lossy(bytes).into_owned();
        Ok((text, BTreeMap::new()))
    }
}

/// Delegates to an external text-extraction service over HTTP (e.g.
/// Apache Tika), the seam `tika_engine.py` occupied in the original.
/// Not implemented here — out-of-scope external collaborator per §1 —
/// but the trait is the point a future implementation plugs into.
pub struct HttpExtractor {
    client: reqwest::Client,
    url: String,
}

impl HttpExtractor {
    pub fn new(url: String, timeout: std::time::Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpExtractor { client, url })
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn extract(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<(String, BTreeMap<String, Value>)> {
        let mut request = self.client.post(&self.url).body(bytes.to_vec());
        if let Some(ct) = content_type {
            request = request.header("Content-Type", ct);
        }
        let response = request.send().await?;
        let json: serde_json::Value = response.json().await?;

        let text = json
            .get("content")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let metadata = json
            .get("metadata")
            .and_then(|v| v.as_object())
            .map(|obj| {
                obj.iter()
                    .map(|(k, v)| (k.clone(), Value::from_serializable(v).unwrap_or(Value::Null)))
                    .collect()
            })
            .unwrap_or_default();

        Ok((text, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_text_extractor_passes_through() {
        let extractor = PlainTextExtractor::new();
        let (text, metadata) = extractor.extract(b"hello world", None).await.unwrap();
        assert_eq!(text, "hello world");
        assert!(metadata.is_empty());
    }

    #[tokio::test]
    async fn test_plain_text_extractor_lossy_on_invalid_utf8() {
        let extractor = PlainTextExtractor::new();
        let (text, _) = extractor.extract(&[0xff, 0xfe], None).await.unwrap();
        assert!(!text.is_empty());
    }
}
