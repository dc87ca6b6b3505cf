//! The `IndexClient` trait: the full-text search store stage C
//! upserts into, keyed by `hexdigest`, and `GET /indicators/{type}`
//! reads from. Treated as an external key-value/search collaborator
//! per §1; the original backs this with Elasticsearch over HTTP, so
//! the reference implementation here speaks its document API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::AnalysisRecord;
use crate::Result;

#[async_trait]
pub trait IndexClient: Send + Sync {
    async fn upsert(&self, record: &AnalysisRecord) -> Result<()>;

    async fn get(&self, hexdigest: &str) -> Result<Option<AnalysisRecord>>;

    /// Flatten every value under `indicators.<indicator_type>` across
    /// documents analyzed at or after `since`, one per line at the
    /// HTTP layer.
    async fn query_indicators(
        &self,
        indicator_type: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<String>>;
}

pub struct HttpIndexClient {
    client: reqwest::Client,
    base_url: String,
    index_name: String,
}

impl HttpIndexClient {
    pub fn new(base_url: String, index_name: String, timeout: std::time::Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpIndexClient {
            client,
            base_url,
            index_name,
        })
    }

    fn doc_url(&self, hexdigest: &str) -> String {
        format!("{}/{}/_doc/{}", self.base_url, self.index_name, hexdigest)
    }

    fn search_url(&self) -> String {
        format!("{}/{}/_search", self.base_url, self.index_name)
    }
}

#[async_trait]
impl IndexClient for HttpIndexClient {
    async fn upsert(&self, record: &AnalysisRecord) -> Result<()> {
        self.client
            .put(self.doc_url(&record.hexdigest))
            .json(record)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn get(&self, hexdigest: &str) -> Result<Option<AnalysisRecord>> {
        let response = self.client.get(self.doc_url(hexdigest)).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: serde_json::Value = response.error_for_status()?.json().await?;
        let source = body.get("_source").cloned().unwrap_or(body);
        Ok(Some(serde_json::from_value(source)?))
    }

    async fn query_indicators(
        &self,
        indicator_type: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<String>> {
        let field = format!("indicators.{indicator_type}");
        let mut query = serde_json::json!({
            "query": { "match_all": {} },
            "_source": [field],
        });
        if let Some(since) = since {
            query["query"] = serde_json::json!({
                "range": { "Analyzed-Date": { "gte": since.to_rfc3339() } }
            });
        }

        let response = self
            .client
            .post(self.search_url())
            .json(&query)
            .send()
            .await?
            .error_for_status()?;
        let body: serde_json::Value = response.json().await?;

        let hits = body
            .get("hits")
            .and_then(|h| h.get("hits"))
            .and_then(|h| h.as_array())
            .cloned()
            .unwrap_or_default();

        let mut out = Vec::new();
        for hit in hits {
            if let Some(values) = hit
                .get("_source")
                .and_then(|s| s.get("indicators"))
                .and_then(|i| i.get(indicator_type))
                .and_then(|v| v.as_array())
            {
                for value in values {
                    if let Some(s) = value.as_str() {
                        out.push(s.to_string());
                    }
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_url_format() {
        let client = HttpIndexClient::new(
            "http://localhost:9200".to_string(),
            "scio".to_string(),
            std::time::Duration::from_secs(180),
        )
        .unwrap();
        assert_eq!(client.doc_url("abc123"), "http://localhost:9200/scio/_doc/abc123");
    }

    #[test]
    fn test_search_url_format() {
        let client = HttpIndexClient::new(
            "http://localhost:9200".to_string(),
            "scio".to_string(),
            std::time::Duration::from_secs(180),
        )
        .unwrap();
        assert_eq!(client.search_url(), "http://localhost:9200/scio/_search");
    }
}
