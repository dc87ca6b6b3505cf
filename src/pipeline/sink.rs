//! The `Sink` trait: stage C's optional HTTP POST of the finished
//! result, additive with the index client per Design Notes §9.

use async_trait::async_trait;

use crate::model::AnalysisRecord;
use crate::Result;

#[async_trait]
pub trait Sink: Send + Sync {
    async fn post(&self, record: &AnalysisRecord) -> Result<()>;
}

pub struct HttpSink {
    client: reqwest::Client,
    url: String,
}

impl HttpSink {
    pub fn new(url: String, timeout: std::time::Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpSink { client, url })
    }
}

#[async_trait]
impl Sink for HttpSink {
    async fn post(&self, record: &AnalysisRecord) -> Result<()> {
        self.client
            .post(&self.url)
            .json(record)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
