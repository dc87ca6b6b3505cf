//! Stage C (Analyze): reserve from `analyze`, run the scheduler over
//! the shared `AnalysisRecord`, post-process dates, and write the
//! result to whatever sinks are configured — sink POST and index
//! upsert run additively when both are configured (Design Notes §9),
//! falling back to stdout when neither is.

use std::sync::Arc;

use chrono::Utc;

use crate::model::{is_strict_iso8601_utc, AnalysisRecord, Document, Value};
use crate::pipeline::{IndexClient, JobEnvelope, Queue, Sink, ANALYZE_TUBE};
use crate::scheduler::Analyzer;
use crate::Result;

/// The date-metadata keys stage C strict-ISO-8601-filters before
/// indexing, plus an optional sink/index client pair — additive when
/// both are configured.
pub struct StageC {
    pub analyzers: Vec<Arc<dyn Analyzer>>,
    pub date_fields: Vec<String>,
    pub sink: Option<Arc<dyn Sink>>,
    pub index: Option<Arc<dyn IndexClient>>,
}

impl StageC {
    /// Build the `AnalysisRecord` for one envelope, run the scheduler
    /// to quiescence, post-process dates, and dispatch to whatever
    /// sinks are configured. Returns the finished record so the
    /// standalone filter mode can print it, and so callers other than
    /// the queue worker can reuse the same logic.
    pub async fn analyze(&self, envelope: JobEnvelope) -> Result<AnalysisRecord> {
        let content = envelope.content.clone().unwrap_or_default();

        let mut record = AnalysisRecord::new(Document {
            hexdigest: envelope.hexdigest,
            filename: envelope.filename,
            content_type: envelope.content_type,
            uri: envelope.uri,
            tlp: envelope.tlp,
            owner: envelope.owner,
            store: envelope.store,
        });
        record.content = content;
        record.metadata = envelope.metadata;

        let analyzed_date = Utc::now();
        record.analyzed_date = Some(analyzed_date);
        record.creation_date = Some(
            record
                .metadata
                .get("Creation-Date")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse().ok())
                .unwrap_or(analyzed_date),
        );

        crate::scheduler::run(&self.analyzers, &mut record).await;

        filter_date_metadata(&mut record, &self.date_fields);

        // `store=false`: content lives in quarantine and is never
        // indexed or posted, per §3's Document invariant. Standalone
        // filter mode (no sink, no index) still prints to stdout
        // regardless — quarantine governs indexing, not the CLI's
        // stdin/stdout contract.
        if !record.store {
            tracing::info!(hexdigest = %record.hexdigest, "quarantined document: skipping sink/index");
        }

        if record.store {
            if let Some(sink) = &self.sink {
                if let Err(err) = sink.post(&record).await {
                    tracing::error!(error = %err, hexdigest = %record.hexdigest, "sink post failed");
                }
            }
            if let Some(index) = &self.index {
                if let Err(err) = index.upsert(&record).await {
                    tracing::error!(error = %err, hexdigest = %record.hexdigest, "index write failed");
                }
            }
        }
        if self.sink.is_none() && self.index.is_none() {
            match serde_json::to_string(&record) {
                Ok(json) => println!("{json}"),
                Err(err) => tracing::error!(error = %err, "failed to serialize result"),
            }
        }

        Ok(record)
    }
}

/// Drop any `metadata` key in `date_fields` whose value is not a
/// strict `YYYY-MM-DDTHH:MM:SSZ` string, per §4.3.
fn filter_date_metadata(record: &mut AnalysisRecord, date_fields: &[String]) {
    for field in date_fields {
        let keep = matches!(
            record.metadata.get(field),
            Some(Value::String(s)) if is_strict_iso8601_utc(s)
        );
        if !keep {
            record.metadata.remove(field);
        }
    }
}

/// Run the scheduler over a single envelope read from stdin and write
/// the result to stdout, per §4.3's "standalone mode" / §6's CLI
/// filter contract. Returns a nonzero-exit-worthy error on I/O or
/// decode failure.
pub async fn analyze_one(analyzers: Vec<Arc<dyn Analyzer>>, date_fields: Vec<String>) -> Result<()> {
    use std::io::Read;

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;

    let envelope: JobEnvelope = serde_json::from_str(&input)?;

    let stage = StageC {
        analyzers,
        date_fields,
        sink: None,
        index: None,
    };
    let record = stage.analyze(envelope).await?;
    println!("{}", serde_json::to_string(&record)?);
    Ok(())
}

/// Reserve and process exactly one job from `analyze`, if any is
/// waiting. Missing `content` is logged and skipped per §4.3's
/// "Stage-C pipeline specifics."
pub async fn process_one(queue: &(dyn Queue + Send + Sync), stage: &StageC) -> bool {
    let reservation = match queue.reserve(ANALYZE_TUBE).await {
        Ok(Some(r)) => r,
        Ok(None) => return false,
        Err(err) => {
            tracing::error!(error = %err, "stage C: failed to reserve from analyze");
            return false;
        }
    };

    let envelope = match JobEnvelope::decode(&reservation.payload) {
        Ok(e) => e,
        Err(err) => {
            tracing::warn!(error = %err, "stage C: corrupt job, deleting");
            let _ = queue.delete(ANALYZE_TUBE, reservation.id).await;
            return true;
        }
    };

    if let Err(err) = queue.delete(ANALYZE_TUBE, reservation.id).await {
        tracing::error!(error = %err, "stage C: failed to delete job from analyze");
    }

    if envelope.content.is_none() {
        tracing::error!(hexdigest = %envelope.hexdigest, "stage C: missing content, skipping");
        return true;
    }

    if let Err(err) = stage.analyze(envelope).await {
        tracing::error!(error = %err, "stage C: analysis failed");
    }

    true
}

/// Run stage C's worker loop indefinitely: reserve -> analyze ->
/// delete, backing off briefly when `analyze` is empty.
pub async fn run_analyze_worker(queue: Arc<dyn Queue + Send + Sync>, stage: Arc<StageC>) {
    loop {
        let did_work = process_one(queue.as_ref(), stage.as_ref()).await;
        if !did_work {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Tlp;
    use crate::pipeline::MemoryQueue;
    use crate::scheduler::analyzer::test_support::StubAnalyzer;

    fn envelope_with_content(content: &str) -> JobEnvelope {
        let mut envelope = JobEnvelope::from_document(&Document {
            hexdigest: "h1".to_string(),
            filename: "r.txt".to_string(),
            content_type: None,
            uri: None,
            tlp: Tlp::Amber,
            owner: None,
            store: true,
        });
        envelope.content = Some(content.to_string());
        envelope
    }

    fn stage_with(analyzers: Vec<Arc<dyn Analyzer>>) -> StageC {
        StageC {
            analyzers,
            date_fields: vec!["Creation-Date".to_string(), "Analyzed-Date".to_string()],
            sink: None,
            index: None,
        }
    }

    struct CountingIndex {
        upserts: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl IndexClient for CountingIndex {
        async fn upsert(&self, _record: &AnalysisRecord) -> Result<()> {
            self.upserts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }

        async fn get(&self, _hexdigest: &str) -> Result<Option<AnalysisRecord>> {
            Ok(None)
        }

        async fn query_indicators(
            &self,
            _indicator_type: &str,
            _since: Option<chrono::DateTime<Utc>>,
        ) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_quarantined_document_is_not_indexed() {
        let index = Arc::new(CountingIndex {
            upserts: std::sync::atomic::AtomicUsize::new(0),
        });
        let stage = StageC {
            analyzers: vec![],
            date_fields: vec![],
            sink: None,
            index: Some(index.clone()),
        };

        let mut envelope = envelope_with_content("hello");
        envelope.store = false;
        stage.analyze(envelope).await.unwrap();

        assert_eq!(index.upserts.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_quarantined_document_is_indexed() {
        let index = Arc::new(CountingIndex {
            upserts: std::sync::atomic::AtomicUsize::new(0),
        });
        let stage = StageC {
            analyzers: vec![],
            date_fields: vec![],
            sink: None,
            index: Some(index.clone()),
        };

        let mut envelope = envelope_with_content("hello");
        envelope.store = true;
        stage.analyze(envelope).await.unwrap();

        assert_eq!(index.upserts.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_analyze_sets_dates_and_runs_scheduler() {
        let pos_tag = Arc::new(StubAnalyzer::new("pos_tag", &[]));
        let stage = stage_with(vec![pos_tag]);

        let record = stage.analyze(envelope_with_content("hello")).await.unwrap();
        assert!(record.analyzed_date.is_some());
        assert_eq!(record.creation_date, record.analyzed_date);
        assert!(record.has_result("pos_tag"));
    }

    #[tokio::test]
    async fn test_creation_date_taken_from_metadata_when_present() {
        let stage = stage_with(vec![]);
        let mut envelope = envelope_with_content("hello");
        envelope.metadata.insert(
            "Creation-Date".to_string(),
            Value::String("2020-01-01T00:00:00Z".to_string()),
        );

        let record = stage.analyze(envelope).await.unwrap();
        assert_eq!(
            record.creation_date.unwrap().to_rfc3339(),
            "2020-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_filter_date_metadata_drops_non_conforming_values() {
        let mut record = AnalysisRecord::new(Document {
            hexdigest: "h".to_string(),
            filename: "f".to_string(),
            content_type: None,
            uri: None,
            tlp: Tlp::Amber,
            owner: None,
            store: false,
        });
        record
            .metadata
            .insert("Creation-Date".to_string(), Value::String("not a date".to_string()));
        record.metadata.insert(
            "Last-Modified".to_string(),
            Value::String("2020-01-01T00:00:00Z".to_string()),
        );

        filter_date_metadata(
            &mut record,
            &["Creation-Date".to_string(), "Last-Modified".to_string()],
        );

        assert!(!record.metadata.contains_key("Creation-Date"));
        assert!(record.metadata.contains_key("Last-Modified"));
    }

    #[tokio::test]
    async fn test_missing_content_skips_without_error() {
        let queue = MemoryQueue::new();
        let mut envelope = envelope_with_content("placeholder");
        envelope.content = None;
        queue.enqueue(ANALYZE_TUBE, envelope.encode().unwrap()).await.unwrap();

        let stage = stage_with(vec![]);
        let did_work = process_one(&queue, &stage).await;
        assert!(did_work);
        assert_eq!(queue.depth(ANALYZE_TUBE).await.unwrap(), 0);
    }
}
