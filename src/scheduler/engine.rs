//! Wave-based concurrent execution of a set of analyzers over a
//! shared `AnalysisRecord`.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::model::AnalysisRecord;
use crate::scheduler::analyzer::Analyzer;

/// Run every analyzer in `analyzers` to quiescence against `record`,
/// per the algorithm in §4.2: partition into ready/staged, launch each
/// wave concurrently, merge successes, promote newly-ready staged
/// analyzers, repeat until no analyzer is ready; log whatever remains
/// staged as skipped.
pub async fn run(analyzers: &[Arc<dyn Analyzer>], record: &mut AnalysisRecord) {
    let mut staged: Vec<Arc<dyn Analyzer>> = analyzers.to_vec();
    let mut ready: Vec<Arc<dyn Analyzer>> = Vec::new();

    take_ready(&mut staged, &mut ready, record);

    while !ready.is_empty() {
        // Each invocation sees the snapshot of `record` as it existed
        // when the wave began; mutations only land after the join.
        // Spawning a task per analyzer (rather than just `join_all`-ing
        // futures on the current task) lets the wave actually use every
        // core on a multi-threaded runtime, not just interleave at
        // await points.
        let snapshot = Arc::new(record.clone());
        let handles = ready.iter().cloned().map(|analyzer| {
            let snapshot = Arc::clone(&snapshot);
            tokio::spawn(async move {
                let result = analyzer.analyze(&snapshot).await;
                (analyzer, result)
            })
        });

        let completed = join_all(handles).await;

        for joined in completed {
            let (analyzer, result) = match joined {
                Ok(pair) => pair,
                Err(join_err) => {
                    warn!(error = %join_err, "analyzer task panicked");
                    continue;
                }
            };
            match result {
                Ok(value) => {
                    record.set_result(analyzer.name(), value);
                    info!(analyzer = analyzer.name(), "analyzer completed");
                }
                Err(err) => {
                    warn!(analyzer = analyzer.name(), error = %err, "analyzer failed");
                }
            }
        }

        ready.clear();
        take_ready(&mut staged, &mut ready, record);
    }

    for analyzer in &staged {
        let unmet: Vec<&String> = analyzer
            .dependencies()
            .iter()
            .filter(|dep| !record.has_result(dep))
            .collect();
        warn!(
            analyzer = analyzer.name(),
            unmet_dependencies = ?unmet,
            "analyzer skipped: unmet dependencies"
        );
    }
}

/// Move every analyzer in `staged` whose dependencies are all present
/// in `record` into `ready`, leaving the rest behind.
fn take_ready(
    staged: &mut Vec<Arc<dyn Analyzer>>,
    ready: &mut Vec<Arc<dyn Analyzer>>,
    record: &AnalysisRecord,
) {
    let mut remaining = Vec::with_capacity(staged.len());
    for analyzer in staged.drain(..) {
        if analyzer
            .dependencies()
            .iter()
            .all(|dep| record.has_result(dep))
        {
            ready.push(analyzer);
        } else {
            remaining.push(analyzer);
        }
    }
    *staged = remaining;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Document, Tlp, Value};
    use crate::scheduler::analyzer::test_support::{FailingAnalyzer, StubAnalyzer};
    use std::sync::atomic::Ordering;

    fn blank_record() -> AnalysisRecord {
        AnalysisRecord::new(Document {
            hexdigest: "deadbeef".to_string(),
            filename: "doc.txt".to_string(),
            content_type: None,
            uri: None,
            tlp: Tlp::Amber,
            owner: None,
            store: true,
        })
    }

    #[tokio::test]
    async fn test_dependency_ordering() {
        let pos_tag = Arc::new(StubAnalyzer::new("pos_tag", &[]));
        let sectors = Arc::new(StubAnalyzer::new("sectors", &["pos_tag"]));
        let analyzers: Vec<Arc<dyn Analyzer>> = vec![pos_tag.clone(), sectors.clone()];

        let mut record = blank_record();
        run(&analyzers, &mut record).await;

        assert!(record.has_result("pos_tag"));
        assert!(record.has_result("sectors"));
        assert_eq!(pos_tag.calls.load(Ordering::SeqCst), 1);
        assert_eq!(sectors.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unmet_dependency_is_skipped_not_run() {
        let orphan = Arc::new(StubAnalyzer::new("locations", &["pos_tag"]));
        let analyzers: Vec<Arc<dyn Analyzer>> = vec![orphan.clone()];

        let mut record = blank_record();
        run(&analyzers, &mut record).await;

        assert!(!record.has_result("locations"));
        assert_eq!(orphan.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_does_not_poison_siblings() {
        let failing = Arc::new(FailingAnalyzer {
            name: "broken".to_string(),
            deps: vec![],
        });
        let healthy = Arc::new(StubAnalyzer::new("healthy", &[]));
        let analyzers: Vec<Arc<dyn Analyzer>> = vec![failing, healthy.clone()];

        let mut record = blank_record();
        run(&analyzers, &mut record).await;

        assert!(!record.has_result("broken"));
        assert!(record.has_result("healthy"));
    }

    #[tokio::test]
    async fn test_failure_does_not_block_later_waves() {
        let failing = Arc::new(FailingAnalyzer {
            name: "broken".to_string(),
            deps: vec![],
        });
        let downstream = Arc::new(StubAnalyzer::new("downstream", &["healthy"]));
        let healthy = Arc::new(StubAnalyzer::new("healthy", &[]));
        let analyzers: Vec<Arc<dyn Analyzer>> = vec![failing, healthy, downstream.clone()];

        let mut record = blank_record();
        run(&analyzers, &mut record).await;

        assert!(record.has_result("downstream"));
    }

    #[tokio::test]
    async fn test_result_value_is_written() {
        let mut stub = StubAnalyzer::new("tagger", &[]);
        stub.result = Value::String("tagged".to_string());
        let analyzers: Vec<Arc<dyn Analyzer>> = vec![Arc::new(stub)];

        let mut record = blank_record();
        run(&analyzers, &mut record).await;

        assert_eq!(
            record.results.get("tagger"),
            Some(&Value::String("tagged".to_string()))
        );
    }
}
