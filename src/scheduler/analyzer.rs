//! The `Analyzer` contract every plugin DAG participant implements.

use async_trait::async_trait;

use crate::model::{AnalysisRecord, Value};
use crate::Result;

/// One analyzer: a named, versioned unit of work over a shared
/// `AnalysisRecord`, declaring the other analyzers' output it
/// requires before it can run.
#[async_trait]
pub trait Analyzer: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// Names of other analyzers whose keys must already be present in
    /// the record before this one is scheduled.
    fn dependencies(&self) -> &[String];

    /// Run against the current snapshot of the record. Analyzers never
    /// mutate `record` directly — they return the value the scheduler
    /// writes under `record[self.name()]` on success.
    async fn analyze(&self, record: &AnalysisRecord) -> Result<Value>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// A minimal analyzer used across scheduler tests: always succeeds,
    /// optionally records how many times it ran.
    pub struct StubAnalyzer {
        pub name: String,
        pub version: String,
        pub deps: Vec<String>,
        pub calls: Arc<AtomicUsize>,
        pub result: Value,
    }

    impl StubAnalyzer {
        pub fn new(name: &str, deps: &[&str]) -> Self {
            StubAnalyzer {
                name: name.to_string(),
                version: "1.0".to_string(),
                deps: deps.iter().map(|s| s.to_string()).collect(),
                calls: Arc::new(AtomicUsize::new(0)),
                result: Value::Bool(true),
            }
        }
    }

    #[async_trait]
    impl Analyzer for StubAnalyzer {
        fn name(&self) -> &str {
            &self.name
        }

        fn version(&self) -> &str {
            &self.version
        }

        fn dependencies(&self) -> &[String] {
            &self.deps
        }

        async fn analyze(&self, _record: &AnalysisRecord) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.result.clone())
        }
    }

    /// An analyzer that always fails, to exercise failure isolation.
    pub struct FailingAnalyzer {
        pub name: String,
        pub deps: Vec<String>,
    }

    #[async_trait]
    impl Analyzer for FailingAnalyzer {
        fn name(&self) -> &str {
            &self.name
        }

        fn version(&self) -> &str {
            "1.0"
        }

        fn dependencies(&self) -> &[String] {
            &self.deps
        }

        async fn analyze(&self, _record: &AnalysisRecord) -> Result<Value> {
            Err(crate::Error::AnalyzerFailed {
                name: self.name.clone(),
                source: "intentional failure".to_string(),
            })
        }
    }
}
