//! `threatactor`: scan `content` against the threat-actor alias
//! vocabulary, normalizing hits with Capitalize mode and the
//! configured uppercase-abbreviation whitelist.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{AnalysisRecord, Value};
use crate::scheduler::Analyzer;
use crate::vocab::AliasTable;
use crate::Result;

/// Mirrors the original `threatactor_pattern.py`'s `res.ThreatActors`
/// field name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreatActorResult {
    #[serde(rename = "ThreatActors")]
    pub threat_actors: Vec<String>,
}

pub struct ThreatActorAnalyzer {
    table: Arc<AliasTable>,
    uppercase_abbreviations: Vec<String>,
}

impl ThreatActorAnalyzer {
    pub fn new(table: Arc<AliasTable>, uppercase_abbreviations: Vec<String>) -> Self {
        ThreatActorAnalyzer {
            table,
            uppercase_abbreviations,
        }
    }
}

#[async_trait]
impl Analyzer for ThreatActorAnalyzer {
    fn name(&self) -> &str {
        "threatactor"
    }

    fn version(&self) -> &str {
        "1.0"
    }

    fn dependencies(&self) -> &[String] {
        &[]
    }

    async fn analyze(&self, record: &AnalysisRecord) -> Result<Value> {
        if self.table.is_empty() {
            return Value::from_serializable(&ThreatActorResult::default());
        }
        let hits = self
            .table
            .scan_normalized(&record.content, &self.uppercase_abbreviations);
        Value::from_serializable(&ThreatActorResult {
            threat_actors: hits,
        })
    }
}
