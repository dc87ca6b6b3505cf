//! `tools`: scan `content` against the malware/tool-name alias
//! vocabulary.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{AnalysisRecord, Value};
use crate::scheduler::Analyzer;
use crate::vocab::AliasTable;
use crate::Result;

/// Mirrors the original `tools_pattern.py`'s `res.Tools` field name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsResult {
    #[serde(rename = "Tools")]
    pub tools: Vec<String>,
}

pub struct ToolsAnalyzer {
    table: Arc<AliasTable>,
}

impl ToolsAnalyzer {
    pub fn new(table: Arc<AliasTable>) -> Self {
        ToolsAnalyzer { table }
    }
}

#[async_trait]
impl Analyzer for ToolsAnalyzer {
    fn name(&self) -> &str {
        "tools"
    }

    fn version(&self) -> &str {
        "1.0"
    }

    fn dependencies(&self) -> &[String] {
        &[]
    }

    async fn analyze(&self, record: &AnalysisRecord) -> Result<Value> {
        if self.table.is_empty() {
            return Value::from_serializable(&ToolsResult::default());
        }
        let hits = self.table.scan(&record.content);
        Value::from_serializable(&ToolsResult { tools: hits })
    }
}
