//! `vulnerabilities`: regex-extract CVE and Microsoft bulletin IDs.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{AnalysisRecord, Value};
use crate::scheduler::Analyzer;
use crate::Result;

fn cve_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bCVE-\d{4}-\d{4,7}\b").unwrap())
}

fn msid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bMS\d{2}-\d+\b").unwrap())
}

fn extract_dedup(re: &Regex, text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for m in re.find_iter(text) {
        let normalized = m.as_str().to_uppercase();
        if seen.insert(normalized.clone()) {
            out.push(normalized);
        }
    }
    out
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VulnerabilitiesResult {
    pub cve: Vec<String>,
    pub msid: Vec<String>,
}

pub fn extract_vulnerabilities(content: &str) -> VulnerabilitiesResult {
    VulnerabilitiesResult {
        cve: extract_dedup(cve_re(), content),
        msid: extract_dedup(msid_re(), content),
    }
}

pub struct VulnerabilitiesAnalyzer;

impl VulnerabilitiesAnalyzer {
    pub fn new() -> Self {
        VulnerabilitiesAnalyzer
    }
}

impl Default for VulnerabilitiesAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for VulnerabilitiesAnalyzer {
    fn name(&self) -> &str {
        "vulnerabilities"
    }

    fn version(&self) -> &str {
        "1.0"
    }

    fn dependencies(&self) -> &[String] {
        &[]
    }

    async fn analyze(&self, record: &AnalysisRecord) -> Result<Value> {
        let result = extract_vulnerabilities(&record.content);
        Value::from_serializable(&result)
    }
}
