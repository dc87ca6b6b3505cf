//! `mitre_attack`: regex-extract ATT&CK Group/Tactic/Technique/
//! Sub-technique/Software identifiers.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{AnalysisRecord, Value};
use crate::scheduler::Analyzer;
use crate::Result;

fn group_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bG\d{4}\b").unwrap())
}

fn tactic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bTA\d{4}\b").unwrap())
}

fn sub_technique_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bT\d{4}\.\d{3}\b").unwrap())
}

fn technique_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Negative lookahead isn't supported by `regex`; instead, match all
    // T#### occurrences and the sub-technique filter drops them below.
    RE.get_or_init(|| Regex::new(r"\bT\d{4}\b").unwrap())
}

fn software_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bS\d{4}\b").unwrap())
}

fn extract_dedup(re: &Regex, text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for m in re.find_iter(text) {
        let s = m.as_str().to_string();
        if seen.insert(s.clone()) {
            out.push(s);
        }
    }
    out
}

/// Field names match the original plugin's `res.Groups`/`res.Tactics`/
/// etc capitalization, per §8 scenario S2.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MitreAttackResult {
    #[serde(rename = "Groups")]
    pub groups: Vec<String>,
    #[serde(rename = "Tactics")]
    pub tactics: Vec<String>,
    #[serde(rename = "Techniques")]
    pub techniques: Vec<String>,
    #[serde(rename = "SubTechniques")]
    pub sub_techniques: Vec<String>,
    #[serde(rename = "Software")]
    pub software: Vec<String>,
}

pub fn extract_mitre_attack(content: &str) -> MitreAttackResult {
    let sub_technique = extract_dedup(sub_technique_re(), content);

    // `T\d{4}` not followed by `.NNN`: a plain technique match whose
    // span is immediately followed by '.' and three digits is really
    // part of a sub-technique id and must be excluded.
    let mut technique = Vec::new();
    let mut seen = BTreeSet::new();
    for m in technique_re().find_iter(content) {
        let tail = &content[m.end()..];
        let is_sub = tail.starts_with('.')
            && tail
                .chars()
                .skip(1)
                .take(3)
                .all(|c| c.is_ascii_digit())
            && tail.chars().skip(1).take(3).count() == 3;
        if !is_sub {
            let s = m.as_str().to_string();
            if seen.insert(s.clone()) {
                technique.push(s);
            }
        }
    }

    MitreAttackResult {
        groups: extract_dedup(group_re(), content),
        tactics: extract_dedup(tactic_re(), content),
        techniques: technique,
        sub_techniques: sub_technique,
        software: extract_dedup(software_re(), content),
    }
}

pub struct MitreAttackAnalyzer;

impl MitreAttackAnalyzer {
    pub fn new() -> Self {
        MitreAttackAnalyzer
    }
}

impl Default for MitreAttackAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for MitreAttackAnalyzer {
    fn name(&self) -> &str {
        "mitre_attack"
    }

    fn version(&self) -> &str {
        "1.0"
    }

    fn dependencies(&self) -> &[String] {
        &[]
    }

    async fn analyze(&self, record: &AnalysisRecord) -> Result<Value> {
        let result = extract_mitre_attack(&record.content);
        Value::from_serializable(&result)
    }
}
