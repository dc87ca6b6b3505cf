//! `indicators`: regex-extract IOCs after reversing common defanging
//! conventions.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{AnalysisRecord, Value};
use crate::scheduler::Analyzer;
use crate::Result;

/// Reverse defanging conventions before matching: `[.]`/`{.}`/`\.` →
/// `.`; `hXXp`/`hxxp` → `http` (case-insensitive on the X's); `%2f`/
/// `%2F` → `/`.
pub fn refang(text: &str) -> String {
    static DOT_RE: OnceLock<Regex> = OnceLock::new();
    static HXXP_RE: OnceLock<Regex> = OnceLock::new();
    static SLASH_RE: OnceLock<Regex> = OnceLock::new();

    let dot_re = DOT_RE.get_or_init(|| Regex::new(r"\[\.\]|\{\.\}|\\\.").unwrap());
    let hxxp_re = HXXP_RE.get_or_init(|| Regex::new(r"(?i)h[x]{2}p").unwrap());
    let slash_re = SLASH_RE.get_or_init(|| Regex::new(r"%2[fF]").unwrap());

    let s = dot_re.replace_all(text, ".");
    let s = hxxp_re.replace_all(&s, "http");
    slash_re.replace_all(&s, "/").into_owned()
}

fn ipv4_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap())
}

fn ipv4_cidr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}/\d{1,2}\b").unwrap())
}

fn ipv6_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:[0-9a-fA-F]{1,4}:){2,7}[0-9a-fA-F]{1,4}\b").unwrap())
}

fn uri_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:https?|ftp)://[^\s<>\x22']+").unwrap())
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
    })
}

fn fqdn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,}\b")
            .unwrap()
    })
}

fn md5_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b[a-f0-9]{32}\b").unwrap())
}

fn sha1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b[a-f0-9]{40}\b").unwrap())
}

fn sha256_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b[a-f0-9]{64}\b").unwrap())
}

fn extract_dedup(re: &Regex, text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for m in re.find_iter(text) {
        let key = m.as_str().to_lowercase();
        if seen.insert(key) {
            out.push(m.as_str().to_string());
        }
    }
    out
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorsResult {
    pub ipv4: Vec<String>,
    pub ipv4_cidr: Vec<String>,
    pub ipv6: Vec<String>,
    pub uri: Vec<String>,
    pub email: Vec<String>,
    pub fqdn: Vec<String>,
    pub md5: Vec<String>,
    pub sha1: Vec<String>,
    pub sha256: Vec<String>,
}

pub fn extract_indicators(content: &str) -> IndicatorsResult {
    let text = refang(content);

    // Longer hash lengths must be pulled out before shorter ones would
    // otherwise double-count substrings; matching independently with
    // strict \b boundaries and fixed lengths already prevents overlap,
    // since 32/40/64 hex runs cannot be substrings of one another at
    // word boundaries.
    let cidr = extract_dedup(ipv4_cidr_re(), &text);
    let mut ipv4 = extract_dedup(ipv4_re(), &text);
    // Drop plain IPv4 hits that are actually the network portion of a
    // CIDR block already captured above. Compare against the exact
    // network address, not a raw string prefix, so e.g. "10.0.0.1"
    // isn't dropped just because "10.0.0.10/24" shares a prefix.
    ipv4.retain(|ip| !cidr.iter().any(|c| c.split('/').next() == Some(ip.as_str())));

    IndicatorsResult {
        ipv4,
        ipv4_cidr: cidr,
        ipv6: extract_dedup(ipv6_re(), &text),
        uri: extract_dedup(uri_re(), &text),
        email: extract_dedup(email_re(), &text),
        fqdn: extract_dedup(fqdn_re(), &text),
        md5: extract_dedup(md5_re(), &text),
        sha1: extract_dedup(sha1_re(), &text),
        sha256: extract_dedup(sha256_re(), &text),
    }
}

pub struct IndicatorsAnalyzer;

impl IndicatorsAnalyzer {
    pub fn new() -> Self {
        IndicatorsAnalyzer
    }
}

impl Default for IndicatorsAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for IndicatorsAnalyzer {
    fn name(&self) -> &str {
        "indicators"
    }

    fn version(&self) -> &str {
        "1.0"
    }

    fn dependencies(&self) -> &[String] {
        &[]
    }

    async fn analyze(&self, record: &AnalysisRecord) -> Result<Value> {
        let result = extract_indicators(&record.content);
        Value::from_serializable(&result)
    }
}
