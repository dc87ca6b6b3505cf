//! `pos_tag`: tokenize `content` and tag each token with a Penn
//! Treebank-style part-of-speech tag. No dependencies.
//!
//! This is a small rule-based/lexicon tagger — a from-scratch
//! equivalent of the original's call into an external POS tagger, not
//! an attempt to embed a full statistical model. It covers exactly
//! the tag set `sectors`/`locations`/`nlp_actors` rely on: `NNP`,
//! `NNPS`, `NN`, `NNS`, `CC`, `IN`, `DT`, `,`, `:`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{AnalysisRecord, Value};
use crate::scheduler::Analyzer;
use crate::Result;

const COORDINATING_CONJUNCTIONS: &[&str] = &["and", "or", "but", "nor", "yet", "so"];

const PREPOSITIONS: &[&str] = &[
    "of", "in", "on", "at", "by", "for", "with", "about", "against", "between", "into",
    "through", "during", "before", "after", "above", "below", "to", "from", "up", "down",
    "over", "under", "since", "as",
];

const DETERMINERS: &[&str] = &["the", "a", "an", "this", "that", "these", "those"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    pub token: String,
    pub tag: String,
}

/// Split `text` into words and standalone punctuation tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if c.is_alphanumeric() || c == '\'' || c == '-' {
            current.push(c);
        } else {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            if !c.is_whitespace() {
                tokens.push(c.to_string());
            }
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn tag_token(token: &str) -> &'static str {
    if token == "," {
        return ",";
    }
    if token == ":" {
        return ":";
    }
    if token.chars().all(|c| !c.is_alphanumeric()) {
        return ".";
    }

    let lower = token.to_lowercase();
    if COORDINATING_CONJUNCTIONS.contains(&lower.as_str()) {
        return "CC";
    }
    if DETERMINERS.contains(&lower.as_str()) {
        return "DT";
    }
    if PREPOSITIONS.contains(&lower.as_str()) {
        return "IN";
    }

    let starts_upper = token.chars().next().is_some_and(|c| c.is_uppercase());
    let ends_plural = token.len() > 1 && token.ends_with('s') && !token.ends_with("'s");

    match (starts_upper, ends_plural) {
        (true, true) => "NNPS",
        (true, false) => "NNP",
        (false, true) => "NNS",
        (false, false) => "NN",
    }
}

pub fn pos_tag(text: &str) -> Vec<TaggedToken> {
    tokenize(text)
        .into_iter()
        .map(|token| {
            let tag = tag_token(&token).to_string();
            TaggedToken { token, tag }
        })
        .collect()
}

pub struct PosTagAnalyzer;

impl PosTagAnalyzer {
    pub fn new() -> Self {
        PosTagAnalyzer
    }
}

impl Default for PosTagAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for PosTagAnalyzer {
    fn name(&self) -> &str {
        "pos_tag"
    }

    fn version(&self) -> &str {
        "1.0"
    }

    fn dependencies(&self) -> &[String] {
        &[]
    }

    async fn analyze(&self, record: &AnalysisRecord) -> Result<Value> {
        let tagged = pos_tag(&record.content);
        Value::from_serializable(&tagged)
    }
}
