//! `sectors`: depends on `pos_tag`. Walk tagged tokens; whenever a
//! noun whose Porter stem is a sector trigger word is found, walk
//! backward collecting proper nouns as sector candidates, then map
//! each candidate via the sector vocabulary.

use std::sync::Arc;

use async_trait::async_trait;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};

use crate::analyzers::pos_tag::TaggedToken;
use crate::model::{AnalysisRecord, Value};
use crate::scheduler::Analyzer;
use crate::vocab::{AliasTable, KeyMod};
use crate::Result;

const TRIGGER_STEMS: &[&str] = &["compani", "industri", "sector", "servic", "organ", "provid"];

const BACKWARD_TAGS: &[&str] = &["NNP", "NNPS", "NN", "NNS", ",", ":", "CC"];
const PROPER_NOUN_TAGS: &[&str] = &["NNP", "NNPS"];

fn tagged_tokens_from_value(value: &Value) -> Vec<TaggedToken> {
    let Value::List(items) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let Value::Map(map) = item else {
                return None;
            };
            let token = map.get("token")?.as_str()?.to_string();
            let tag = map.get("tag")?.as_str()?.to_string();
            Some(TaggedToken { token, tag })
        })
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectorsResult {
    pub sectors: Vec<String>,
}

pub fn find_sectors(tokens: &[TaggedToken], table: &AliasTable) -> Vec<String> {
    let stemmer = Stemmer::create(Algorithm::English);
    let mut found = Vec::new();

    for (i, tagged) in tokens.iter().enumerate() {
        let is_noun = tagged.tag == "NN" || tagged.tag == "NNS";
        if !is_noun {
            continue;
        }
        let stem = stemmer.stem(&tagged.token.to_lowercase()).into_owned();
        if !TRIGGER_STEMS.contains(&stem.as_str()) {
            continue;
        }

        let mut candidates = Vec::new();
        let mut j = i;
        while j > 0 {
            j -= 1;
            let prior = &tokens[j];
            if !BACKWARD_TAGS.contains(&prior.tag.as_str()) {
                break;
            }
            if PROPER_NOUN_TAGS.contains(&prior.tag.as_str()) {
                candidates.push(prior.token.clone());
            }
        }
        candidates.reverse();

        for candidate in candidates {
            if let Some(primary) = table.get(&candidate, KeyMod::Stem, true, None) {
                if !found.contains(&primary) {
                    found.push(primary);
                }
            }
        }
    }

    found
}

pub struct SectorsAnalyzer {
    table: Arc<AliasTable>,
}

impl SectorsAnalyzer {
    pub fn new(table: Arc<AliasTable>) -> Self {
        SectorsAnalyzer { table }
    }
}

#[async_trait]
impl Analyzer for SectorsAnalyzer {
    fn name(&self) -> &str {
        "sectors"
    }

    fn version(&self) -> &str {
        "1.0"
    }

    fn dependencies(&self) -> &[String] {
        static DEPS: std::sync::OnceLock<Vec<String>> = std::sync::OnceLock::new();
        DEPS.get_or_init(|| vec!["pos_tag".to_string()])
    }

    async fn analyze(&self, record: &AnalysisRecord) -> Result<Value> {
        let pos_value = record
            .results
            .get("pos_tag")
            .ok_or_else(|| crate::Error::AnalyzerFailed {
                name: "sectors".to_string(),
                source: "pos_tag result missing".to_string(),
            })?;
        let tokens = tagged_tokens_from_value(pos_value);
        let sectors = find_sectors(&tokens, &self.table);
        Value::from_serializable(&SectorsResult { sectors })
    }
}
