//! `nlp_actors`: depends on `pos_tag`. Two-stage scan for a "threat
//! word" followed by a "group word", then walk backward to collect
//! the proper-noun phrase naming the actor.

use async_trait::async_trait;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};

use crate::analyzers::pos_tag::TaggedToken;
use crate::model::{AnalysisRecord, Value};
use crate::scheduler::Analyzer;
use crate::Result;

const THREAT_STEMS: &[&str] = &[
    "threat", "crimin", "crime", "espionage", "hack", "hacker", "crack", "cracker", "adversari",
    "terrorist",
];

const GROUP_STEMS: &[&str] = &["group", "actor", "unit", "agent", "organ"];

const INTERVENING_TAGS: &[&str] = &["NN", "NNS", "NNP", "NNPS", "CC", "DT", "IN"];

const FALSE_POSITIVES: &[&str] = &["top", "unknown", "cyber"];

/// Maximum number of tokens allowed between a threat word and its
/// paired group word.
const MAX_GAP: usize = 5;

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
pub struct NlpActorsResult {
    pub actors: Vec<String>,
}

pub fn find_nlp_actors(tokens: &[TaggedToken]) -> Vec<String> {
    let stemmer = Stemmer::create(Algorithm::English);
    let stem_of = |t: &str| stemmer.stem(&t.to_lowercase()).into_owned();

    let mut found = Vec::new();

    for i in 0..tokens.len() {
        let stem = stem_of(&tokens[i].token);
        if !THREAT_STEMS.contains(&stem.as_str()) {
            continue;
        }

        let mut group_word_index = None;
        for j in (i + 1)..tokens.len().min(i + 1 + MAX_GAP) {
            let candidate_stem = stem_of(&tokens[j].token);
            if GROUP_STEMS.contains(&candidate_stem.as_str()) {
                group_word_index = Some(j);
                break;
            }
            if !INTERVENING_TAGS.contains(&tokens[j].tag.as_str()) {
                break;
            }
        }

        let Some(_group_idx) = group_word_index else {
            continue;
        };

        // Walk backward from the threat word collecting a proper-noun
        // phrase, allowing ',' and CC as separators within the phrase.
        let mut candidates = Vec::new();
        let mut k = i;
        while k > 0 {
            k -= 1;
            let tag = tokens[k].tag.as_str();
            if tag == "NNP" || tag == "NNPS" {
                candidates.push(tokens[k].token.clone());
            } else if tag == "," || tag == "CC" {
                continue;
            } else {
                break;
            }
        }
        candidates.reverse();

        for candidate in candidates {
            let lower = candidate.to_lowercase();
            if FALSE_POSITIVES.contains(&lower.as_str()) {
                continue;
            }
            if !candidate.chars().next().is_some_and(|c| c.is_uppercase()) {
                continue;
            }
            if !found.contains(&candidate) {
                found.push(candidate);
            }
        }
    }

    found
}

pub struct NlpActorsAnalyzer;

impl NlpActorsAnalyzer {
    pub fn new() -> Self {
        NlpActorsAnalyzer
    }
}

impl Default for NlpActorsAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for NlpActorsAnalyzer {
    fn name(&self) -> &str {
        "nlp_actors"
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
                name: "nlp_actors".to_string(),
                source: "pos_tag result missing".to_string(),
            })?;
        let tokens = tagged_tokens_from_value(pos_value);
        let actors = find_nlp_actors(&tokens);
        Value::from_serializable(&NlpActorsResult { actors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::pos_tag::pos_tag;
    use crate::model::{AnalysisRecord, Document, Tlp};

    fn blank_record(content: &str) -> AnalysisRecord {
        let mut record = AnalysisRecord::new(Document {
            hexdigest: "x".to_string(),
            filename: "r.txt".to_string(),
            content_type: None,
            uri: None,
            tlp: Tlp::Amber,
            owner: None,
            store: false,
        });
        record.content = content.to_string();
        record
    }

    #[test]
    fn test_finds_actor_before_threat_group_pair() {
        let tokens = pos_tag("Fancy Bear is a threat group operating since 2014.");
        let actors = find_nlp_actors(&tokens);
        assert!(actors.contains(&"Fancy".to_string()) || actors.contains(&"Bear".to_string()));
    }

    #[test]
    fn test_false_positive_filtered_out() {
        let tokens = pos_tag("Unknown threat actors were involved.");
        let actors = find_nlp_actors(&tokens);
        assert!(!actors.iter().any(|a| a.eq_ignore_ascii_case("unknown")));
    }

    #[test]
    fn test_lowercase_candidate_rejected() {
        let tokens = pos_tag("a known threat group acted alone.");
        let actors = find_nlp_actors(&tokens);
        assert!(actors.is_empty());
    }

    #[tokio::test]
    async fn test_missing_pos_tag_dependency_fails() {
        let analyzer = NlpActorsAnalyzer::new();
        let record = blank_record("no tags available");
        assert!(analyzer.analyze(&record).await.is_err());
    }

    #[tokio::test]
    async fn test_analyzer_returns_actors_key() {
        let analyzer = NlpActorsAnalyzer::new();
        let content = "Fancy Bear is a threat group operating since 2014.";
        let mut record = blank_record(content);
        let tagged = pos_tag(content);
        record.set_result("pos_tag", Value::from_serializable(&tagged).unwrap());

        let result = analyzer.analyze(&record).await.unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("actors").is_some());
    }
}
