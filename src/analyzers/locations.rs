//! `locations`: depends on `pos_tag`. Reconstruct proper-noun phrases,
//! match against a built-in city/country gazetteer and the country
//! alias vocabulary.
//!
//! The original ships full cities-CSV/countries-JSON data files; this
//! crate embeds a small representative gazetteer instead of bundling
//! non-code data assets, sufficient to exercise the same matching
//! rules end to end.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::analyzers::pos_tag::TaggedToken;
use crate::model::{AnalysisRecord, Value};
use crate::scheduler::Analyzer;
use crate::vocab::AliasTable;
use crate::Result;

struct City {
    name: &'static str,
    country_code: &'static str,
    population: u64,
}

const CITIES: &[City] = &[
    City { name: "London", country_code: "GB", population: 8_982_000 },
    City { name: "Paris", country_code: "FR", population: 2_148_000 },
    City { name: "Moscow", country_code: "RU", population: 12_506_000 },
    City { name: "Beijing", country_code: "CN", population: 21_540_000 },
    City { name: "Pyongyang", country_code: "KP", population: 3_255_000 },
    City { name: "Tehran", country_code: "IR", population: 9_134_000 },
    City { name: "Kyiv", country_code: "UA", population: 2_962_000 },
    // A deliberately duplicated city name to exercise max-population
    // tie-breaking: both the US and Canada have a "London".
    City { name: "London", country_code: "CA", population: 422_000 },
];

const COUNTRIES: &[(&str, &str)] = &[
    ("GB", "United Kingdom"),
    ("FR", "France"),
    ("RU", "Russia"),
    ("CN", "China"),
    ("KP", "North Korea"),
    ("IR", "Iran"),
    ("UA", "Ukraine"),
    ("CA", "Canada"),
    ("CD", "Democratic Republic of the Congo"),
];

const COUNTRY_NAMES: &[&str] = &[
    "United Kingdom",
    "France",
    "Russia",
    "China",
    "North Korea",
    "Iran",
    "Ukraine",
    "Canada",
    "Republic of Congo",
];

fn country_name_for_code(code: &str) -> Option<&'static str> {
    COUNTRIES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// The city with the given (case-insensitive) name that has the
/// highest population, per spec's duplicate-name tie-break rule.
fn lookup_city(name: &str) -> Option<&'static City> {
    CITIES
        .iter()
        .filter(|c| c.name.eq_ignore_ascii_case(name))
        .max_by_key(|c| c.population)
}

fn lookup_country_name(name: &str) -> Option<&'static str> {
    COUNTRY_NAMES
        .iter()
        .find(|c| c.eq_ignore_ascii_case(name))
        .copied()
}

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

/// Reconstruct proper-noun phrases, allowing `IN` ("of") to join two
/// proper-noun runs only when it falls strictly between them.
pub fn proper_noun_phrases(tokens: &[TaggedToken]) -> Vec<String> {
    let mut phrases = Vec::new();
    let mut current: Vec<String> = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        let tag = tokens[i].tag.as_str();
        if tag == "NNP" || tag == "NNPS" {
            current.push(tokens[i].token.clone());
            i += 1;
        } else if tag == "IN" && !current.is_empty() {
            let next_is_proper = tokens
                .get(i + 1)
                .map(|t| t.tag == "NNP" || t.tag == "NNPS")
                .unwrap_or(false);
            if next_is_proper {
                current.push(tokens[i].token.clone());
                i += 1;
            } else {
                phrases.push(current.join(" "));
                current.clear();
                i += 1;
            }
        } else {
            if !current.is_empty() {
                phrases.push(current.join(" "));
                current.clear();
            }
            i += 1;
        }
    }
    if !current.is_empty() {
        phrases.push(current.join(" "));
    }
    phrases
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationsResult {
    pub cities: Vec<String>,
    pub countries: Vec<String>,
    pub countries_inferred: Vec<String>,
    pub countries_alias: Vec<String>,
}

pub fn find_locations(tokens: &[TaggedToken], country_table: &AliasTable, content: &str) -> LocationsResult {
    let phrases = proper_noun_phrases(tokens);

    let mut cities = Vec::new();
    let mut countries = Vec::new();
    let mut countries_inferred = Vec::new();

    for phrase in &phrases {
        if let Some(city) = lookup_city(phrase) {
            if !cities.contains(&city.name.to_string()) {
                cities.push(city.name.to_string());
            }
            if let Some(country) = country_name_for_code(city.country_code) {
                if !countries_inferred.contains(&country.to_string()) {
                    countries_inferred.push(country.to_string());
                }
            }
        }
        if let Some(country) = lookup_country_name(phrase) {
            if !countries.contains(&country.to_string()) {
                countries.push(country.to_string());
            }
        }
    }

    let countries_alias = if country_table.is_empty() {
        Vec::new()
    } else {
        country_table.scan(content)
    };

    LocationsResult {
        cities,
        countries,
        countries_inferred,
        countries_alias,
    }
}

pub struct LocationsAnalyzer {
    country_table: Arc<AliasTable>,
}

impl LocationsAnalyzer {
    pub fn new(country_table: Arc<AliasTable>) -> Self {
        LocationsAnalyzer { country_table }
    }
}

#[async_trait]
impl Analyzer for LocationsAnalyzer {
    fn name(&self) -> &str {
        "locations"
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
                name: "locations".to_string(),
                source: "pos_tag result missing".to_string(),
            })?;
        let tokens = tagged_tokens_from_value(pos_value);
        let result = find_locations(&tokens, &self.country_table, &record.content);
        Value::from_serializable(&result)
    }
}
