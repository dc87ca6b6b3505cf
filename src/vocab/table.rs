//! `AliasTable`: the loaded, queryable vocabulary.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

use crate::vocab::alias::{parse_aliases, strip_comment};
use crate::vocab::normalize::{normalize, CaseMode, NormalizeOptions};
use crate::vocab::regex_alias::regex_from_alias;
use crate::{Error, Result};

/// Which index to look an entry up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMod {
    Raw,
    Lower,
    Stem,
    Norm,
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub surface: String,
    pub primary: String,
}

/// A loaded vocabulary: four lookup indices plus a compiled regex set
/// for bulk text scanning. Immutable after construction.
pub struct AliasTable {
    raw: HashMap<String, Entry>,
    lower: HashMap<String, Entry>,
    stem: HashMap<String, Entry>,
    norm: HashMap<String, Entry>,
    regexes: Vec<Regex>,
    stemmer: Stemmer,
}

impl AliasTable {
    /// Parse an alias file and build all four indices plus the
    /// `regexfromalias`-derived regex set. `extra_regex` are appended
    /// verbatim (the `regexmanual` config knob).
    pub fn load_file<P: AsRef<Path>>(
        path: P,
        build_regex_from_alias: bool,
        extra_regex: &[String],
    ) -> Result<AliasTable> {
        let contents = fs::read_to_string(path)?;
        Self::load_str(&contents, build_regex_from_alias, extra_regex)
    }

    pub fn load_str(
        contents: &str,
        build_regex_from_alias: bool,
        extra_regex: &[String],
    ) -> Result<AliasTable> {
        let stemmer = Stemmer::create(Algorithm::English);
        let mut table = AliasTable {
            raw: HashMap::new(),
            lower: HashMap::new(),
            stem: HashMap::new(),
            norm: HashMap::new(),
            regexes: Vec::new(),
            stemmer,
        };

        for raw_line in contents.lines() {
            let line = strip_comment(raw_line);
            if line.trim().is_empty() {
                continue;
            }

            let (primary, aliases) = match parse_aliases(&line) {
                Ok(v) => v,
                Err(_) => continue, // malformed line: log and skip, per §4.1
            };

            let mut surfaces = vec![primary.clone()];
            surfaces.extend(aliases.iter().cloned());

            for surface in &surfaces {
                if surface.is_empty() {
                    continue;
                }
                let entry = Entry {
                    surface: surface.clone(),
                    primary: primary.clone(),
                };
                table.raw.insert(surface.clone(), entry.clone());
                table.lower.insert(surface.to_lowercase(), entry.clone());
                table
                    .stem
                    .insert(table.stemmer.stem(surface).into_owned(), entry.clone());
                table
                    .norm
                    .insert(normalize_key(surface), entry);
            }

            if build_regex_from_alias {
                for surface in &surfaces {
                    match regex_from_alias(surface) {
                        Ok(re) => table.regexes.push(re),
                        Err(_) => continue, // all-digit alias: logged and skipped, per §4.1
                    }
                }
            }
        }

        for pattern in extra_regex {
            let trimmed = pattern.trim();
            if trimmed.is_empty() {
                continue;
            }
            let re = Regex::new(&format!("(?i){trimmed}"))?;
            table.regexes.push(re);
        }

        Ok(table)
    }

    fn index_for(&self, key_mod: KeyMod) -> &HashMap<String, Entry> {
        match key_mod {
            KeyMod::Raw => &self.raw,
            KeyMod::Lower => &self.lower,
            KeyMod::Stem => &self.stem,
            KeyMod::Norm => &self.norm,
        }
    }

    fn lookup_key(&self, key: &str, key_mod: KeyMod) -> String {
        match key_mod {
            KeyMod::Raw => key.to_string(),
            KeyMod::Lower => key.to_lowercase(),
            KeyMod::Stem => self.stemmer.stem(key).into_owned(),
            KeyMod::Norm => normalize_key(key),
        }
    }

    /// Dictionary lookup: is `key` a known alias, and what is its
    /// primary name? Returns `default` on miss.
    pub fn get(
        &self,
        key: &str,
        key_mod: KeyMod,
        return_primary: bool,
        default: Option<&str>,
    ) -> Option<String> {
        let lookup_key = self.lookup_key(key, key_mod);
        match self.index_for(key_mod).get(&lookup_key) {
            Some(entry) if return_primary => Some(entry.primary.clone()),
            Some(entry) => Some(entry.surface.clone()),
            None => default.map(|d| d.to_string()),
        }
    }

    /// Bulk-scan `text` against every compiled regex once, returning
    /// hits in match order with duplicates preserved.
    pub fn scan(&self, text: &str) -> Vec<String> {
        let mut results = Vec::new();
        for re in &self.regexes {
            for cap in re.captures_iter(text) {
                if let Some(m) = cap.get(1) {
                    results.push(m.as_str().to_string());
                }
            }
        }
        results
    }

    /// Scan, then normalize each hit with capitalize + the abbreviation
    /// whitelist — the normalization `threatactor`/`tools` apply to
    /// scan results, per §4.4.
    pub fn scan_normalized(&self, text: &str, uppercase_abbr: &[String]) -> Vec<String> {
        let opts = NormalizeOptions {
            case: CaseMode::Capitalize,
            uppercase_abbr: uppercase_abbr.to_vec(),
            ..NormalizeOptions::default()
        };
        self.scan(text)
            .into_iter()
            .map(|hit| normalize(&hit, &opts))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }
}

fn normalize_key(s: &str) -> String {
    normalize(s, &NormalizeOptions::default())
}

impl Clone for Entry {
    fn clone(&self) -> Self {
        Entry {
            surface: self.surface.clone(),
            primary: self.primary.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "APT32: OceanLotus Group, oceanLotusGroup\nAPT28: Fancy Bear # a comment\n";

    #[test]
    fn test_load_and_lookup_lower() {
        let table = AliasTable::load_str(SAMPLE, false, &[]).unwrap();
        assert_eq!(
            table.get("oceanlotusgroup", KeyMod::Lower, true, None),
            Some("APT32".to_string())
        );
    }

    #[test]
    fn test_alias_round_trip_lower_primary() {
        let table = AliasTable::load_str(SAMPLE, false, &[]).unwrap();
        for surface in ["APT32", "OceanLotus Group", "oceanLotusGroup"] {
            assert_eq!(
                table.get(surface, KeyMod::Lower, true, None),
                Some("APT32".to_string()),
                "surface {surface} did not round-trip"
            );
        }
    }

    #[test]
    fn test_get_miss_returns_default() {
        let table = AliasTable::load_str(SAMPLE, false, &[]).unwrap();
        assert_eq!(
            table.get("nonexistent", KeyMod::Lower, true, Some("fallback")),
            Some("fallback".to_string())
        );
    }

    #[test]
    fn test_scan_finds_alias_variants() {
        let table = AliasTable::load_str(SAMPLE, true, &[]).unwrap();
        let hits = table.scan("attributed to oceanLotusGroup in the wild");
        assert!(!hits.is_empty());
    }

    #[test]
    fn test_stem_index() {
        let table = AliasTable::load_str("Organization: Organizations\n", false, &[]).unwrap();
        assert!(table.get("organization", KeyMod::Stem, true, None).is_some());
    }

    #[test]
    fn test_comment_stripped() {
        let table = AliasTable::load_str(SAMPLE, false, &[]).unwrap();
        assert_eq!(
            table.get("fancy bear", KeyMod::Lower, true, None),
            Some("APT28".to_string())
        );
    }
}
