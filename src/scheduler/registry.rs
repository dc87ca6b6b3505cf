//! Build-time analyzer registry, replacing dynamic plugin loading per
//! Design Notes §9: a fixed list of constructors, each producing a
//! validated `Arc<dyn Analyzer>`.

use std::sync::Arc;

use crate::analyzers;
use crate::config::Config;
use crate::scheduler::analyzer::Analyzer;
use crate::vocab::AliasTable;
use crate::Result;

/// Construct every built-in analyzer using vocabularies and config
/// loaded once at startup. Vocabulary-backed analyzers receive their
/// `AliasTable` pre-loaded, per Design Notes §9's "explicit immutable
/// config object" resolution.
pub fn built_in_analyzers(
    config: &Config,
    threatactor_table: Arc<AliasTable>,
    tools_table: Arc<AliasTable>,
    sector_table: Arc<AliasTable>,
    country_table: Arc<AliasTable>,
) -> Vec<Arc<dyn Analyzer>> {
    vec![
        Arc::new(analyzers::pos_tag::PosTagAnalyzer::new()),
        Arc::new(analyzers::indicators::IndicatorsAnalyzer::new()),
        Arc::new(analyzers::vulnerabilities::VulnerabilitiesAnalyzer::new()),
        Arc::new(analyzers::mitre_attack::MitreAttackAnalyzer::new()),
        Arc::new(analyzers::threatactor::ThreatActorAnalyzer::new(
            threatactor_table,
            config.uppercase_abbreviations.clone(),
        )),
        Arc::new(analyzers::tools::ToolsAnalyzer::new(tools_table)),
        Arc::new(analyzers::sectors::SectorsAnalyzer::new(sector_table)),
        Arc::new(analyzers::locations::LocationsAnalyzer::new(country_table)),
        Arc::new(analyzers::nlp_actors::NlpActorsAnalyzer::new()),
    ]
}

/// Validate that a caller-supplied analyzer list has no duplicate
/// names and no dependency on an unknown analyzer name, per §4.2
/// "each loaded analyzer is validated to have all required fields
/// before admission."
pub fn validate(analyzers: &[Arc<dyn Analyzer>]) -> Result<()> {
    use std::collections::HashSet;

    let names: HashSet<&str> = analyzers.iter().map(|a| a.name()).collect();
    if names.len() != analyzers.len() {
        return Err(crate::Error::Configuration(
            "duplicate analyzer name in registry".to_string(),
        ));
    }

    for analyzer in analyzers {
        for dep in analyzer.dependencies() {
            if !names.contains(dep.as_str()) {
                return Err(crate::Error::Configuration(format!(
                    "analyzer '{}' depends on unknown analyzer '{}'",
                    analyzer.name(),
                    dep
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::analyzer::test_support::StubAnalyzer;

    #[test]
    fn test_validate_rejects_unknown_dependency() {
        let analyzers: Vec<Arc<dyn Analyzer>> =
            vec![Arc::new(StubAnalyzer::new("sectors", &["pos_tag"]))];
        assert!(validate(&analyzers).is_err());
    }

    #[test]
    fn test_validate_accepts_satisfied_graph() {
        let analyzers: Vec<Arc<dyn Analyzer>> = vec![
            Arc::new(StubAnalyzer::new("pos_tag", &[])),
            Arc::new(StubAnalyzer::new("sectors", &["pos_tag"])),
        ];
        assert!(validate(&analyzers).is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let analyzers: Vec<Arc<dyn Analyzer>> = vec![
            Arc::new(StubAnalyzer::new("pos_tag", &[])),
            Arc::new(StubAnalyzer::new("pos_tag", &[])),
        ];
        assert!(validate(&analyzers).is_err());
    }
}
