//! Analyzer contracts: one module per plugin in the build-time
//! registry (`scheduler::registry`).

pub mod indicators;
pub mod locations;
pub mod mitre_attack;
pub mod nlp_actors;
pub mod pos_tag;
pub mod sectors;
pub mod threatactor;
pub mod tools;
pub mod vulnerabilities;

pub use indicators::IndicatorsAnalyzer;
pub use locations::LocationsAnalyzer;
pub use mitre_attack::MitreAttackAnalyzer;
pub use nlp_actors::NlpActorsAnalyzer;
pub use pos_tag::PosTagAnalyzer;
pub use sectors::SectorsAnalyzer;
pub use threatactor::ThreatActorAnalyzer;
pub use tools::ToolsAnalyzer;
pub use vulnerabilities::VulnerabilitiesAnalyzer;
