//! SCIO: a document-ingest and enrichment pipeline for cyber-threat-
//! intelligence reports.
//!
//! Documents enter through an HTTP submit endpoint, are persisted to a
//! content-addressed blob store, text-extracted, then run through a
//! plugin DAG of independent analyzers that extract structured threat
//! data (indicators, vulnerabilities, ATT&CK IDs, threat-actor
//! aliases, tools, sectors, locations). Results are aggregated into
//! one [`model::AnalysisRecord`] and indexed and/or posted to a sink.

pub mod analyzers;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod pipeline;
pub mod scheduler;
pub mod vocab;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{AnalysisRecord, Document, Tlp, Value};
pub use scheduler::Analyzer;
