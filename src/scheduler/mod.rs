//! Plugin DAG Scheduler: the `Analyzer` contract and wave-based
//! concurrent execution engine.

pub mod analyzer;
pub mod engine;
pub mod registry;

pub use analyzer::Analyzer;
pub use engine::run;
