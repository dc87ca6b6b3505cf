//! Vocabulary Engine: alias parsing, normalization, alias→regex
//! compilation, and the `AliasTable` lookup/scan contract.

pub mod alias;
pub mod normalize;
pub mod regex_alias;
pub mod table;

pub use alias::parse_aliases;
pub use normalize::{normalize, CaseMode, NormalizeOptions};
pub use regex_alias::regex_from_alias;
pub use table::{AliasTable, Entry, KeyMod};
