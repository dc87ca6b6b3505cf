//! Pipeline Control Plane: three stages (submit, extract, analyze)
//! connected by two durable work queues (`docs`, `analyze`), plus the
//! external-collaborator traits (`Queue`, `BlobStore`, `Extractor`,
//! `Sink`, `IndexClient`) each stage is built against.

pub mod blob;
pub mod envelope;
pub mod extractor;
pub mod index;
pub mod queue;
pub mod sink;
pub mod stage_a;
pub mod stage_b;
pub mod stage_c;

pub use blob::{BlobStore, FsBlobStore};
pub use envelope::JobEnvelope;
pub use extractor::{Extractor, HttpExtractor, PlainTextExtractor};
pub use index::{HttpIndexClient, IndexClient};
pub use queue::{MemoryQueue, Queue, Reservation};
pub use sink::{HttpSink, Sink};
pub use stage_a::{submit, SubmitRequest, SubmitResponse};
pub use stage_b::run_extract_worker;
pub use stage_c::{analyze_one, run_analyze_worker};

pub const DOCS_TUBE: &str = "docs";
pub const ANALYZE_TUBE: &str = "analyze";
