//! Stage A (Submit): decode base64 content, hash, persist to the blob
//! store, enqueue on `docs`, subject to backpressure.

use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::model::{Document, Tlp};
use crate::pipeline::{BlobStore, JobEnvelope, Queue, DOCS_TUBE};
use crate::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    pub content: String,
    pub filename: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub tlp: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default = "default_store")]
    pub store: bool,
}

fn default_store() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub filename: String,
    pub hexdigest: String,
    pub count: usize,
    pub tlp: Tlp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub store: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Strip any directory components from a client-supplied filename,
/// mirroring the original's `os.path.basename(doc.filename)`.
fn sanitize_filename(filename: &str) -> String {
    std::path::Path::new(filename)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unnamed".to_string())
}

/// Run stage A's submit logic: validate, hash, persist, enqueue.
/// Returns the backpressure error when either tube is at or above
/// `max_jobs`, and a validation error for malformed base64/TLP before
/// ever touching the blob store, per §7.
pub async fn submit(
    request: SubmitRequest,
    blob_store: &(dyn BlobStore + Send + Sync),
    queue: &(dyn Queue + Send + Sync),
    max_jobs: usize,
) -> Result<SubmitResponse> {
    let docs_depth = queue.depth(DOCS_TUBE).await?;
    let analyze_depth = queue.depth(crate::pipeline::ANALYZE_TUBE).await?;
    if docs_depth.max(analyze_depth) >= max_jobs {
        return Err(Error::QueueSaturated(format!(
            "too many jobs in queue (docs={docs_depth}, analyze={analyze_depth}, max={max_jobs})"
        )));
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(request.content.as_bytes())
        .map_err(|e| Error::InvalidSubmission(format!("invalid base64 content: {e}")))?;

    let tlp = match &request.tlp {
        Some(raw) => Tlp::parse(raw)
            .ok_or_else(|| Error::InvalidSubmission(format!("invalid tlp: {raw}")))?,
        None => Tlp::default(),
    };

    let filename = sanitize_filename(&request.filename);
    let hexdigest = hex::encode(Sha256::digest(&bytes));

    let document = Document {
        hexdigest: hexdigest.clone(),
        filename: filename.clone(),
        content_type: None,
        uri: request.uri.clone(),
        tlp,
        owner: request.owner.clone(),
        store: request.store,
    };

    blob_store.put(&hexdigest, &bytes).await?;

    let envelope = JobEnvelope::from_document(&document);
    let payload = envelope.encode()?;
    queue.enqueue(DOCS_TUBE, payload).await?;

    tracing::info!(hexdigest = %hexdigest, filename = %filename, "document submitted");

    Ok(SubmitResponse {
        filename,
        hexdigest,
        count: bytes.len(),
        tlp,
        uri: document.uri,
        store: document.store,
        owner: document.owner,
        error: None,
    })
}
