//! Stage B (Extract): reserve from `docs`, load the blob, hand it to
//! the extractor, merge `(text, metadata)` into the envelope, enqueue
//! on `analyze`. At-least-once-but-delete-on-failure, per §4.3/§7:
//! whatever goes wrong, the job is deleted and the worker continues.

use std::sync::Arc;

use crate::pipeline::{BlobStore, Extractor, JobEnvelope, Queue, ANALYZE_TUBE, DOCS_TUBE};

/// Reserve and process exactly one job from `docs`, if any is
/// waiting. Returns `true` if a job was reserved (regardless of
/// whether it succeeded), so callers can distinguish "idle" from
/// "did work" without the loop spinning a busy-wait on an empty tube.
pub async fn process_one(
    queue: &(dyn Queue + Send + Sync),
    blob_store: &(dyn BlobStore + Send + Sync),
    extractor: &(dyn Extractor + Send + Sync),
) -> bool {
    let reservation = match queue.reserve(DOCS_TUBE).await {
        Ok(Some(r)) => r,
        Ok(None) => return false,
        Err(err) => {
            tracing::error!(error = %err, "stage B: failed to reserve from docs");
            return false;
        }
    };

    let envelope = match JobEnvelope::decode(&reservation.payload) {
        Ok(e) => e,
        Err(err) => {
            tracing::warn!(error = %err, "stage B: corrupt job, deleting");
            let _ = queue.delete(DOCS_TUBE, reservation.id).await;
            return true;
        }
    };

    let result = extract_and_merge(envelope, blob_store, extractor).await;

    // Deleted unconditionally: at-least-once delivery plus
    // delete-on-failure, per the Open Question resolved in Design
    // Notes §9 — no retry tube.
    if let Err(err) = queue.delete(DOCS_TUBE, reservation.id).await {
        tracing::error!(error = %err, "stage B: failed to delete job from docs");
    }

    match result {
        Ok(merged) => match merged.encode() {
            Ok(payload) => {
                if let Err(err) = queue.enqueue(ANALYZE_TUBE, payload).await {
                    tracing::error!(error = %err, "stage B: failed to enqueue onto analyze");
                }
            }
            Err(err) => tracing::error!(error = %err, "stage B: failed to encode envelope"),
        },
        Err(err) => {
            tracing::warn!(hexdigest = %err.0, error = %err.1, "stage B: extraction failed");
        }
    }

    true
}

async fn extract_and_merge(
    mut envelope: JobEnvelope,
    blob_store: &(dyn BlobStore + Send + Sync),
    extractor: &(dyn Extractor + Send + Sync),
) -> Result<JobEnvelope, (String, String)> {
    let bytes = blob_store
        .get(&envelope.hexdigest)
        .await
        .map_err(|e| (envelope.hexdigest.clone(), e.to_string()))?
        .ok_or_else(|| (envelope.hexdigest.clone(), "blob not found".to_string()))?;

    let (text, metadata) = extractor
        .extract(&bytes, envelope.content_type.as_deref())
        .await
        .map_err(|e| (envelope.hexdigest.clone(), e.to_string()))?;

    if let Some(content_type) = metadata.get("Content-Type").and_then(|v| v.as_str()) {
        envelope.content_type = Some(content_type.to_string());
    }
    envelope.metadata = metadata;
    envelope.content = Some(text);

    Ok(envelope)
}

/// Run stage B's worker loop indefinitely: reserve -> process ->
/// delete, backing off briefly when `docs` is empty so the loop
/// doesn't spin.
pub async fn run_extract_worker(
    queue: Arc<dyn Queue + Send + Sync>,
    blob_store: Arc<dyn BlobStore + Send + Sync>,
    extractor: Arc<dyn Extractor + Send + Sync>,
) {
    loop {
        let did_work = process_one(queue.as_ref(), blob_store.as_ref(), extractor.as_ref()).await;
        if !did_work {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        }
    }
}
