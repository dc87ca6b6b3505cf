//! The `Queue` trait: two durable FIFO tubes (`docs`, `analyze`)
//! connecting stages A/B/C, plus an in-memory reference implementation
//! used by tests and standalone mode.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::Result;

/// One reserved job: its tube-local id (needed to `delete` it) and its
/// raw (gzip-compressed JSON) payload.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub id: u64,
    pub payload: Vec<u8>,
}

#[async_trait]
pub trait Queue: Send + Sync {
    async fn enqueue(&self, tube: &str, payload: Vec<u8>) -> Result<()>;

    /// Reserve the oldest undeleted job on `tube`, if any.
    async fn reserve(&self, tube: &str) -> Result<Option<Reservation>>;

    async fn delete(&self, tube: &str, id: u64) -> Result<()>;

    async fn depth(&self, tube: &str) -> Result<usize>;
}

/// An in-process FIFO queue. Not durable across restarts; suitable as
/// the reference implementation for tests and `scio analyze`'s
/// embedded single-process mode.
#[derive(Default)]
pub struct MemoryQueue {
    tubes: Mutex<HashMap<String, VecDeque<(u64, Vec<u8>)>>>,
    next_id: AtomicU64,
}

impl MemoryQueue {
    pub fn new() -> Self {
        MemoryQueue {
            tubes: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl Queue for MemoryQueue {
    async fn enqueue(&self, tube: &str, payload: Vec<u8>) -> Result<()> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut tubes = self.tubes.lock().unwrap();
        tubes.entry(tube.to_string()).or_default().push_back((id, payload));
        Ok(())
    }

    async fn reserve(&self, tube: &str) -> Result<Option<Reservation>> {
        let mut tubes = self.tubes.lock().unwrap();
        let queue = match tubes.get_mut(tube) {
            Some(q) => q,
            None => return Ok(None),
        };
        Ok(queue.front().cloned().map(|(id, payload)| Reservation { id, payload }))
    }

    async fn delete(&self, tube: &str, id: u64) -> Result<()> {
        let mut tubes = self.tubes.lock().unwrap();
        if let Some(queue) = tubes.get_mut(tube) {
            queue.retain(|(job_id, _)| *job_id != id);
        }
        Ok(())
    }

    async fn depth(&self, tube: &str) -> Result<usize> {
        let tubes = self.tubes.lock().unwrap();
        Ok(tubes.get(tube).map(|q| q.len()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = MemoryQueue::new();
        queue.enqueue("docs", b"first".to_vec()).await.unwrap();
        queue.enqueue("docs", b"second".to_vec()).await.unwrap();

        let first = queue.reserve("docs").await.unwrap().unwrap();
        assert_eq!(first.payload, b"first");
        queue.delete("docs", first.id).await.unwrap();

        let second = queue.reserve("docs").await.unwrap().unwrap();
        assert_eq!(second.payload, b"second");
    }

    #[tokio::test]
    async fn test_depth_tracks_undeleted_jobs() {
        let queue = MemoryQueue::new();
        assert_eq!(queue.depth("docs").await.unwrap(), 0);
        queue.enqueue("docs", b"x".to_vec()).await.unwrap();
        assert_eq!(queue.depth("docs").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reserve_empty_tube_returns_none() {
        let queue = MemoryQueue::new();
        assert!(queue.reserve("docs").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_one_job() {
        let queue = MemoryQueue::new();
        queue.enqueue("docs", b"a".to_vec()).await.unwrap();
        queue.enqueue("docs", b"b".to_vec()).await.unwrap();
        let reservation = queue.reserve("docs").await.unwrap().unwrap();
        queue.delete("docs", reservation.id).await.unwrap();
        assert_eq!(queue.depth("docs").await.unwrap(), 1);
    }
}
