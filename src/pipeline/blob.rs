//! The `BlobStore` trait: the content-addressed store keyed by
//! `hexdigest`, plus a filesystem-backed reference implementation.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::Result;

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, hexdigest: &str, bytes: &[u8]) -> Result<()>;

    async fn get(&self, hexdigest: &str) -> Result<Option<Vec<u8>>>;

    async fn exists(&self, hexdigest: &str) -> Result<bool>;
}

/// Stores each blob as a flat file named by its hexdigest under a root
/// directory, created on first write.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: PathBuf) -> Self {
        FsBlobStore { root }
    }

    fn path_for(&self, hexdigest: &str) -> PathBuf {
        self.root.join(hexdigest)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, hexdigest: &str, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.path_for(hexdigest), bytes).await?;
        Ok(())
    }

    async fn get(&self, hexdigest: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path_for(hexdigest)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, hexdigest: &str) -> Result<bool> {
        Ok(tokio::fs::metadata(self.path_for(hexdigest)).await.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().to_path_buf());
        store.put("abc123", b"hello").await.unwrap();
        let bytes = store.get("abc123").await.unwrap();
        assert_eq!(bytes, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().to_path_buf());
        assert_eq!(store.get("nonexistent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_exists_reflects_put() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().to_path_buf());
        assert!(!store.exists("abc123").await.unwrap());
        store.put("abc123", b"hello").await.unwrap();
        assert!(store.exists("abc123").await.unwrap());
    }

    #[tokio::test]
    async fn test_scenario_s5_same_bytes_same_blob() {
        use sha2::{Digest, Sha256};
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().to_path_buf());

        let bytes = b"hello";
        let hexdigest = hex::encode(Sha256::digest(bytes));
        store.put(&hexdigest, bytes).await.unwrap();
        store.put(&hexdigest, bytes).await.unwrap();

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut count = 0;
        while entries.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 1);
    }
}
