//! Local-disk photo storage.
//!
//! Photos are written under `UPLOAD_DIR` at their storage key and served
//! back under `/files/{key}`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use campus_core::mutation::PhotoUpload;
use campus_core::store::{sanitize_file_name, PhotoStore, StoreError, StoredPhoto};

/// URL prefix the upload directory is mounted at.
pub const FILES_PREFIX: &str = "/files";

/// Deepest key accepted, in path segments.
const MAX_KEY_DEPTH: usize = 4;

pub struct LocalPhotoStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalPhotoStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}{FILES_PREFIX}/{key}", self.public_base_url)
    }

    /// Map a storage key to a path under the root.
    ///
    /// Every segment must already be a sanitized file name, so a key can
    /// never escape the upload directory.
    pub fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        let segments: Vec<&str> = key.split('/').collect();
        if segments.len() > MAX_KEY_DEPTH {
            return Err(StoreError::Invalid(format!(
                "Storage key is nested too deeply: {key}"
            )));
        }
        let mut path = self.root.clone();
        for segment in segments {
            if segment.is_empty() || sanitize_file_name(segment) != segment {
                return Err(StoreError::Invalid(format!("Invalid storage key: {key}")));
            }
            path.push(segment);
        }
        Ok(path)
    }

    /// Write `bytes` at `key`, replacing any existing file.
    pub async fn save(&self, key: &str, bytes: &[u8]) -> Result<StoredPhoto, StoreError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Unavailable(format!("Failed to create {parent:?}: {e}")))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to write {path:?}: {e}")))?;

        tracing::info!(key, size = bytes.len(), "Photo stored");
        Ok(StoredPhoto {
            key: key.to_string(),
            url: self.url_for(key),
        })
    }
}

#[async_trait]
impl PhotoStore for LocalPhotoStore {
    async fn upload(&self, key: &str, photo: &PhotoUpload) -> Result<String, StoreError> {
        if let Some(content_type) = &photo.content_type {
            if !content_type.starts_with("image/") {
                return Err(StoreError::Invalid(format!(
                    "Only image uploads are accepted (got {content_type})"
                )));
            }
        }
        if photo.bytes.is_empty() {
            return Err(StoreError::Invalid("Uploaded file is empty".into()));
        }
        Ok(self.save(key, &photo.bytes).await?.url)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn store(dir: &Path) -> LocalPhotoStore {
        LocalPhotoStore::new(dir, "http://files.test/")
    }

    #[test]
    fn keys_cannot_escape_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        assert_eq!(
            s.resolve("issues/1_0_a.jpg").unwrap(),
            dir.path().join("issues").join("1_0_a.jpg")
        );
        assert_matches!(s.resolve("../secret"), Err(StoreError::Invalid(_)));
        assert_matches!(s.resolve("/etc/passwd"), Err(StoreError::Invalid(_)));
        assert_matches!(s.resolve("issues//a.jpg"), Err(StoreError::Invalid(_)));
        assert_matches!(s.resolve("a/b/c/d/e.jpg"), Err(StoreError::Invalid(_)));
    }

    #[tokio::test]
    async fn upload_writes_file_and_returns_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        let photo = PhotoUpload {
            file_name: "leak.jpg".into(),
            content_type: Some("image/jpeg".into()),
            bytes: vec![0xFF, 0xD8, 0xFF],
        };

        let url = s.upload("issues/1_0_leak.jpg", &photo).await.unwrap();

        assert_eq!(url, "http://files.test/files/issues/1_0_leak.jpg");
        let written = std::fs::read(dir.path().join("issues/1_0_leak.jpg")).unwrap();
        assert_eq!(written, vec![0xFF, 0xD8, 0xFF]);
    }

    #[tokio::test]
    async fn non_images_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let photo = PhotoUpload {
            file_name: "notes.txt".into(),
            content_type: Some("text/plain".into()),
            bytes: b"hello".to_vec(),
        };
        let result = store(dir.path()).upload("issues/1_0_notes.txt", &photo).await;
        assert_matches!(result, Err(StoreError::Invalid(_)));
    }
}
