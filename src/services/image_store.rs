use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::{AppError, Result};

/// Disk-backed store for uploaded product images. Stored references are
/// bare filenames, opaque to everything but this store and the static
/// file mount.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Stores the payload under `<epoch-millis>-<sanitized original name>`
    /// and returns that filename. Same-millisecond collisions on the same
    /// name get a numeric infix.
    pub async fn save(&self, original_name: &str, data: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.root).await?;

        let clean = sanitize_filename(original_name);
        let stamp = Utc::now().timestamp_millis();

        let mut stored = format!("{}-{}", stamp, clean);
        let mut attempt = 1u32;
        while tokio::fs::try_exists(self.root.join(&stored)).await? {
            stored = format!("{}-{}-{}", stamp, attempt, clean);
            attempt += 1;
        }

        tokio::fs::write(self.root.join(&stored), data).await?;

        Ok(stored)
    }

    /// Removes a previously stored file. References are opaque filenames,
    /// never paths; anything path-shaped is refused.
    pub async fn remove(&self, stored: &str) -> Result<()> {
        if stored.is_empty() || stored.contains('/') || stored.contains('\\') {
            return Err(AppError::BadRequest("Invalid image reference".to_string()));
        }

        tokio::fs::remove_file(self.root.join(stored)).await?;

        Ok(())
    }
}

/// Reduces a client-supplied filename to its final path component with a
/// conservative character set.
fn sanitize_filename(original: &str) -> String {
    let base = Path::new(original)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("");

    let clean: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if clean.trim_matches(|c| c == '_' || c == '.').is_empty() {
        "upload".to_string()
    } else {
        clean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_writes_file_and_returns_reference() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let stored = store.save("photo.png", b"fake image bytes").await.unwrap();

        assert!(stored.ends_with("photo.png"));
        assert!(!stored.contains('/'));

        let on_disk = tokio::fs::read(dir.path().join(&stored)).await.unwrap();
        assert_eq!(on_disk, b"fake image bytes");
    }

    #[tokio::test]
    async fn same_original_name_yields_distinct_references() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let first = store.save("photo.png", b"one").await.unwrap();
        let second = store.save("photo.png", b"two").await.unwrap();

        assert_ne!(first, second);
        assert!(tokio::fs::try_exists(dir.path().join(&first)).await.unwrap());
        assert!(tokio::fs::try_exists(dir.path().join(&second)).await.unwrap());
    }

    #[tokio::test]
    async fn traversal_shaped_names_are_flattened() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let stored = store.save("../../etc/passwd", b"data").await.unwrap();

        assert!(stored.ends_with("passwd"));
        assert!(!stored.contains('/'));
        assert!(tokio::fs::try_exists(dir.path().join(&stored)).await.unwrap());
    }

    #[tokio::test]
    async fn empty_names_fall_back_to_a_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let stored = store.save("..", b"data").await.unwrap();

        assert!(stored.ends_with("-upload"));
    }

    #[tokio::test]
    async fn remove_deletes_the_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let stored = store.save("photo.png", b"bytes").await.unwrap();
        store.remove(&stored).await.unwrap();

        assert!(!tokio::fs::try_exists(dir.path().join(&stored)).await.unwrap());
    }

    #[tokio::test]
    async fn remove_refuses_path_shaped_references() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let err = store.remove("../somewhere/else").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
