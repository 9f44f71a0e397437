//! Content-addressed local storage for migrated assets.
//!
//! Local identity is a pure function of the reference URL string (not of the
//! fetched bytes): SHA-256 of the URL, truncated, plus an extension derived
//! from the URL path. The same reference therefore always maps to the same
//! filename across runs, which is what makes re-running the pipeline
//! idempotent — an interrupted migration resumes by skipping every asset
//! whose file already exists.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

use assetporter_shared::{AssetPorterError, Result};

/// Hex chars of the URL digest kept in the filename.
const DIGEST_LEN: usize = 16;

/// Extension used when the URL path has none.
const DEFAULT_EXTENSION: &str = "jpg";

/// A flat directory of locally stored assets, addressed by reference URL.
#[derive(Debug, Clone)]
pub struct AssetStore {
    /// Filesystem directory assets are written into.
    root: PathBuf,
    /// Root-relative prefix used in rewritten records (`/images`).
    public_prefix: String,
}

impl AssetStore {
    /// Create a store rooted at `root`. The directory itself is created
    /// lazily on first persist.
    ///
    /// The public prefix embedded in rewritten records is derived from the
    /// root's final path component (`out/images` → `/images/<file>`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let dir_name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "images".to_string());

        Self {
            public_prefix: format!("/{dir_name}"),
            root,
        }
    }

    /// The filesystem directory this store writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic local filename for a reference URL.
    ///
    /// Pure and stable across process runs: truncated SHA-256 of the URL
    /// string plus an extension taken from the URL path (default `jpg`).
    pub fn local_identity(reference: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(reference.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        format!("{}.{}", &digest[..DIGEST_LEN], extension_for(reference))
    }

    /// The root-relative logical path embedded in rewritten records.
    pub fn local_path(&self, filename: &str) -> String {
        format!("{}/{filename}", self.public_prefix)
    }

    /// Whether an asset with this filename already exists locally.
    pub fn contains(&self, filename: &str) -> bool {
        self.root.join(filename).is_file()
    }

    /// Write fetched bytes under `filename` and return the logical local path.
    pub fn persist(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        std::fs::create_dir_all(&self.root).map_err(|e| AssetPorterError::io(&self.root, e))?;

        let path = self.root.join(filename);
        std::fs::write(&path, bytes).map_err(|e| AssetPorterError::io(&path, e))?;

        debug!(path = %path.display(), len = bytes.len(), "asset persisted");
        Ok(self.local_path(filename))
    }
}

/// Derive a filename extension from the URL's path component.
///
/// Kept only when it looks like a real extension (ascii alphanumeric,
/// at most 5 chars); query strings and fragments never leak in because
/// only the parsed path is inspected.
fn extension_for(reference: &str) -> String {
    let ext = Url::parse(reference).ok().and_then(|url| {
        let path = url.path();
        let last_segment = path.rsplit('/').next()?;
        let (_, ext) = last_segment.rsplit_once('.')?;
        if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            Some(ext.to_ascii_lowercase())
        } else {
            None
        }
    });

    ext.unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_store() -> (AssetStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("ap-store-test-{}", Uuid::now_v7()));
        (AssetStore::new(dir.join("images")), dir)
    }

    #[test]
    fn identity_is_deterministic() {
        let a = AssetStore::local_identity("http://x/a.png");
        let b = AssetStore::local_identity("http://x/a.png");
        assert_eq!(a, b);
    }

    #[test]
    fn identity_differs_per_reference() {
        let a = AssetStore::local_identity("http://x/a.png");
        let b = AssetStore::local_identity("http://x/b.png");
        assert_ne!(a, b);
    }

    #[test]
    fn identity_shape() {
        let filename = AssetStore::local_identity("http://x/photo.PNG");
        let (stem, ext) = filename.rsplit_once('.').expect("has extension");
        assert_eq!(stem.len(), DIGEST_LEN);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(ext, "png");
    }

    #[test]
    fn extension_defaults_to_jpg() {
        assert!(AssetStore::local_identity("http://x/no-extension").ends_with(".jpg"));
        assert!(AssetStore::local_identity("http://x/").ends_with(".jpg"));
    }

    #[test]
    fn extension_ignores_query_string() {
        let filename = AssetStore::local_identity("http://x/pic.gif?cache=1.webp");
        assert!(filename.ends_with(".gif"));
    }

    #[test]
    fn suspicious_extensions_rejected() {
        // Too long or non-alphanumeric: fall back to the default.
        assert!(AssetStore::local_identity("http://x/file.backup2024").ends_with(".jpg"));
    }

    #[test]
    fn local_path_is_root_relative() {
        let store = AssetStore::new("/var/site/out/images");
        assert_eq!(store.local_path("abc.png"), "/images/abc.png");
    }

    #[test]
    fn persist_then_contains() {
        let (store, dir) = temp_store();
        let filename = AssetStore::local_identity("http://x/a.png");

        assert!(!store.contains(&filename));
        let local = store.persist(&filename, b"fake png bytes").unwrap();
        assert!(store.contains(&filename));
        assert_eq!(local, format!("/images/{filename}"));

        let on_disk = std::fs::read(store.root().join(&filename)).unwrap();
        assert_eq!(on_disk, b"fake png bytes");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn persist_is_idempotent_per_filename() {
        let (store, dir) = temp_store();
        let filename = AssetStore::local_identity("http://x/b.png");

        let first = store.persist(&filename, b"bytes").unwrap();
        let second = store.persist(&filename, b"bytes").unwrap();
        assert_eq!(first, second);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
