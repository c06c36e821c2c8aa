//! Local filesystem storage backend.
//!
//! Uploads are stored as flat files under a configurable root directory,
//! which the server exposes read-only at `/uploads`.  Writes follow the
//! temp-fsync-rename pattern so a crash never leaves a partial object at
//! the final path.  Metadata travels in a JSON sidecar next to the blob.

use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::pin::Pin;

use super::backend::{timestamp_key, ObjectStorage, UploadArtifact};

/// Stores uploads on the local filesystem.
pub struct LocalBackend {
    /// Root directory for all stored objects.
    root: PathBuf,
    /// Base URL under which the root directory is served.
    public_base_url: String,
}

impl LocalBackend {
    /// Create a new `LocalBackend` rooted at `root`, publishing locations
    /// under `public_base_url`.
    ///
    /// The directory will be created if it does not exist.
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> anyhow::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        // Also create the .tmp directory for atomic writes.
        std::fs::create_dir_all(root.join(".tmp"))?;
        Ok(Self {
            root,
            public_base_url: public_base_url.into(),
        })
    }

    /// Generate a temp file path under .tmp/ for atomic writes.
    fn temp_path(&self) -> PathBuf {
        let id = uuid::Uuid::new_v4();
        self.root.join(".tmp").join(format!("tmp-{}", id))
    }

    /// Write `data` to `path` via temp-fsync-rename.
    fn write_atomic(&self, path: &std::path::Path, data: &[u8]) -> anyhow::Result<()> {
        let tmp_path = self.temp_path();
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

impl ObjectStorage for LocalBackend {
    fn store(
        &self,
        artifact: UploadArtifact,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>> {
        Box::pin(async move {
            let key = timestamp_key();
            let final_path = self.root.join(&key);

            self.write_atomic(&final_path, &artifact.data)?;

            // Sidecar carries content type and the free-form metadata.
            let sidecar = serde_json::json!({
                "content_type": artifact.content_type,
                "metadata": artifact.metadata,
            });
            self.write_atomic(
                &self.root.join(format!("{key}.meta.json")),
                sidecar.to_string().as_bytes(),
            )?;

            Ok(format!(
                "{}/{}",
                self.public_base_url.trim_end_matches('/'),
                key
            ))
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────
