//! Abstract object storage trait.
//!
//! Every storage backend must implement [`ObjectStorage`].  The trait
//! works in terms of opaque byte blobs so callers do not need to know
//! the underlying medium.

use bytes::Bytes;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// One uploaded binary blob plus the free-form metadata submitted
/// alongside it.
#[derive(Debug, Clone)]
pub struct UploadArtifact {
    /// Raw bytes of the upload.
    pub data: Bytes,
    /// Content type reported by the client, if any.
    pub content_type: Option<String>,
    /// Arbitrary key/value pairs drawn from the rest of the request body.
    pub metadata: HashMap<String, String>,
}

/// Async object storage contract.
pub trait ObjectStorage: Send + Sync + 'static {
    /// Persist `artifact` under a store-assigned key and return the
    /// publicly readable location of the stored object.
    fn store(
        &self,
        artifact: UploadArtifact,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>>;
}

/// Store-assigned key for a fresh upload: the upload timestamp as a
/// stringified millisecond epoch.  Not content-derived, so collisions
/// are possible only across same-millisecond uploads.
pub fn timestamp_key() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

// ── Tests ───────────────────────────────────────────────────────────
