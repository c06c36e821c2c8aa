//! AWS S3 gateway storage backend.
//!
//! Proxies image uploads to a real AWS S3 bucket.  Objects land at
//! `{prefix}{millisecond-epoch-key}` with a `public-read` canned ACL,
//! so the returned location is world-readable.
//!
//! Credentials are resolved via the standard AWS credential chain
//! (env vars, `~/.aws/credentials`, IAM role, etc.) unless explicit
//! keys are configured.

use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info};

use super::backend::{timestamp_key, ObjectStorage, UploadArtifact};

/// Gateway backend that forwards uploads to AWS S3.
pub struct AwsGatewayBackend {
    /// AWS S3 SDK client.
    client: Client,
    /// The upstream S3 bucket name.
    bucket: String,
    /// AWS region, used when building virtual-hosted public URLs.
    region: String,
    /// Key prefix for all objects in the upstream bucket.
    prefix: String,
    /// Custom S3-compatible endpoint (e.g. MinIO, LocalStack), if any.
    endpoint_url: Option<String>,
    /// Force path-style URL addressing.
    use_path_style: bool,
}

impl AwsGatewayBackend {
    /// Create a new AWS gateway backend.
    ///
    /// Loads AWS credentials from the default credential chain and
    /// initializes the S3 client for the specified region.
    pub async fn new(
        bucket: String,
        region: String,
        prefix: String,
        endpoint_url: Option<String>,
        use_path_style: bool,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
    ) -> anyhow::Result<Self> {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.clone()));

        if let Some(ref endpoint) = endpoint_url {
            config_loader = config_loader.endpoint_url(endpoint);
        }

        // If explicit credentials are provided, inject them as static credentials.
        if let (Some(ref ak), Some(ref sk)) = (&access_key_id, &secret_access_key) {
            let creds = aws_sdk_s3::config::Credentials::new(
                ak,
                sk,
                None, // session_token
                None, // expiry
                "gamestash-config",
            );
            config_loader = config_loader.credentials_provider(creds);
        }

        let sdk_config = config_loader.load().await;

        let s3_config_builder =
            aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(use_path_style);

        let client = Client::from_conf(s3_config_builder.build());

        info!(
            "AWS gateway backend initialized: bucket={} prefix='{}'",
            bucket, prefix
        );

        Ok(Self {
            client,
            bucket,
            region,
            prefix,
            endpoint_url,
            use_path_style,
        })
    }

    /// Map a storage key to an upstream S3 key.
    fn s3_key(&self, storage_key: &str) -> String {
        format!("{}{}", self.prefix, storage_key)
    }

    /// Public retrieval URL for an uploaded object.
    fn public_url(&self, s3_key: &str) -> String {
        match &self.endpoint_url {
            Some(endpoint) => {
                format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, s3_key)
            }
            None if self.use_path_style => {
                format!("https://s3.{}.amazonaws.com/{}/{}", self.region, self.bucket, s3_key)
            }
            None => {
                format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, s3_key)
            }
        }
    }

    /// Map an AWS SDK error to an anyhow error with context.
    fn map_sdk_error(context: &str, err: impl std::fmt::Display) -> anyhow::Error {
        anyhow::anyhow!("AWS S3 {context}: {err}")
    }
}

impl ObjectStorage for AwsGatewayBackend {
    fn store(
        &self,
        artifact: UploadArtifact,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>> {
        Box::pin(async move {
            let s3_key = self.s3_key(&timestamp_key());

            debug!("AWS put_object: bucket={} key={}", self.bucket, s3_key);

            let mut request = self
                .client
                .put_object()
                .bucket(&self.bucket)
                .key(&s3_key)
                .acl(ObjectCannedAcl::PublicRead)
                .body(aws_sdk_s3::primitives::ByteStream::from(artifact.data));

            if let Some(content_type) = artifact.content_type {
                request = request.content_type(content_type);
            }
            if !artifact.metadata.is_empty() {
                request = request.set_metadata(Some(artifact.metadata));
            }

            request
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("put_object", e))?;

            Ok(self.public_url(&s3_key))
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────
