//! Image upload handler.
//!
//! Accepts one multipart submission with the file under the `img` field;
//! every other field is carried along as free-form metadata on the
//! stored object.  Any failure -- multipart parse error, missing file
//! field, storage-provider rejection -- is reported as HTTP 422 with a
//! structured single-error payload.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use metrics::counter;
use serde::Serialize;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::errors::ApiError;
use crate::metrics::IMAGE_UPLOADS_TOTAL;
use crate::storage::backend::UploadArtifact;
use crate::AppState;

/// The multipart field name holding the binary file.
const FILE_FIELD: &str = "img";

/// Success payload of the upload route.
#[derive(Debug, Serialize, ToSchema)]
pub struct ImageUploadResponse {
    /// Public retrieval URL of the stored object.
    #[serde(rename = "imageLocation")]
    pub image_location: String,
}

/// `POST /api/addGameImage/` -- store one uploaded image and return its
/// public location.
#[utoipa::path(
    post,
    path = "/api/addGameImage/",
    tag = "Images",
    operation_id = "AddGameImage",
    request_body(
        content_type = "multipart/form-data",
        description = "Binary file under `img`; other fields become object metadata"
    ),
    responses(
        (status = 200, description = "Upload stored", body = ImageUploadResponse),
        (status = 422, description = "Upload could not be completed")
    )
)]
pub async fn add_game_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ImageUploadResponse>, ApiError> {
    let mut file: Option<(Bytes, Option<String>)> = None;
    let mut metadata: HashMap<String, String> = HashMap::new();

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().unwrap_or("").to_string();
        if name == FILE_FIELD {
            let content_type = field.content_type().map(|s| s.to_string());
            let data = field.bytes().await.map_err(upload_error)?;
            debug!(
                "received upload: {} bytes, content type {:?}",
                data.len(),
                content_type
            );
            file = Some((data, content_type));
        } else {
            let value = field.text().await.map_err(upload_error)?;
            metadata.insert(name, value);
        }
    }

    let (data, content_type) = file.ok_or_else(|| ApiError::UploadFailed {
        detail: format!("missing file field '{FILE_FIELD}'"),
    })?;

    let location = state
        .storage
        .store(UploadArtifact {
            data,
            content_type,
            metadata,
        })
        .await
        .map_err(|e| {
            warn!("image upload failed: {e:#}");
            counter!(IMAGE_UPLOADS_TOTAL, "status" => "error").increment(1);
            ApiError::UploadFailed {
                detail: e.to_string(),
            }
        })?;

    counter!(IMAGE_UPLOADS_TOTAL, "status" => "ok").increment(1);
    Ok(Json(ImageUploadResponse {
        image_location: location,
    }))
}

/// Map a multipart parse error into the upload-failure response.
fn upload_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::UploadFailed {
        detail: err.to_string(),
    }
}
