use anyhow::Context;
use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Prefix under which recipe images are stored.
const RECIPE_IMAGE_PREFIX: &str = "upload/recipe";

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
    pub file_name: Option<String>,
}

impl UploadItem {
    /// Extension for the stored object; `None` when the upload is not an image
    /// we accept.
    pub fn extension(&self) -> Option<&'static str> {
        ext_from_mime(&self.content_type).or_else(|| {
            self.file_name
                .as_deref()
                .and_then(|n| n.rsplit_once('.'))
                .and_then(|(_, ext)| ext_from_file_ext(ext))
        })
    }
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

fn ext_from_file_ext(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("jpg"),
        "png" => Some("png"),
        "webp" => Some("webp"),
        "heic" => Some("heic"),
        "gif" => Some("gif"),
        _ => None,
    }
}

fn mime_from_ext(ext: &str) -> &'static str {
    match ext {
        "jpg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Random object key so uploads never collide: `upload/recipe/<uuid>.<ext>`.
pub fn recipe_image_key(ext: &str) -> String {
    format!("{}/{}.{}", RECIPE_IMAGE_PREFIX, Uuid::new_v4(), ext)
}

/// Uploads a validated image and returns its object key.
pub async fn store_recipe_image(
    st: &AppState,
    item: UploadItem,
    ext: &str,
) -> anyhow::Result<String> {
    let key = recipe_image_key(ext);
    st.storage
        .put_object(&key, item.body, mime_from_ext(ext))
        .await
        .with_context(|| format!("put_object {}", key))?;
    debug!(%key, "recipe image stored");
    Ok(key)
}

/// Deletes an image that is no longer referenced. Failures are logged only;
/// the database is already consistent at this point.
pub async fn discard_image(st: &AppState, key: &str) {
    if let Err(e) = st.storage.delete_object(key).await {
        warn!(error = %e, %key, "failed to delete stale recipe image");
    }
}

pub async fn presign_image(st: &AppState, key: &str) -> anyhow::Result<String> {
    st.storage
        .presign_get(key, st.config.storage.url_ttl_secs)
        .await
        .with_context(|| format!("presign url for {}", key))
}
