use anyhow::Context;
use uuid::Uuid;

use crate::{auth::dto::LicenseUpload, error::AppError, storage::StorageClient};

/// Where an uploaded image ended up.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub key: String,
    pub public_path: String,
}

pub fn is_image(content_type: &str) -> bool {
    content_type.trim().to_ascii_lowercase().starts_with("image/")
}

/// Saves a license image as `<uuid>.<ext>`; non-image uploads are a 400.
pub async fn store_license_image(
    storage: &dyn StorageClient,
    upload: LicenseUpload,
) -> Result<StoredImage, AppError> {
    if !is_image(&upload.content_type) {
        return Err(AppError::bad_request("File must be an image"));
    }
    if upload.body.is_empty() {
        return Err(AppError::bad_request("license_image is empty"));
    }

    let ext = upload
        .file_name
        .as_deref()
        .and_then(ext_from_file_name)
        .or_else(|| ext_from_mime(&upload.content_type).map(String::from))
        .unwrap_or_else(|| "bin".into());
    let key = format!("{}.{}", Uuid::new_v4(), ext);

    let public_path = storage
        .put_object(&key, upload.body, &upload.content_type)
        .await
        .with_context(|| format!("store license image {}", key))?;

    Ok(StoredImage { key, public_path })
}

fn ext_from_file_name(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    let valid = !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some(ext)
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
