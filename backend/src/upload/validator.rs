use actix_multipart::{Field, Multipart};
use futures::{StreamExt, TryStreamExt};

use super::models::{ClusterCount, ImageField, RawUpload, UploadPolicy, ValidatedUpload};

pub const IMAGE_FIELD: &str = "image";
pub const CLUSTERS_FIELD: &str = "numClusters";

const MAX_TEXT_FIELD_BYTES: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("No image was provided")]
    MissingPayload,
    #[error("The uploaded file is not an image (content type: {})", .0.as_deref().unwrap_or("none"))]
    InvalidContentType(Option<String>),
    #[error("Number of clusters must be an integer between 2 and 10 (got: {0})")]
    InvalidClusterCount(String),
    #[error("Image exceeds the {limit} byte upload limit")]
    ImageTooLarge { limit: usize },
    #[error("Malformed multipart form: {0}")]
    MalformedForm(String),
}

/// Checks a collected form. Pure: touches neither the filesystem nor any process.
pub fn validate(raw: RawUpload, policy: &UploadPolicy) -> Result<ValidatedUpload, ValidationError> {
    let image = raw
        .image
        .filter(|image| !image.data.is_empty())
        .ok_or(ValidationError::MissingPayload)?;

    let content_type = image
        .content_type
        .as_deref()
        .map(|ct| ct.trim().to_ascii_lowercase())
        .filter(|ct| ct.starts_with("image/"))
        .ok_or_else(|| ValidationError::InvalidContentType(image.content_type.clone()))?;

    if image.data.len() > policy.max_bytes {
        return Err(ValidationError::ImageTooLarge {
            limit: policy.max_bytes,
        });
    }

    let clusters = ClusterCount::parse(raw.num_clusters.as_deref(), policy.allow_default_clusters)?;

    Ok(ValidatedUpload {
        data: image.data,
        content_type,
        file_name: image.file_name,
        clusters,
    })
}

/// Reads the multipart body into a `RawUpload`. Only the first `image` part is kept;
/// unknown parts are drained and ignored.
pub async fn collect_upload(
    mut payload: Multipart,
    policy: &UploadPolicy,
) -> Result<RawUpload, ValidationError> {
    let mut raw = RawUpload::default();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ValidationError::MalformedForm(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            IMAGE_FIELD if raw.image.is_none() => {
                let content_type = field.content_type().map(|m| m.essence_str().to_string());
                let file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(str::to_string);
                let data = read_field(&mut field, policy.max_bytes)
                    .await
                    .map_err(|e| match e {
                        FieldReadError::TooLarge => ValidationError::ImageTooLarge {
                            limit: policy.max_bytes,
                        },
                        FieldReadError::Stream(msg) => ValidationError::MalformedForm(msg),
                    })?;
                raw.image = Some(ImageField {
                    data,
                    content_type,
                    file_name,
                });
            }
            CLUSTERS_FIELD => {
                let data = read_field(&mut field, MAX_TEXT_FIELD_BYTES)
                    .await
                    .map_err(|e| match e {
                        FieldReadError::TooLarge => {
                            ValidationError::InvalidClusterCount("value too long".into())
                        }
                        FieldReadError::Stream(msg) => ValidationError::MalformedForm(msg),
                    })?;
                let text = String::from_utf8(data)
                    .map_err(|_| ValidationError::InvalidClusterCount("not UTF-8".into()))?;
                raw.num_clusters = Some(text);
            }
            _ => {
                log::debug!("Ignoring multipart field '{}'", name);
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| ValidationError::MalformedForm(e.to_string()))?;
                }
            }
        }
    }

    Ok(raw)
}

enum FieldReadError {
    TooLarge,
    Stream(String),
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, FieldReadError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| FieldReadError::Stream(e.to_string()))?;
        if data.len() + chunk.len() > limit {
            return Err(FieldReadError::TooLarge);
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}
