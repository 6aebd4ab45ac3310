use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use shared::ProcessImageResponse;
use std::path::{Path, PathBuf};

pub const SUCCESS_MESSAGE: &str = "Image processed successfully";
const FALLBACK_MIME: &str = "image/png";

/// A resolved output image that could not be read. Logged, never returned to the client.
#[derive(Debug, thiserror::Error)]
#[error("Output image {} is unreadable: {reason}", .path.display())]
pub struct OutputImageUnreadable {
    pub path: PathBuf,
    pub reason: String,
}

pub fn success(results: Value, analysis_image: Option<String>) -> ProcessImageResponse {
    ProcessImageResponse {
        success: true,
        message: SUCCESS_MESSAGE.to_string(),
        results,
        analysis_image,
    }
}

/// `data:<mime>;base64,...`, with the MIME type sniffed from the bytes.
pub fn encode_data_uri(bytes: &[u8]) -> String {
    let mime = image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_MIME);
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

pub async fn load_analysis_image(path: &Path) -> Result<String, OutputImageUnreadable> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| OutputImageUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    if bytes.is_empty() {
        return Err(OutputImageUnreadable {
            path: path.to_path_buf(),
            reason: "file is empty".to_string(),
        });
    }
    Ok(encode_data_uri(&bytes))
}
