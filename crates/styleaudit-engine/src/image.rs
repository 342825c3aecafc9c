use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

#[derive(Debug, thiserror::Error)]
pub enum ImageEncodeError {
    #[error("image file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed reading {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An image file rendered as base64 for embedding in a model request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: &'static str,
    pub base64: String,
}

impl EncodedImage {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

/// Reads `path` and encodes its bytes with standard base64. The content is
/// not validated as an image.
pub fn encode_image(path: &Path) -> Result<EncodedImage, ImageEncodeError> {
    if !path.is_file() {
        return Err(ImageEncodeError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|source| ImageEncodeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(EncodedImage {
        mime_type: guess_image_mime(path),
        base64: BASE64.encode(bytes),
    })
}

fn guess_image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/png",
    }
}
