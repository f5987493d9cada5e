use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pricelens_core::AppError;

/// An image ready to travel to the inference service: base64 bytes with no
/// data-URL prefix, plus the MIME type.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: String,
    pub mime_type: String,
}

/// Read an image file and encode it for the inference request.
///
/// One-shot read; fails with [`AppError::EncodingError`] when the file
/// cannot be read or is empty. The MIME type is sniffed from the file
/// extension.
pub async fn encode_image(path: &Path) -> Result<EncodedImage, AppError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        AppError::EncodingError(format!("Failed to read image {}: {e}", path.display()))
    })?;
    if bytes.is_empty() {
        return Err(AppError::EncodingError(format!(
            "Image file {} is empty",
            path.display()
        )));
    }

    Ok(EncodedImage {
        data: STANDARD.encode(&bytes),
        mime_type: mime_from_path(path).to_string(),
    })
}

/// Guess a MIME type from the file extension, defaulting to JPEG.
pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_from_path() {
        assert_eq!(mime_from_path(Path::new("photo.PNG")), "image/png");
        assert_eq!(mime_from_path(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(mime_from_path(Path::new("photo.webp")), "image/webp");
        assert_eq!(mime_from_path(Path::new("no_extension")), "image/jpeg");
    }

    #[tokio::test]
    async fn encodes_file_bytes_without_prefix() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("photo.png");
        std::fs::write(&path, b"\x89PNG fake bytes").unwrap();

        let encoded = encode_image(&path).await.unwrap();
        assert_eq!(encoded.mime_type, "image/png");
        assert!(!encoded.data.starts_with("data:"));
        assert_eq!(STANDARD.decode(&encoded.data).unwrap(), b"\x89PNG fake bytes");
    }

    #[tokio::test]
    async fn missing_file_is_an_encoding_error() {
        let err = encode_image(Path::new("/nonexistent/photo.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EncodingError(_)));
    }

    #[tokio::test]
    async fn empty_file_is_an_encoding_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("empty.jpg");
        std::fs::write(&path, b"").unwrap();

        let err = encode_image(&path).await.unwrap_err();
        assert!(matches!(err, AppError::EncodingError(_)));
    }
}
