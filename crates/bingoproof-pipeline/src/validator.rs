//! Input validation for submitted media.
//!
//! Everything here is decided from the declared MIME type and the raw bytes'
//! length; content sniffing is the transcoder's job (ffmpeg fails decodes we
//! let through).

use bingoproof_core::{MediaAsset, MediaKind};

/// Validation errors for submitted media
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Empty file")]
    EmptyFile,

    #[error("Unsupported media type: {0}")]
    UnsupportedType(String),
}

/// Check a submitted asset and derive its media kind.
pub fn validate_asset(asset: &MediaAsset) -> Result<MediaKind, ValidationError> {
    if asset.bytes.is_empty() {
        return Err(ValidationError::EmptyFile);
    }

    MediaKind::from_mime(&asset.declared_mime_type)
        .ok_or_else(|| ValidationError::UnsupportedType(asset.declared_mime_type.clone()))
}

/// Storage extension for a passthrough upload, derived from the declared
/// MIME type. Transcoded outputs take their extension from the target codec
/// instead.
pub fn extension_for_mime(mime: &str) -> &'static str {
    let essence = mime
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/avif" => "avif",
        "image/heic" => "heic",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        "video/x-matroska" => "mkv",
        "video/x-msvideo" => "avi",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_validate_image_asset() {
        let asset = MediaAsset::new(Bytes::from_static(b"\xff\xd8"), "image/jpeg");
        assert_eq!(validate_asset(&asset).unwrap(), MediaKind::Image);
    }

    #[test]
    fn test_validate_video_asset_with_params() {
        let asset = MediaAsset::new(Bytes::from_static(b"x"), "video/webm; codecs=vp9");
        assert_eq!(validate_asset(&asset).unwrap(), MediaKind::Video);
    }

    #[test]
    fn test_validate_empty_asset() {
        let asset = MediaAsset::new(Bytes::new(), "image/jpeg");
        assert!(matches!(
            validate_asset(&asset),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn test_validate_unsupported_type() {
        let asset = MediaAsset::new(Bytes::from_static(b"%PDF"), "application/pdf");
        assert!(matches!(
            validate_asset(&asset),
            Err(ValidationError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("image/jpeg"), "jpg");
        assert_eq!(extension_for_mime("IMAGE/PNG"), "png");
        assert_eq!(extension_for_mime("video/mp4"), "mp4");
        assert_eq!(extension_for_mime("video/quicktime"), "mov");
        assert_eq!(extension_for_mime("video/webm; codecs=vp9"), "webm");
        assert_eq!(extension_for_mime("application/octet-stream"), "bin");
    }
}
