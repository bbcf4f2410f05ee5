// Selection module: the single image the user is working with.
//
// An image is shown to the user through its preview, a `data:` URL with a
// base64 body (the same representation a browser uses for an <img> src).
// Uploaded files additionally keep their raw bytes so they can be sent
// as-is; camera frames only exist as a preview and are decoded back into
// bytes when submitted.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Multipart field name the relay expects the image under.
pub const IMAGE_FIELD: &str = "image";

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Where an image came from. Only matters while acquiring it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSource {
    #[default]
    Upload,
    Camera,
}

impl ImageSource {
    pub fn label(self) -> &'static str {
        match self {
            ImageSource::Upload => "Upload",
            ImageSource::Camera => "Camera",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("not a data URL")]
    MissingPrefix,
    #[error("data URL is not base64 encoded")]
    NotBase64,
    #[error("data URL does not hold an image (mime type `{0}`)")]
    NotAnImage(String),
    #[error("invalid base64 payload: {0}")]
    InvalidPayload(String),
}

/// Encode raw image bytes as a displayable `data:` URL.
pub fn encode_data_url(bytes: &[u8], mime: &str) -> String {
    format!(
        "{}{}{}{}",
        DATA_URL_PREFIX,
        mime,
        BASE64_MARKER,
        STANDARD.encode(bytes)
    )
}

/// Decode a `data:` URL produced by [`encode_data_url`] back into its bytes
/// and mime type.
pub fn decode_data_url(data_url: &str) -> Result<(Vec<u8>, String), DataUrlError> {
    let rest = data_url
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or(DataUrlError::MissingPrefix)?;
    let (mime, payload) = rest
        .split_once(BASE64_MARKER)
        .ok_or(DataUrlError::NotBase64)?;
    if !mime.starts_with("image/") {
        return Err(DataUrlError::NotAnImage(mime.to_string()));
    }
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| DataUrlError::InvalidPayload(e.to_string()))?;
    Ok((bytes, mime.to_string()))
}

/// Sniff the mime type of an image buffer from its magic bytes.
/// Returns `None` when the buffer is not a recognizable image or the
/// format has no `image/*` mime type.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    ::image::guess_format(bytes)
        .ok()
        .map(|f| f.to_mime_type())
        .filter(|mime| mime.starts_with("image/"))
}

/// File extension used when naming a payload that has no filename of its own.
fn extension_for(mime: &str) -> &str {
    match mime {
        "image/jpeg" => "jpg",
        "image/svg+xml" => "svg",
        other => other.strip_prefix("image/").unwrap_or("bin"),
    }
}

/// The uploaded file as it was read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImageFile {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub file_name: String,
}

/// The image currently awaiting submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    source: ImageSource,
    preview: String,
    raw: Option<RawImageFile>,
}

impl SelectedImage {
    /// Build from an uploaded file. Fails when the bytes are not an image.
    pub fn from_upload(bytes: Vec<u8>, file_name: impl Into<String>) -> Option<Self> {
        let mime = sniff_mime(&bytes)?;
        let preview = encode_data_url(&bytes, mime);
        Some(Self {
            source: ImageSource::Upload,
            preview,
            raw: Some(RawImageFile {
                bytes,
                mime: mime.to_string(),
                file_name: file_name.into(),
            }),
        })
    }

    /// Build from a camera frame. Only the encoded preview is kept.
    pub fn from_capture(bytes: &[u8], mime: &str) -> Self {
        Self {
            source: ImageSource::Camera,
            preview: encode_data_url(bytes, mime),
            raw: None,
        }
    }

    pub fn source(&self) -> ImageSource {
        self.source
    }

    /// The display-ready `data:` URL.
    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn raw_file(&self) -> Option<&RawImageFile> {
        self.raw.as_ref()
    }

    /// Mime type as carried by the preview.
    pub fn mime(&self) -> &str {
        self.preview
            .strip_prefix(DATA_URL_PREFIX)
            .and_then(|rest| rest.split_once(BASE64_MARKER))
            .map(|(mime, _)| mime)
            .unwrap_or("application/octet-stream")
    }

    /// Build the payload sent to the relay. Uploads are sent as read;
    /// captures are decoded from their preview.
    pub fn to_payload(&self) -> Result<SubmissionPayload, DataUrlError> {
        if let Some(raw) = &self.raw {
            return Ok(SubmissionPayload {
                field: IMAGE_FIELD,
                bytes: raw.bytes.clone(),
                mime: raw.mime.clone(),
                file_name: raw.file_name.clone(),
            });
        }
        let (bytes, mime) = decode_data_url(&self.preview)?;
        let file_name = format!("webcam.{}", extension_for(&mime));
        Ok(SubmissionPayload {
            field: IMAGE_FIELD,
            bytes,
            mime,
            file_name,
        })
    }
}

/// One multipart part, derived from a [`SelectedImage`] at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub field: &'static str,
    pub bytes: Vec<u8>,
    pub mime: String,
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn jpeg_bytes(len: usize) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.extend((0..len).map(|i| (i % 251) as u8));
        bytes
    }

    #[test]
    fn test_data_url_round_trip() {
        for (bytes, mime) in [
            (jpeg_bytes(10 * 1024), "image/jpeg"),
            (PNG_HEADER.to_vec(), "image/png"),
            (Vec::new(), "image/gif"),
            (vec![0u8, 255, 0, 255], "image/webp"),
        ] {
            let encoded = encode_data_url(&bytes, mime);
            assert!(encoded.starts_with("data:image/"));
            let (decoded, decoded_mime) = decode_data_url(&encoded).unwrap();
            assert_eq!(decoded, bytes);
            assert_eq!(decoded_mime, mime);
        }
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert_eq!(
            decode_data_url("image/png;base64,AAAA"),
            Err(DataUrlError::MissingPrefix)
        );
        assert_eq!(
            decode_data_url("data:image/png,AAAA"),
            Err(DataUrlError::NotBase64)
        );
        assert_eq!(
            decode_data_url("data:text/plain;base64,AAAA"),
            Err(DataUrlError::NotAnImage("text/plain".into()))
        );
        assert!(matches!(
            decode_data_url("data:image/png;base64,***"),
            Err(DataUrlError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_upload_sniffs_mime() {
        let image = SelectedImage::from_upload(jpeg_bytes(64), "face.jpg").unwrap();
        assert_eq!(image.source(), ImageSource::Upload);
        assert_eq!(image.mime(), "image/jpeg");
        assert!(image.preview().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_upload_rejects_non_image() {
        assert!(SelectedImage::from_upload(b"hello world".to_vec(), "notes.txt").is_none());
    }

    #[test]
    fn test_sniff_only_image_mime_types() {
        assert_eq!(sniff_mime(PNG_HEADER), Some("image/png"));
        let farbfeld = b"farbfeld\0\0\0\x01\0\0\0\x01";
        assert_eq!(sniff_mime(farbfeld), None);
        assert!(SelectedImage::from_upload(farbfeld.to_vec(), "frame.ff").is_none());
    }

    #[test]
    fn test_upload_payload_uses_raw_file() {
        let bytes = jpeg_bytes(128);
        let image = SelectedImage::from_upload(bytes.clone(), "face.jpg").unwrap();
        let payload = image.to_payload().unwrap();
        assert_eq!(payload.field, "image");
        assert_eq!(payload.bytes, bytes);
        assert_eq!(payload.mime, "image/jpeg");
        assert_eq!(payload.file_name, "face.jpg");
    }

    #[test]
    fn test_capture_payload_decodes_preview() {
        let image = SelectedImage::from_capture(PNG_HEADER, "image/png");
        assert!(image.raw_file().is_none());
        let payload = image.to_payload().unwrap();
        assert_eq!(payload.bytes, PNG_HEADER);
        assert_eq!(payload.mime, "image/png");
        assert_eq!(payload.file_name, "webcam.png");
    }

    #[test]
    fn test_capture_jpeg_filename() {
        let image = SelectedImage::from_capture(&jpeg_bytes(8), "image/jpeg");
        assert_eq!(image.to_payload().unwrap().file_name, "webcam.jpg");
    }
}
