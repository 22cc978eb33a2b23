use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument, trace};

use crate::error::{Result, RockError};

/// Image formats accepted for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Jpeg,
    Png,
}

impl MediaType {
    pub fn mime_type(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
        }
    }

    /// Parse a MIME type or file extension hint.
    ///
    /// Accepts `jpeg`, `jpg`, `png`, their `image/*` forms, and dotted
    /// extensions, ignoring case.
    pub fn from_hint(hint: &str) -> Result<Self> {
        let normalized = hint.trim().to_ascii_lowercase();
        let subtype = normalized
            .strip_prefix("image/")
            .or_else(|| normalized.strip_prefix('.'))
            .unwrap_or(&normalized);

        match subtype {
            "jpeg" | "jpg" => Ok(MediaType::Jpeg),
            "png" => Ok(MediaType::Png),
            _ => {
                error!(hint = %hint, "Rejected unsupported media type");
                Err(RockError::UnsupportedMedia(format!(
                    "'{}' is not a supported image type (expected jpeg, jpg or png)",
                    hint
                )))
            }
        }
    }

    /// Infer the media type from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                RockError::UnsupportedMedia(format!(
                    "{} has no file extension (expected .jpeg, .jpg or .png)",
                    path.display()
                ))
            })?;
        Self::from_hint(extension)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Base64 text form of an image, ready to be sent inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    data: String,
    media_type: MediaType,
}

impl EncodedImage {
    /// The base64 payload (standard alphabet, padded).
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn mime_type(&self) -> &'static str {
        self.media_type.mime_type()
    }

    /// `data:<mime>;base64,<payload>`
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type.mime_type(), self.data)
    }

    /// Decode the payload back to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD.decode(&self.data).map_err(|e| {
            RockError::UnsupportedMedia(format!("Encoded image is not valid base64: {}", e))
        })
    }
}

/// Encode raw image bytes for transmission.
///
/// The type hint is checked and the bytes must be non-empty before any
/// encoding happens.
///
/// ```
/// use rock_analyzer::encode;
///
/// let encoded = encode(b"abc", "png").unwrap();
/// assert_eq!(encoded.data(), "YWJj");
/// assert_eq!(encoded.data_url(), "data:image/png;base64,YWJj");
/// assert!(encode(b"abc", "gif").is_err());
/// ```
#[instrument(skip(bytes), fields(len = bytes.len()))]
pub fn encode(bytes: &[u8], mime_hint: &str) -> Result<EncodedImage> {
    let media_type = MediaType::from_hint(mime_hint)?;
    if bytes.is_empty() {
        error!("Rejected empty image");
        return Err(RockError::UnsupportedMedia(
            "Image data cannot be empty".to_string(),
        ));
    }

    let data = STANDARD.encode(bytes);
    trace!(encoded_len = data.len(), media_type = %media_type, "Encoded image");
    Ok(EncodedImage { data, media_type })
}

/// An image selected for analysis: the original bytes, kept for preview, and
/// their encoded form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    bytes: Vec<u8>,
    encoded: EncodedImage,
    source: Option<PathBuf>,
}

impl ImageAsset {
    /// Create an asset from in-memory bytes and a MIME type or extension hint.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, mime_hint: &str) -> Result<Self> {
        let bytes = bytes.into();
        let encoded = encode(&bytes, mime_hint)?;
        Ok(Self {
            bytes,
            encoded,
            source: None,
        })
    }

    /// Read an image file, inferring its type from the extension.
    #[instrument]
    pub fn from_path(path: &Path) -> Result<Self> {
        let media_type = MediaType::from_path(path)?;
        let bytes = std::fs::read(path).map_err(|e| file_read_error(path, e))?;
        Self::from_file_bytes(path, bytes, media_type)
    }

    /// Async variant of [`ImageAsset::from_path`].
    #[cfg(feature = "openai")]
    #[instrument]
    pub async fn load(path: &Path) -> Result<Self> {
        let media_type = MediaType::from_path(path)?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| file_read_error(path, e))?;
        Self::from_file_bytes(path, bytes, media_type)
    }

    fn from_file_bytes(path: &Path, bytes: Vec<u8>, media_type: MediaType) -> Result<Self> {
        debug!(path = %path.display(), len = bytes.len(), "Read image file");
        let encoded = encode(&bytes, media_type.mime_type())?;
        Ok(Self {
            bytes,
            encoded,
            source: Some(path.to_path_buf()),
        })
    }

    /// The original bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn encoded(&self) -> &EncodedImage {
        &self.encoded
    }

    pub fn media_type(&self) -> MediaType {
        self.encoded.media_type
    }

    /// File the asset was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Data URL for showing a preview of the image.
    pub fn preview_data_url(&self) -> String {
        self.encoded.data_url()
    }
}

fn file_read_error(path: &Path, e: std::io::Error) -> RockError {
    error!(path = %path.display(), error = %e, "Failed to read image file");
    RockError::FileRead(format!("{}: {}", path.display(), e))
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum OpenAIMessageContent {
    Text(String),
    Parts(Vec<OpenAIMessagePart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum OpenAIMessagePart {
    Text { text: String },
    ImageUrl { image_url: OpenAIImageUrl },
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAIImageUrl {
    pub(crate) url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) detail: Option<String>,
}

/// Text followed by an inline image, as one multimodal user message.
pub(crate) fn build_image_message_content(
    text: &str,
    image: &EncodedImage,
) -> OpenAIMessageContent {
    let mut parts = Vec::with_capacity(2);
    if !text.is_empty() {
        parts.push(OpenAIMessagePart::Text {
            text: text.to_string(),
        });
    }
    parts.push(OpenAIMessagePart::ImageUrl {
        image_url: OpenAIImageUrl {
            url: image.data_url(),
            detail: Some("auto".to_string()),
        },
    });
    OpenAIMessageContent::Parts(parts)
}
