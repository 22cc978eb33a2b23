use thiserror::Error;

/// Error types for rock analysis.
///
/// Each variant is one category of failure the caller reacts to differently:
///
/// - `Configuration`: missing credential or an unknown rock type name. Not
///   recoverable by retrying.
/// - `UnsupportedMedia`: the selected file is empty or not a jpeg/png. The user
///   must pick another file.
/// - `Extraction`: the model call failed (network, provider, refusal, or a
///   response that does not match the schema). The user may retry.
/// - `FileRead`: the local image could not be read before encoding.
/// - `InvalidState`: a session operation was called in a state that does not
///   allow it, such as starting a second extraction while one is pending.
///
/// # Examples
///
/// ```
/// use rock_analyzer::{RockError, RockVariantTag};
/// use std::str::FromStr;
///
/// let err = RockVariantTag::from_str("basalt").unwrap_err();
/// match err {
///     RockError::Configuration(msg) => assert!(msg.contains("basalt")),
///     other => panic!("unexpected error: {}", other),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RockError {
    /// Missing credential, unknown rock type, or other setup problem
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Image is empty or of a type other than jpeg/png
    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),

    /// The structured extraction call failed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// The local image file could not be read
    #[error("File read error: {0}")]
    FileRead(String),

    /// A session operation was called out of order
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl RockError {
    /// The message without its category prefix, suitable for showing to a user.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Configuration(msg)
            | Self::UnsupportedMedia(msg)
            | Self::Extraction(msg)
            | Self::FileRead(msg)
            | Self::InvalidState(msg) => msg,
        }
    }

    /// Whether re-invoking the failed operation may succeed without any other change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Extraction(_))
    }
}

impl From<serde_json::Error> for RockError {
    fn from(e: serde_json::Error) -> Self {
        RockError::Extraction(format!("Failed to parse model response: {}", e))
    }
}

/// A specialized Result type for rock analysis operations.
pub type Result<T> = std::result::Result<T, RockError>;
