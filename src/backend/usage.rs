use crate::model::RockRecord;

/// Token usage information from a model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUsage {
    /// The model used for this request
    pub model: String,
    /// Number of tokens in the input/prompt
    pub input_tokens: u64,
    /// Number of tokens in the output/completion
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(model: impl Into<String>, input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            model: model.into(),
            input_tokens,
            output_tokens,
        }
    }

    /// Total tokens used (input + output)
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// A record together with the usage reported for the call that produced it.
///
/// ```no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use rock_analyzer::{ExtractionClient, ExtractionConfig, ImageAsset, RockExtractor, RockVariantTag};
/// use std::path::Path;
///
/// let client = ExtractionClient::new(ExtractionConfig::from_env())?;
/// let image = ImageAsset::from_path(Path::new("granite.png"))?;
/// let result = client
///     .extract_with_metadata(RockVariantTag::Granite, image.encoded())
///     .await?;
///
/// if let Some(usage) = &result.usage {
///     println!("{} used {} tokens", usage.model, usage.total_tokens());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub record: RockRecord,
    /// Token usage (if available from the provider)
    pub usage: Option<TokenUsage>,
}

impl ExtractionResult {
    pub fn new(record: RockRecord, usage: Option<TokenUsage>) -> Self {
        Self { record, usage }
    }

    pub fn from_record(record: RockRecord) -> Self {
        Self {
            record,
            usage: None,
        }
    }
}
