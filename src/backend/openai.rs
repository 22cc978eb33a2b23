use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::backend::client::{HttpTransport, RockExtractor};
use crate::backend::media::{EncodedImage, OpenAIMessageContent, build_image_message_content};
use crate::backend::usage::{ExtractionResult, TokenUsage};
use crate::backend::utils::{check_response_status, extract_json_from_markdown};
use crate::error::{Result, RockError};
use crate::model::decoder_for;
use crate::schema::{RockVariantTag, SCHEMA_NAME, resolve_schema};

/// Default endpoint base for the OpenAI API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Vision-capable models that support structured outputs.
///
/// Any other model name can be used through `Custom` or `FromStr`:
///
/// ```rust
/// use rock_analyzer::OpenAIModel;
/// use std::str::FromStr;
///
/// let model = OpenAIModel::from_str("gpt-4o-2024-08-06").unwrap();
/// assert_eq!(model.as_str(), "gpt-4o-2024-08-06");
/// assert_eq!(OpenAIModel::from_str("gpt-4o").unwrap(), OpenAIModel::Gpt4O);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Model {
    #[default]
    Gpt4O,
    Gpt4OMini,
    Gpt41,
    Gpt41Mini,
    /// Custom model name (for newer models or OpenAI-compatible endpoints)
    Custom(String),
}

impl Model {
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gpt4O => "gpt-4o",
            Model::Gpt4OMini => "gpt-4o-mini",
            Model::Gpt41 => "gpt-4.1",
            Model::Gpt41Mini => "gpt-4.1-mini",
            Model::Custom(name) => name,
        }
    }

    /// Create a model from a string. Unknown names become `Custom`.
    pub fn from_string(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.as_str() {
            "gpt-4o" => Model::Gpt4O,
            "gpt-4o-mini" => Model::Gpt4OMini,
            "gpt-4.1" => Model::Gpt41,
            "gpt-4.1-mini" => Model::Gpt41Mini,
            _ => Model::Custom(name),
        }
    }
}

impl FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Model::from_string(s))
    }
}

impl From<&str> for Model {
    fn from(s: &str) -> Self {
        Model::from_string(s)
    }
}

/// Configuration injected into [`ExtractionClient`].
///
/// The credential is optional here so a client can be constructed before one
/// is available; [`RockExtractor::extract`] fails with a configuration error
/// if it is still missing when called.
#[derive(Clone)]
pub struct ExtractionConfig {
    pub api_key: Option<String>,
    pub model: Model,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// `None` disables the timeout
    pub timeout: Option<Duration>,
    /// Custom base URL for OpenAI-compatible APIs.
    /// Defaults to "https://api.openai.com/v1" if not set
    pub base_url: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: Model::default(),
            temperature: 0.0,
            max_tokens: None,
            timeout: Some(DEFAULT_TIMEOUT),
            base_url: None,
        }
    }
}

impl std::fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ExtractionConfig {
    /// Configuration with the given credential and defaults for everything else.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::default().api_key(api_key)
    }

    /// Read configuration from the environment.
    ///
    /// - `OPENAI_API_KEY`: credential (left unset when missing or empty)
    /// - `OPENAI_BASE_URL`: endpoint base for OpenAI-compatible servers
    /// - `ROCK_ANALYZER_MODEL`: model name
    #[instrument(name = "extraction_config_from_env")]
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let mut config = Self::default();
        config.api_key = read("OPENAI_API_KEY");
        if config.api_key.is_none() {
            warn!("OPENAI_API_KEY is not set; extraction will fail until a key is configured");
        }
        config.base_url = read("OPENAI_BASE_URL");
        if let Some(model) = read("ROCK_ANALYZER_MODEL") {
            config.model = Model::from_string(model);
        }
        debug!(model = %config.model.as_str(), base_url = ?config.base_url, "Loaded configuration from environment");
        config
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn model(mut self, model: impl Into<Model>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the temperature (0.0 to 1.0, lower = more deterministic)
    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = temp;
        self
    }

    /// Set the maximum tokens to generate
    pub fn max_tokens(mut self, max: u32) -> Self {
        // Ensure max_tokens is at least 1 to avoid API errors
        self.max_tokens = Some(max.max(1));
        self
    }

    /// Set the timeout for each HTTP request, or `None` to wait indefinitely.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL without trailing slash (e.g., "http://localhost:1234/v1")
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn completions_url(&self) -> String {
        let base = self
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        format!("{}/chat/completions", base)
    }

    /// The credential if present and non-blank.
    fn credential(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => {
                error!("Extraction attempted without an API key");
                Err(RockError::Configuration(
                    "OpenAI API key not found. Set OPENAI_API_KEY or configure ExtractionConfig::api_key.".to_string(),
                ))
            }
        }
    }
}

// OpenAI API request and response structures
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: OpenAIMessageContent,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    schema: Value,
    strict: bool,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct ResponseMessage {
    role: Option<String>,
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    usage: Option<UsageInfo>,
    model: Option<String>,
}

pub(crate) fn system_prompt(tag: RockVariantTag) -> String {
    format!(
        "You are an expert geologist who analyzes rock images and provides detailed structured information about {} rocks.",
        tag
    )
}

pub(crate) fn user_prompt(tag: RockVariantTag) -> String {
    format!(
        "Analyze this rock image and provide detailed information about this {} rock.",
        tag
    )
}

/// Client that analyzes rock images through OpenAI structured outputs.
///
/// Holds no per-call state: every [`extract`](RockExtractor::extract) builds
/// and sends exactly one request.
pub struct ExtractionClient {
    config: ExtractionConfig,
    transport: Arc<dyn HttpTransport>,
}

impl ExtractionClient {
    /// Create a client that talks HTTP through reqwest.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use rock_analyzer::{ExtractionClient, ExtractionConfig, OpenAIModel};
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = ExtractionClient::new(
    ///     ExtractionConfig::new("your-openai-api-key").model(OpenAIModel::Gpt4OMini),
    /// )?;
    /// # Ok(())
    /// # }
    /// ```
    #[cfg(feature = "openai")]
    #[instrument(name = "extraction_client_new", skip(config), fields(model = %config.model.as_str()))]
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        let transport = crate::backend::client::ReqwestTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client using configuration from the environment.
    #[cfg(feature = "openai")]
    pub fn from_env() -> Result<Self> {
        Self::new(ExtractionConfig::from_env())
    }

    /// Create a client over a caller-supplied transport.
    pub fn with_transport(config: ExtractionConfig, transport: Arc<dyn HttpTransport>) -> Self {
        info!(
            model = %config.model.as_str(),
            temperature = config.temperature,
            max_tokens = ?config.max_tokens,
            timeout = ?config.timeout,
            has_api_key = config.api_key.is_some(),
            "Created extraction client"
        );
        Self { config, transport }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Request body for one analysis.
    pub(crate) fn build_request(&self, tag: RockVariantTag, image: &EncodedImage) -> Result<Value> {
        let schema = resolve_schema(tag);
        trace!(tag = %tag, schema_name = SCHEMA_NAME, "Retrieved JSON schema for rock type");

        let request = ChatCompletionRequest {
            model: self.config.model.as_str().to_string(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: OpenAIMessageContent::Text(system_prompt(tag)),
                },
                ChatMessage {
                    role: "user",
                    content: build_image_message_content(&user_prompt(tag), image),
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: SCHEMA_NAME.to_string(),
                    schema: schema.json_schema().schema,
                    strict: true,
                },
            },
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        Ok(serde_json::to_value(&request)?)
    }

    fn parse_completion(&self, tag: RockVariantTag, body: &str) -> Result<ExtractionResult> {
        let completion: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
            error!(error = %e, "Failed to parse JSON response from OpenAI");
            RockError::Extraction(format!("Malformed response from OpenAI: {}", e))
        })?;

        let model_name = completion
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.as_str().to_string());
        let usage = completion
            .usage
            .as_ref()
            .map(|u| TokenUsage::new(model_name, u.prompt_tokens, u.completion_tokens));

        let Some(choice) = completion.choices.into_iter().next() else {
            error!("OpenAI returned empty choices array");
            return Err(RockError::Extraction(
                "No completion choices returned".to_string(),
            ));
        };
        trace!(finish_reason = ?choice.finish_reason, "Completion finish reason");

        if let Some(refusal) = choice.message.refusal.filter(|r| !r.is_empty()) {
            warn!(refusal = %refusal, "Model refused the analysis");
            return Err(RockError::Extraction(format!(
                "Model refused to analyze the image: {}",
                refusal
            )));
        }

        let Some(content) = choice.message.content else {
            error!("No content in OpenAI response");
            return Err(RockError::Extraction(
                "No content in response".to_string(),
            ));
        };
        debug!(content_len = content.len(), "Received structured output response");

        let json = extract_json_from_markdown(&content);
        let value: Value = serde_json::from_str(&json).map_err(|e| {
            error!(error = %e, content = %content, "Structured output is not valid JSON");
            RockError::Extraction(format!("Model response is not valid JSON: {}", e))
        })?;

        let record = decoder_for(tag).decode(value)?;
        Ok(ExtractionResult::new(record, usage))
    }
}

#[async_trait]
impl RockExtractor for ExtractionClient {
    #[instrument(
        name = "openai_extract",
        skip(self, image),
        fields(
            tag = %tag,
            model = %self.config.model.as_str(),
            media_type = %image.media_type(),
            image_len = image.data().len()
        )
    )]
    async fn extract_with_metadata(
        &self,
        tag: RockVariantTag,
        image: &EncodedImage,
    ) -> Result<ExtractionResult> {
        let api_key = self.config.credential()?;
        info!("Analyzing rock image with OpenAI structured outputs");

        let request = self.build_request(tag, image)?;
        let url = self.config.completions_url();
        debug!(url = %url, "Sending request to OpenAI API");

        let response = self.transport.post_json(&url, api_key, &request).await?;
        let response = check_response_status(response, "OpenAI")?;
        debug!("Successfully received response from OpenAI");

        let result = self.parse_completion(tag, &response.body)?;
        info!(
            rock_type = %result.record.rock_type(),
            "Successfully extracted rock analysis"
        );
        Ok(result)
    }
}
