use async_trait::async_trait;
use serde_json::Value;

use crate::backend::usage::ExtractionResult;
use crate::backend::media::EncodedImage;
use crate::error::Result;
use crate::model::RockRecord;
use crate::schema::RockVariantTag;

/// RockExtractor is the interface for anything that turns a rock image into a
/// typed record.
///
/// The crate ships [`ExtractionClient`](crate::ExtractionClient), which calls an
/// OpenAI-compatible chat completions endpoint with a structured-output
/// constraint. The session state machine only depends on this trait, so a UI
/// can drive it with any implementation.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use rock_analyzer::{ExtractionClient, ExtractionConfig, ImageAsset, RockExtractor, RockVariantTag};
/// use std::path::Path;
///
/// let client = ExtractionClient::new(ExtractionConfig::from_env())?;
/// let image = ImageAsset::from_path(Path::new("limestone.jpg"))?;
///
/// let record = client.extract(RockVariantTag::Limestone, image.encoded()).await?;
/// println!("Fossils: {}", record.get("fossilContent").unwrap_or(""));
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait RockExtractor: Send + Sync {
    /// Analyze an encoded image against the schema for `tag`.
    ///
    /// Exactly one request is made per call; failures are returned, never retried.
    async fn extract(&self, tag: RockVariantTag, image: &EncodedImage) -> Result<RockRecord> {
        self.extract_with_metadata(tag, image)
            .await
            .map(|result| result.record)
    }

    /// Like `extract`, also returning token usage when the provider reports it.
    async fn extract_with_metadata(
        &self,
        tag: RockVariantTag,
        image: &EncodedImage,
    ) -> Result<ExtractionResult>;
}

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The single HTTP operation the extraction client needs: POST a JSON body with
/// a bearer credential.
///
/// Transport failures (connection refused, timeout, TLS) are returned as
/// `Err(RockError::Extraction)`; non-2xx responses are returned as `Ok` so the
/// caller can read the provider's error body.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(&self, url: &str, api_key: &str, body: &Value) -> Result<HttpResponse>;
}

/// [`HttpTransport`] over a `reqwest::Client`.
#[cfg(feature = "openai")]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

#[cfg(feature = "openai")]
impl ReqwestTransport {
    /// Build a transport whose requests time out after `timeout`, or never when `None`.
    pub fn new(timeout: Option<std::time::Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            crate::error::RockError::Configuration(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "openai")]
#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, api_key: &str, body: &Value) -> Result<HttpResponse> {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| crate::backend::utils::handle_http_error(e, "OpenAI"))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| crate::backend::utils::handle_http_error(e, "OpenAI"))?;
        Ok(HttpResponse { status, body })
    }
}
