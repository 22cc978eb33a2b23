pub mod client;
pub mod media;
pub mod openai;
pub mod usage;
pub mod utils;

#[cfg(feature = "openai")]
pub use client::ReqwestTransport;
pub use client::{HttpResponse, HttpTransport, RockExtractor};
pub use media::{EncodedImage, ImageAsset, MediaType, encode};
pub use openai::{ExtractionClient, ExtractionConfig, Model as OpenAIModel};
pub use usage::{ExtractionResult, TokenUsage};
