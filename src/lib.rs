//! rock_analyzer: typed geological records from rock photographs
//!
//! # Overview
//!
//! rock_analyzer turns a photograph of a rock into a structured description of
//! its properties by asking a vision-capable model for output constrained to a
//! rock-type-specific JSON Schema. The same record can also be built from
//! manually entered values.
//!
//! Key pieces:
//! - Schema registry: one field set per rock type (granite, limestone, shale,
//!   slate, sandstone, other), all sharing seven base fields
//! - Image encoding: jpeg/png bytes to base64 with a declared MIME type
//! - Extraction client: one OpenAI structured-outputs request per analysis,
//!   decoded through a typed struct per rock type and re-checked against the schema
//! - Manual entry: the same record shape from a map of field values
//! - Presenter: labelled rows in display order
//! - Session: an explicit state machine tying the pieces together for a UI
//!
//! # Quick Start
//!
//! ```no_run
//! use rock_analyzer::{AnalysisSession, ExtractionClient, ExtractionConfig, ImageAsset, RockVariantTag};
//! use rock_analyzer::present::render_text;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ExtractionClient::new(ExtractionConfig::from_env())?;
//!
//!     let mut session = AnalysisSession::new(RockVariantTag::Sandstone);
//!     session.select_image(ImageAsset::from_path(Path::new("sandstone.jpg"))?)?;
//!
//!     let record = session.analyze(&client).await?;
//!     println!("{}", render_text(&record));
//!     Ok(())
//! }
//! ```
mod backend;
mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod model;
pub mod present;
pub mod schema;
pub mod session;

// Re-exports for convenience
pub use error::{Result, RockError};
pub use model::{RecordDecoder, RockAnalysis, RockRecord, build_record, decoder_for};
pub use schema::{
    FieldSpec, RockSchema, RockVariantTag, Schema, SchemaBuilder, fields_for, resolve_schema,
    resolve_schema_by_name,
};
pub use session::{AnalysisSession, SessionState};

#[cfg(feature = "openai")]
pub use backend::ReqwestTransport;
pub use backend::{
    EncodedImage, ExtractionClient, ExtractionConfig, ExtractionResult, HttpResponse,
    HttpTransport, ImageAsset, MediaType, OpenAIModel, RockExtractor, TokenUsage, encode,
};
