//! The analysis session: one user's current rock type, image, manual-entry
//! values and result, driven through an explicit state machine.
//!
//! ```text
//! Idle ──select_image──▶ ImageSelected ──begin_extraction──▶ Extracting
//!   │                          ▲                               │
//!   │ submit_manual            │ select_image                  ├─ Ok  ──▶ Result
//!   ▼                          │                               └─ Err ──▶ Error
//! Result / Error ──────────────┘
//! ```
//!
//! Every transition replaces the state as a whole. A failed extraction keeps
//! the image and tag, so the caller can retry without selecting them again.
//! A cancelled extraction (`cancel_extraction`, or dropping the `analyze`
//! future) goes back to `ImageSelected`.

use std::collections::HashMap;
use std::mem;
use tracing::{debug, info, warn};

use crate::backend::{EncodedImage, ImageAsset, RockExtractor};
use crate::error::{Result, RockError};
use crate::model::{RockRecord, build_record};
use crate::schema::{FieldSpec, RockVariantTag, fields_for};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing selected yet
    #[default]
    Idle,
    /// An image is ready for analysis
    ImageSelected { image: ImageAsset },
    /// A request for this image is in flight
    Extracting { image: ImageAsset },
    /// A record was produced, by extraction or manual entry
    Result {
        image: Option<ImageAsset>,
        record: RockRecord,
    },
    /// The last operation failed; the image, if any, is kept for a retry
    Error {
        image: Option<ImageAsset>,
        message: String,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::ImageSelected { .. } => "image_selected",
            SessionState::Extracting { .. } => "extracting",
            SessionState::Result { .. } => "result",
            SessionState::Error { .. } => "error",
        }
    }

    /// The currently selected image, if any.
    pub fn image(&self) -> Option<&ImageAsset> {
        match self {
            SessionState::Idle => None,
            SessionState::ImageSelected { image } | SessionState::Extracting { image } => {
                Some(image)
            }
            SessionState::Result { image, .. } | SessionState::Error { image, .. } => {
                image.as_ref()
            }
        }
    }

    fn take_image(self) -> Option<ImageAsset> {
        match self {
            SessionState::Idle => None,
            SessionState::ImageSelected { image } | SessionState::Extracting { image } => {
                Some(image)
            }
            SessionState::Result { image, .. } | SessionState::Error { image, .. } => image,
        }
    }
}

/// A single user's analysis session.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSession {
    tag: RockVariantTag,
    form: HashMap<String, String>,
    state: SessionState,
}

impl AnalysisSession {
    pub fn new(tag: RockVariantTag) -> Self {
        Self {
            tag,
            form: HashMap::new(),
            state: SessionState::Idle,
        }
    }

    pub fn tag(&self) -> RockVariantTag {
        self.tag
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_extracting(&self) -> bool {
        matches!(self.state, SessionState::Extracting { .. })
    }

    /// The record shown to the user, if the session is in `Result`.
    pub fn record(&self) -> Option<&RockRecord> {
        match &self.state {
            SessionState::Result { record, .. } => Some(record),
            _ => None,
        }
    }

    /// The error message shown to the user, if the session is in `Error`.
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SessionState::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Manual-entry fields for the current tag.
    pub fn form_fields(&self) -> Vec<FieldSpec> {
        fields_for(self.tag)
    }

    /// Current manual-entry value for a field; empty when never set.
    pub fn field_value(&self, name: &str) -> &str {
        self.form.get(name).map(String::as_str).unwrap_or("")
    }

    fn ensure_not_extracting(&self, action: &str) -> Result<()> {
        if self.is_extracting() {
            warn!(action, "Rejected session change while extraction is pending");
            return Err(RockError::InvalidState(format!(
                "Cannot {} while an analysis is in progress",
                action
            )));
        }
        Ok(())
    }

    /// Switch rock type. Clears any manual-entry values.
    pub fn select_tag(&mut self, tag: RockVariantTag) -> Result<()> {
        self.ensure_not_extracting("change the rock type")?;
        debug!(previous = %self.tag, new = %tag, "Selecting rock type");
        self.tag = tag;
        self.form.clear();
        Ok(())
    }

    /// Replace the selected image, discarding any previous result or error.
    pub fn select_image(&mut self, image: ImageAsset) -> Result<()> {
        self.ensure_not_extracting("select a new image")?;
        debug!(
            media_type = %image.media_type(),
            len = image.bytes().len(),
            "Selecting image"
        );
        self.state = SessionState::ImageSelected { image };
        Ok(())
    }

    /// Record a manual-entry value.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.form.insert(name.into(), value.into());
    }

    /// Build a record from the manual-entry values and show it.
    pub fn submit_manual(&mut self) -> Result<RockRecord> {
        self.ensure_not_extracting("submit manual entry")?;
        let record = build_record(self.tag, &self.form);
        info!(tag = %self.tag, "Manual entry submitted");

        let image = mem::take(&mut self.state).take_image();
        self.state = SessionState::Result {
            image,
            record: record.clone(),
        };
        Ok(record)
    }

    /// Move to `Extracting` and hand back what the request needs.
    ///
    /// Fails when no image is selected or an extraction is already pending.
    pub fn begin_extraction(&mut self) -> Result<(RockVariantTag, EncodedImage)> {
        self.ensure_not_extracting("start another analysis")?;
        let image = match mem::take(&mut self.state) {
            SessionState::ImageSelected { image }
            | SessionState::Result {
                image: Some(image), ..
            }
            | SessionState::Error {
                image: Some(image), ..
            } => image,
            other => {
                self.state = other;
                return Err(RockError::InvalidState(
                    "Please upload an image first".to_string(),
                ));
            }
        };
        let encoded = image.encoded().clone();

        self.state = SessionState::Extracting { image };
        info!(tag = %self.tag, "Extraction started");
        Ok((self.tag, encoded))
    }

    /// Record the outcome of the pending extraction.
    pub fn finish_extraction(&mut self, outcome: Result<RockRecord>) -> Result<()> {
        if !self.is_extracting() {
            return Err(RockError::InvalidState(
                "No analysis is in progress".to_string(),
            ));
        }
        let image = mem::take(&mut self.state).take_image();

        self.state = match outcome {
            Ok(record) => {
                info!(rock_type = %record.rock_type(), "Extraction finished");
                SessionState::Result { image, record }
            }
            Err(err) => {
                warn!(error = %err, "Extraction failed");
                SessionState::Error {
                    image,
                    message: err.user_message().to_string(),
                }
            }
        };
        Ok(())
    }

    /// Abandon the pending extraction and go back to `ImageSelected` with the
    /// same image, so the caller can retry.
    pub fn cancel_extraction(&mut self) -> Result<()> {
        let image = match mem::take(&mut self.state) {
            SessionState::Extracting { image } => image,
            other => {
                self.state = other;
                return Err(RockError::InvalidState(
                    "No analysis is in progress".to_string(),
                ));
            }
        };
        info!(tag = %self.tag, "Extraction cancelled");
        self.state = SessionState::ImageSelected { image };
        Ok(())
    }

    /// Run one extraction for the selected image and tag.
    ///
    /// On failure the session moves to `Error` and the error is also returned.
    /// Dropping the returned future before it completes cancels the extraction.
    pub async fn analyze<E>(&mut self, extractor: &E) -> Result<RockRecord>
    where
        E: RockExtractor + ?Sized,
    {
        let (tag, encoded) = self.begin_extraction()?;
        let pending = PendingExtraction {
            session: Some(self),
        };
        let outcome = extractor.extract(tag, &encoded).await;
        pending.finish(outcome)
    }
}

/// Holds the session while an extraction is awaited and cancels it if dropped
/// before an outcome arrives.
struct PendingExtraction<'a> {
    session: Option<&'a mut AnalysisSession>,
}

impl PendingExtraction<'_> {
    fn finish(mut self, outcome: Result<RockRecord>) -> Result<RockRecord> {
        if let Some(session) = self.session.take() {
            session.finish_extraction(outcome.clone())?;
        }
        outcome
    }
}

impl Drop for PendingExtraction<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            warn!("Analysis dropped before completion");
            let _ = session.cancel_extraction();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ExtractionResult;
    use async_trait::async_trait;
    use std::future::Future;
    use std::task::{Context, Poll, Waker};

    fn image() -> ImageAsset {
        ImageAsset::from_bytes(vec![0x89, 0x50, 0x4e, 0x47], "png").unwrap()
    }

    #[test]
    fn test_begin_without_image_fails() {
        let mut session = AnalysisSession::new(RockVariantTag::Granite);
        let err = session.begin_extraction().unwrap_err();
        assert_eq!(
            err,
            RockError::InvalidState("Please upload an image first".to_string())
        );
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[test]
    fn test_second_begin_is_rejected() {
        let mut session = AnalysisSession::new(RockVariantTag::Granite);
        session.select_image(image()).unwrap();
        session.begin_extraction().unwrap();

        assert!(matches!(
            session.begin_extraction(),
            Err(RockError::InvalidState(_))
        ));
        assert!(session.is_extracting());
    }

    #[test]
    fn test_failure_keeps_image_and_tag() {
        let mut session = AnalysisSession::new(RockVariantTag::Shale);
        session.select_image(image()).unwrap();
        session.begin_extraction().unwrap();
        session
            .finish_extraction(Err(RockError::Extraction("rate limited".to_string())))
            .unwrap();

        assert_eq!(session.state().name(), "error");
        assert_eq!(session.error_message(), Some("rate limited"));
        assert_eq!(session.tag(), RockVariantTag::Shale);
        assert_eq!(session.state().image(), Some(&image()));

        // retry straight from the error state
        let (tag, encoded) = session.begin_extraction().unwrap();
        assert_eq!(tag, RockVariantTag::Shale);
        assert_eq!(encoded, *image().encoded());
    }

    #[test]
    fn test_select_tag_clears_form() {
        let mut session = AnalysisSession::new(RockVariantTag::Slate);
        session.set_field("cleavage", "good");
        session.select_tag(RockVariantTag::Limestone).unwrap();

        assert_eq!(session.field_value("cleavage"), "");
        assert_eq!(session.form_fields().len(), 8);
    }

    #[test]
    fn test_changes_rejected_while_extracting() {
        let mut session = AnalysisSession::new(RockVariantTag::Granite);
        session.select_image(image()).unwrap();
        session.begin_extraction().unwrap();

        assert!(session.select_tag(RockVariantTag::Slate).is_err());
        assert!(session.select_image(image()).is_err());
        assert!(session.submit_manual().is_err());
        assert_eq!(session.tag(), RockVariantTag::Granite);
    }

    struct PendingExtractor;

    #[async_trait]
    impl RockExtractor for PendingExtractor {
        async fn extract_with_metadata(
            &self,
            _tag: RockVariantTag,
            _image: &EncodedImage,
        ) -> Result<ExtractionResult> {
            std::future::pending().await
        }
    }

    struct FixedExtractor;

    #[async_trait]
    impl RockExtractor for FixedExtractor {
        async fn extract_with_metadata(
            &self,
            tag: RockVariantTag,
            _image: &EncodedImage,
        ) -> Result<ExtractionResult> {
            Ok(ExtractionResult::from_record(build_record(
                tag,
                &HashMap::new(),
            )))
        }
    }

    #[test]
    fn test_dropped_analysis_returns_to_image_selected() {
        let mut session = AnalysisSession::new(RockVariantTag::Slate);
        session.select_image(image()).unwrap();

        {
            let mut analysis = Box::pin(session.analyze(&PendingExtractor));
            let mut cx = Context::from_waker(Waker::noop());
            assert!(analysis.as_mut().poll(&mut cx).is_pending());
        }

        assert_eq!(
            session.state(),
            &SessionState::ImageSelected { image: image() }
        );
        assert_eq!(session.tag(), RockVariantTag::Slate);
        session.select_tag(RockVariantTag::Shale).unwrap();

        let mut retry = Box::pin(session.analyze(&FixedExtractor));
        let mut cx = Context::from_waker(Waker::noop());
        let Poll::Ready(outcome) = retry.as_mut().poll(&mut cx) else {
            panic!("fixed extractor should complete on first poll");
        };
        drop(retry);
        assert_eq!(outcome.unwrap().rock_type(), "shale");
        assert_eq!(session.state().name(), "result");
    }

    #[test]
    fn test_cancel_extraction() {
        let mut session = AnalysisSession::new(RockVariantTag::Granite);
        assert!(matches!(
            session.cancel_extraction(),
            Err(RockError::InvalidState(_))
        ));

        session.select_image(image()).unwrap();
        session.begin_extraction().unwrap();
        session.cancel_extraction().unwrap();

        assert!(!session.is_extracting());
        assert_eq!(session.state().image(), Some(&image()));
        assert!(session.begin_extraction().is_ok());
    }

    #[test]
    fn test_finish_without_begin_is_rejected() {
        let mut session = AnalysisSession::new(RockVariantTag::Granite);
        let record = build_record(RockVariantTag::Granite, &HashMap::new());
        assert!(matches!(
            session.finish_extraction(Ok(record)),
            Err(RockError::InvalidState(_))
        ));
    }
}
