//! The sticker creation flow.
//!
//! [`StickerFlow`] drives one user through upload, editing, generation and
//! touch-up, and keeps the history of finished stickers. Each action is only
//! valid in certain [`AppStatus`] values; anything else is rejected with
//! [`FlowError::InvalidAction`] and leaves the flow untouched.
//!
//! ```text
//! Idle -> Uploading -> Editing -> Ready -> Processing -> Success
//!                        ^  |       ^          |
//!                        |  v       |          v
//!                       (re-edit)   +--retry-- Error
//! ```

use thiserror::Error;

use crate::decode::{decode_source, DecodeError, SourceImage};
use crate::generate::{
    validate_response, CycleId, GeneratedBitmap, GenerationError, GenerationRequest,
    GenerationTracker, StickerGenerator, StylePreset,
};
use crate::history::{result_filename, StickerHistory};
use crate::matte::{matte_encoded, MatteError};
use crate::session::{EditSession, LoadOutcome, LoadTicket, NormalizedBitmap, SessionError};
use crate::{CompositorConfig, MatteConfig};

/// Where the user is in the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    Idle,
    Editing,
    Ready,
    Uploading,
    Processing,
    Success,
    Error,
}

impl AppStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppStatus::Idle => "idle",
            AppStatus::Editing => "editing",
            AppStatus::Ready => "ready",
            AppStatus::Uploading => "uploading",
            AppStatus::Processing => "processing",
            AppStatus::Success => "success",
            AppStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for AppStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from flow actions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("Cannot {action} while {status}")]
    InvalidAction {
        action: &'static str,
        status: AppStatus,
    },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Matte(#[from] MatteError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// A generation submitted by [`StickerFlow::begin_generation`].
#[derive(Debug, Clone)]
pub struct PendingGeneration {
    pub cycle: CycleId,
    pub style_id: u32,
    pub request: GenerationRequest,
}

/// Whether a generation response changed the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    Succeeded,
    Failed,
    /// The response belonged to an abandoned or superseded cycle
    Ignored,
}

/// State of the whole creation flow.
#[derive(Debug)]
pub struct StickerFlow {
    status: AppStatus,
    session: EditSession,
    matte_config: MatteConfig,
    /// The encoded upload, kept so the user can re-open the editor
    upload: Option<Vec<u8>>,
    normalized: Option<NormalizedBitmap>,
    result: Option<GeneratedBitmap>,
    result_style: Option<u32>,
    error: Option<String>,
    tracker: GenerationTracker,
    history: StickerHistory,
}

impl Default for StickerFlow {
    fn default() -> Self {
        Self::new(CompositorConfig::default(), MatteConfig::default())
    }
}

impl StickerFlow {
    pub fn new(compositor: CompositorConfig, matte_config: MatteConfig) -> Self {
        Self {
            status: AppStatus::Idle,
            session: EditSession::new(compositor),
            matte_config,
            upload: None,
            normalized: None,
            result: None,
            result_style: None,
            error: None,
            tracker: GenerationTracker::new(),
            history: StickerHistory::new(),
        }
    }

    /// Start with a previously stored history.
    pub fn with_history(mut self, history: StickerHistory) -> Self {
        self.history = history;
        self
    }

    pub fn status(&self) -> AppStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn normalized(&self) -> Option<&NormalizedBitmap> {
        self.normalized.as_ref()
    }

    pub fn result(&self) -> Option<&GeneratedBitmap> {
        self.result.as_ref()
    }

    pub fn history(&self) -> &StickerHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut StickerHistory {
        &mut self.history
    }

    /// The editing session, while the editor is open.
    pub fn editor(&mut self) -> Result<&mut EditSession, FlowError> {
        self.require("edit", &[AppStatus::Editing])?;
        Ok(&mut self.session)
    }

    /// Begin reading a new upload.
    pub fn begin_upload(&mut self, bytes: Vec<u8>) -> Result<LoadTicket, FlowError> {
        self.require(
            "upload",
            &[
                AppStatus::Idle,
                AppStatus::Uploading,
                AppStatus::Ready,
                AppStatus::Success,
                AppStatus::Error,
            ],
        )?;
        // Nothing from the previous upload survives a new one
        self.upload = Some(bytes);
        self.normalized = None;
        self.result = None;
        self.result_style = None;
        self.error = None;
        self.set_status(AppStatus::Uploading);
        Ok(self.session.begin_load())
    }

    /// The bytes of the upload in progress, for decoding against a ticket.
    pub fn upload_bytes(&self) -> Option<&[u8]> {
        self.upload.as_deref()
    }

    /// Finish an upload started with [`StickerFlow::begin_upload`].
    ///
    /// A decoded image opens the editor; a decode failure moves to
    /// [`AppStatus::Error`].
    pub fn finish_upload(
        &mut self,
        ticket: &LoadTicket,
        result: Result<SourceImage, DecodeError>,
    ) -> Result<LoadOutcome, FlowError> {
        match self.session.finish_load(ticket, result) {
            Ok(LoadOutcome::Applied) => {
                self.set_status(AppStatus::Editing);
                Ok(LoadOutcome::Applied)
            }
            Ok(LoadOutcome::Superseded) => Ok(LoadOutcome::Superseded),
            Err(e) => {
                self.upload = None;
                self.fail(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Upload and decode in one step.
    pub fn upload(&mut self, bytes: Vec<u8>) -> Result<(), FlowError> {
        let ticket = self.begin_upload(bytes)?;
        let result = match &self.upload {
            Some(bytes) => decode_source(bytes),
            None => Err(DecodeError::Empty),
        };
        self.finish_upload(&ticket, result).map(|_| ())
    }

    /// Close the editor without keeping the edit.
    pub fn cancel_edit(&mut self) -> Result<(), FlowError> {
        self.require("cancel editing", &[AppStatus::Editing])?;
        self.session.cancel();
        self.upload = None;
        self.set_status(AppStatus::Idle);
        Ok(())
    }

    /// Keep the edit as the bitmap to generate from.
    pub fn confirm_edit(&mut self) -> Result<&NormalizedBitmap, FlowError> {
        self.require("confirm editing", &[AppStatus::Editing])?;
        let bitmap = self.session.confirm()?;
        self.set_status(AppStatus::Ready);
        Ok(self.normalized.insert(bitmap))
    }

    /// Re-open the editor on the original upload, with a fresh transform.
    pub fn re_edit(&mut self) -> Result<(), FlowError> {
        self.require("re-edit", &[AppStatus::Ready, AppStatus::Error])?;
        let Some(upload) = self.upload.as_deref() else {
            return Err(self.invalid("re-edit"));
        };
        self.session.load(upload)?;
        self.set_status(AppStatus::Editing);
        Ok(())
    }

    /// Submit the confirmed bitmap for generation in `style`.
    ///
    /// Valid when ready, or after a failure to retry without re-uploading.
    pub fn begin_generation(&mut self, style: &StylePreset) -> Result<PendingGeneration, FlowError> {
        self.require("generate", &[AppStatus::Ready, AppStatus::Error])?;
        let Some(normalized) = &self.normalized else {
            return Err(self.invalid("generate"));
        };

        let request = GenerationRequest::new(normalized.png.clone(), style);
        let cycle = self.tracker.begin();
        self.result = None;
        self.result_style = None;
        self.error = None;
        self.set_status(AppStatus::Processing);

        Ok(PendingGeneration {
            cycle,
            style_id: style.id,
            request,
        })
    }

    /// Apply the service's answer to a pending generation.
    ///
    /// On success the sticker is added to the history. On failure the
    /// confirmed bitmap is kept for a retry.
    pub fn complete_generation(
        &mut self,
        pending: &PendingGeneration,
        response: Result<Vec<u8>, GenerationError>,
        timestamp_millis: u64,
    ) -> GenerationOutcome {
        if !self.tracker.complete(pending.cycle) {
            return GenerationOutcome::Ignored;
        }

        match response.and_then(validate_response) {
            Ok(bitmap) => {
                self.history
                    .add(bitmap.to_data_uri(), pending.style_id, timestamp_millis);
                self.result = Some(bitmap);
                self.result_style = Some(pending.style_id);
                self.set_status(AppStatus::Success);
                GenerationOutcome::Succeeded
            }
            Err(e) => {
                log::error!("generation failed: {e}");
                self.fail(e.to_string());
                GenerationOutcome::Failed
            }
        }
    }

    /// Submit, await and apply a generation.
    pub async fn generate<G: StickerGenerator>(
        &mut self,
        generator: &G,
        style: &StylePreset,
        timestamp_millis: u64,
    ) -> Result<GenerationOutcome, FlowError> {
        let pending = self.begin_generation(style)?;
        let response = generator.generate(&pending.request).await;
        Ok(self.complete_generation(&pending, response, timestamp_millis))
    }

    /// Clear near-white pixels of the current result.
    ///
    /// On failure the result is left as it was.
    pub fn magic_wand(&mut self) -> Result<&GeneratedBitmap, FlowError> {
        self.require("use the magic wand", &[AppStatus::Success])?;
        let Some(result) = self.result.as_mut() else {
            return Err(FlowError::InvalidAction {
                action: "use the magic wand",
                status: self.status,
            });
        };

        result.png = matte_encoded(&result.png, &self.matte_config)?;
        Ok(result)
    }

    /// File name for downloading the current result.
    pub fn download_filename(&self, timestamp_millis: u64) -> Option<String> {
        let style_id = self.result_style?;
        self.result.as_ref()?;
        Some(result_filename(style_id, timestamp_millis))
    }

    /// Drop the result and go back to choosing a style for the same bitmap.
    pub fn reuse(&mut self) -> Result<(), FlowError> {
        self.require("reuse the image", &[AppStatus::Success])?;
        self.result = None;
        self.result_style = None;
        self.set_status(AppStatus::Ready);
        Ok(())
    }

    /// Start over. The history is kept; any generation in flight is
    /// abandoned.
    pub fn reset(&mut self) {
        self.tracker.abandon();
        self.session.cancel();
        self.upload = None;
        self.normalized = None;
        self.result = None;
        self.result_style = None;
        self.error = None;
        self.set_status(AppStatus::Idle);
    }

    fn require(&self, action: &'static str, allowed: &[AppStatus]) -> Result<(), FlowError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> FlowError {
        FlowError::InvalidAction {
            action,
            status: self.status,
        }
    }

    fn fail(&mut self, message: String) {
        self.error = Some(message);
        self.set_status(AppStatus::Error);
    }

    fn set_status(&mut self, status: AppStatus) {
        if self.status != status {
            log::debug!("status {} -> {}", self.status, status);
        }
        self.status = status;
    }
}
