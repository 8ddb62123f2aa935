//! Session state: the one-request-at-a-time controller and the data model
//! shared across the app and the API layer.
//!
//! All mutation happens on the UI thread of control; the only concurrent
//! piece is the in-flight model call, which communicates back through
//! [`SessionController::complete`].

use std::fmt::{self, Display};

use crate::api::client::ModelRequest;
use crate::api::compose;
use crate::api::interpret::GenerateError;
use crate::mask::MaskSurface;

/// Which task the studio is performing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StudioMode {
    /// Text-to-image generation.
    #[default]
    Generation,
    /// Editing a loaded source image (optionally restricted by a mask).
    Editing,
}

impl StudioMode {
    pub fn label(&self) -> &'static str {
        match self {
            StudioMode::Generation => "Generate (Text-to-Image)",
            StudioMode::Editing => "Edit (Image + Text)",
        }
    }
}

/// Lifecycle of one submission.  Transitions only via the controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// A selected source image: the file's original encoded bytes (sent to the
/// model as-is) plus its probed MIME type and native pixel dimensions.
/// Replaced wholesale on a new selection; never mutated in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub width: u32,
    pub height: u32,
}

/// An encoded image payload — a generated result or a locked character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// The outcome of one completed request.  At most one exists at a time;
/// each new request replaces it, never merges.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeneratedContent {
    pub text: Option<String>,
    pub image: Option<EncodedImage>,
}

/// Why a submission could not start.  Validation variants are shown inline;
/// `AlreadySubmitting` is dropped silently (the UI also disables the
/// button while a request is in flight).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitError {
    AlreadySubmitting,
    EmptyPrompt,
    MissingSourceImage,
    MaskExport(String),
}

impl Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::AlreadySubmitting => write!(f, "A request is already in flight."),
            SubmitError::EmptyPrompt => write!(f, "Enter a prompt first."),
            SubmitError::MissingSourceImage => write!(f, "Load an image to edit first."),
            SubmitError::MaskExport(message) => write!(f, "Could not export the mask: {}", message),
        }
    }
}

/// Orchestrates one request at a time and owns everything the request is
/// composed from: mode, prompt, source image, mask surface and the locked
/// character carried across generations.
pub struct SessionController {
    mode: StudioMode,
    pub prompt: String,
    source: Option<SourceImage>,
    mask: MaskSurface,
    locked_character: Option<EncodedImage>,
    state: SessionState,
    result: Option<GeneratedContent>,
    error: Option<String>,
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            mode: StudioMode::default(),
            prompt: String::new(),
            source: None,
            mask: MaskSurface::new(),
            locked_character: None,
            state: SessionState::Idle,
            result: None,
            error: None,
        }
    }

    pub fn mode(&self) -> StudioMode {
        self.mode
    }

    /// Switch between generation and editing.  Leaving a terminal state
    /// discards the stored result and any mask content; the locked
    /// character is untouched.
    pub fn set_mode(&mut self, mode: StudioMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.discard_terminal_outcome();
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    /// Replace the source image wholesale.  The mask buffer is reallocated
    /// to the new image's native dimensions (clearing it), and any stored
    /// result from a previous request is discarded.
    pub fn set_source(&mut self, image: SourceImage) {
        self.mask.resize(image.width, image.height);
        self.source = Some(image);
        self.discard_terminal_outcome();
    }

    pub fn mask(&self) -> &MaskSurface {
        &self.mask
    }

    pub fn mask_mut(&mut self) -> &mut MaskSurface {
        &mut self.mask
    }

    pub fn locked_character(&self) -> Option<&EncodedImage> {
        self.locked_character.as_ref()
    }

    pub fn result(&self) -> Option<&GeneratedContent> {
        self.result.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Guarded transition into `Submitting`.
    ///
    /// Rejected while a request is in flight.  Validation requires a
    /// non-empty prompt and, in editing mode, a loaded source image; a
    /// guard failure leaves the state untouched.  On success the prior
    /// outcome is cleared and the fully composed request is returned for a
    /// worker to execute.
    pub fn begin_submission(&mut self) -> Result<ModelRequest, SubmitError> {
        if self.state == SessionState::Submitting {
            return Err(SubmitError::AlreadySubmitting);
        }
        if self.prompt.trim().is_empty() {
            return Err(SubmitError::EmptyPrompt);
        }
        if self.mode == StudioMode::Editing && self.source.is_none() {
            return Err(SubmitError::MissingSourceImage);
        }

        // The mask travels only when the user actually painted one.
        let mask_png = if self.mode == StudioMode::Editing && self.mask.has_content() {
            Some(self.mask.export_png().map_err(SubmitError::MaskExport)?)
        } else {
            None
        };

        let parts = compose::compose_parts(
            self.mode,
            &self.prompt,
            self.source.as_ref(),
            mask_png,
            self.locked_character.as_ref(),
        );
        let system_instruction =
            compose::system_instruction_for(self.mode, self.locked_character.is_some());

        self.result = None;
        self.error = None;
        self.state = SessionState::Submitting;
        Ok(ModelRequest {
            parts,
            system_instruction,
        })
    }

    /// Deliver the outcome of the in-flight request.  Ignored unless a
    /// request is actually in flight, so a stale completion can never
    /// clobber a fresh session.
    pub fn complete(&mut self, outcome: Result<GeneratedContent, GenerateError>) {
        if self.state != SessionState::Submitting {
            return;
        }
        match outcome {
            Ok(content) => {
                self.result = Some(content);
                self.state = SessionState::Succeeded;
            }
            Err(error) => {
                self.error = Some(error.to_string());
                self.state = SessionState::Failed;
            }
        }
    }

    /// True when the lock-character action is available: generation mode
    /// with an image in the last result.
    pub fn can_lock_character(&self) -> bool {
        self.mode == StudioMode::Generation
            && self
                .result
                .as_ref()
                .is_some_and(|content| content.image.is_some())
    }

    /// Store the last result's image as the locked character and return the
    /// display to a fresh idle state.  Returns false (and changes nothing)
    /// when the action is unavailable.
    pub fn lock_character(&mut self) -> bool {
        if !self.can_lock_character() {
            return false;
        }
        let image = self
            .result
            .as_ref()
            .and_then(|content| content.image.clone());
        let Some(image) = image else {
            return false;
        };
        self.locked_character = Some(image);
        self.result = None;
        self.error = None;
        self.state = SessionState::Idle;
        true
    }

    /// Clear the locked character.  Unconditional and idempotent.
    pub fn unlock_character(&mut self) {
        self.locked_character = None;
    }

    /// From `Succeeded`/`Failed`, drop the stored outcome and mask content
    /// and return to `Idle`.  No effect in other states.
    fn discard_terminal_outcome(&mut self) {
        if matches!(self.state, SessionState::Succeeded | SessionState::Failed) {
            self.result = None;
            self.error = None;
            self.mask.clear();
            self.state = SessionState::Idle;
        }
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}
