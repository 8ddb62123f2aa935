//! End-to-end session scenarios: the controller driving a scripted model
//! through the same composition and interpretation path the app uses.

use std::sync::atomic::{AtomicUsize, Ordering};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::ImageEncoder;
use serde_json::json;

use studiofe::api::client::{ImageModel, ModelRequest};
use studiofe::api::compose::EDIT_SYSTEM_INSTRUCTION;
use studiofe::api::interpret::{GenerateError, interpret_response};
use studiofe::api::types::GenerateContentResponse;
use studiofe::session::{
    GeneratedContent, SessionController, SessionState, SourceImage, StudioMode, SubmitError,
};

/// Scripted stand-in for the hosted model.  Responses flow through the same
/// interpreter the real client uses, and calls are counted so tests can
/// assert how many requests were actually executed.
struct ScriptedModel {
    response: serde_json::Value,
    calls: AtomicUsize,
}

impl ScriptedModel {
    fn new(response: serde_json::Value) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageModel for ScriptedModel {
    fn generate(&self, _request: &ModelRequest) -> Result<GeneratedContent, GenerateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let parsed: GenerateContentResponse =
            serde_json::from_value(self.response.clone()).expect("scripted response JSON");
        interpret_response(&parsed)
    }
}

/// A valid 512×512 PNG photo, as a loaded source image.
fn photo_512() -> SourceImage {
    let rgba = image::RgbaImage::from_pixel(512, 512, image::Rgba([90, 120, 150, 255]));
    let mut png = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png)
        .write_image(rgba.as_raw(), 512, 512, image::ColorType::Rgba8)
        .expect("encode test photo");
    SourceImage {
        bytes: png,
        mime: "image/png".to_string(),
        width: 512,
        height: 512,
    }
}

fn one_image_response() -> serde_json::Value {
    json!({
        "candidates": [{
            "finishReason": "STOP",
            "content": { "parts": [
                { "inlineData": { "mimeType": "image/png", "data": BASE64.encode([7u8, 8, 9]) } }
            ]}
        }]
    })
}

#[test]
fn editing_without_mask_runs_idle_to_succeeded() {
    let model = ScriptedModel::new(one_image_response());
    let mut session = SessionController::new();
    session.set_mode(StudioMode::Editing);
    session.set_source(photo_512());
    session.prompt = "add a hat".to_string();
    assert_eq!(session.state(), SessionState::Idle);

    // No mask drawn: the composed request is [image, text].
    let request = session.begin_submission().expect("submit");
    assert_eq!(request.parts.len(), 2);
    assert_eq!(request.system_instruction, EDIT_SYSTEM_INSTRUCTION);
    assert_eq!(session.state(), SessionState::Submitting);

    let outcome = model.generate(&request);
    session.complete(outcome);

    assert_eq!(session.state(), SessionState::Succeeded);
    let image = session
        .result()
        .and_then(|content| content.image.as_ref())
        .expect("image result");
    assert_eq!(image.bytes, vec![7, 8, 9]);
    assert_eq!(image.mime, "image/png");
}

#[test]
fn submitting_while_in_flight_never_composes_a_second_request() {
    let model = ScriptedModel::new(one_image_response());
    let mut session = SessionController::new();
    session.prompt = "a lighthouse at dusk".to_string();

    let request = session.begin_submission().expect("first submit");

    // A second click while the first request is outstanding is a no-op.
    assert_eq!(
        session.begin_submission(),
        Err(SubmitError::AlreadySubmitting)
    );

    let outcome = model.generate(&request);
    session.complete(outcome);

    assert_eq!(model.calls(), 1);
    assert_eq!(session.state(), SessionState::Succeeded);
}

#[test]
fn safety_rejection_lands_in_failed_with_a_revise_message() {
    let model = ScriptedModel::new(json!({
        "candidates": [{ "finishReason": "SAFETY" }]
    }));
    let mut session = SessionController::new();
    session.prompt = "something questionable".to_string();

    let request = session.begin_submission().expect("submit");
    session.complete(model.generate(&request));

    assert_eq!(session.state(), SessionState::Failed);
    let message = session.error_message().expect("failure message");
    assert!(message.contains("safety"));
}

#[test]
fn text_only_reply_surfaces_the_model_text_in_the_failure() {
    let model = ScriptedModel::new(json!({
        "candidates": [{
            "finishReason": "STOP",
            "content": { "parts": [{ "text": "I can only describe this scene." }] }
        }]
    }));
    let mut session = SessionController::new();
    session.prompt = "draw the indescribable".to_string();

    let request = session.begin_submission().expect("submit");
    session.complete(model.generate(&request));

    assert_eq!(session.state(), SessionState::Failed);
    let message = session.error_message().expect("failure message");
    assert!(message.contains("I can only describe this scene."));
}

#[test]
fn locked_character_is_carried_into_the_next_generation() {
    let model = ScriptedModel::new(one_image_response());
    let mut session = SessionController::new();
    session.prompt = "a knight with a red plume".to_string();

    let request = session.begin_submission().expect("submit");
    session.complete(model.generate(&request));
    assert!(session.lock_character());
    assert_eq!(session.state(), SessionState::Idle);

    session.prompt = "the same knight, resting by a campfire".to_string();
    let request = session.begin_submission().expect("second submit");
    assert_eq!(request.parts.len(), 2);
    assert!(!request.parts[0].is_text());
    assert_eq!(request.system_instruction, EDIT_SYSTEM_INSTRUCTION);

    session.complete(model.generate(&request));
    assert_eq!(session.state(), SessionState::Succeeded);
    // The lock persists across requests until explicitly cleared.
    assert!(session.locked_character().is_some());
    session.unlock_character();
    assert!(session.locked_character().is_none());
}
