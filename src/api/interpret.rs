//! Response interpretation: reducing a raw model response to at most one
//! image payload plus any accompanying text, or a classified failure.

use std::fmt::{self, Display};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::types::GenerateContentResponse;
use crate::session::{EncodedImage, GeneratedContent};

/// Finish-reason marker the endpoint uses for safety-filter rejections.
const SAFETY_FINISH_REASON: &str = "SAFETY";

/// Classified failure of one generation request.  `Display` renders the
/// message shown in the UI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerateError {
    /// The safety filter rejected the request before producing content.
    ContentBlocked,
    /// The model responded, but without an image.  Carries any text it
    /// returned instead so the user can see what it said.
    NoImageReturned { text: Option<String> },
    /// The endpoint rejected the credential.
    Authentication(String),
    /// The endpoint returned a non-success HTTP status.
    Api { status: u16, message: String },
    /// Anything else: connection failures, malformed payloads.
    Transport(String),
}

impl Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::ContentBlocked => write!(
                f,
                "The request was blocked by the model's safety settings. Please revise your prompt and try again."
            ),
            GenerateError::NoImageReturned { text: Some(text) } => write!(
                f,
                "The model replied with text instead of an image: \"{}\"",
                text
            ),
            GenerateError::NoImageReturned { text: None } => write!(
                f,
                "The model did not return an image. Try revising the prompt or using a different image."
            ),
            GenerateError::Authentication(message) => write!(
                f,
                "Authentication with the model endpoint failed — check that your API key is set correctly. ({})",
                message
            ),
            GenerateError::Api { status, message } => {
                write!(f, "Model request failed (HTTP {}): {}", status, message)
            }
            GenerateError::Transport(message) => write!(f, "{}", message),
        }
    }
}

/// Extract the result from a deserialized response.
///
/// Only the first candidate is consulted.  A safety finish reason fails
/// immediately, before any part extraction.  Otherwise text parts are
/// concatenated in order and the *first* inline-binary part becomes the
/// image; later binary parts are ignored (at most one image is modeled).
pub fn interpret_response(
    response: &GenerateContentResponse,
) -> Result<GeneratedContent, GenerateError> {
    let candidate = response.candidates.first();

    if let Some(candidate) = candidate
        && candidate.finish_reason.as_deref() == Some(SAFETY_FINISH_REASON)
    {
        return Err(GenerateError::ContentBlocked);
    }

    let mut text = String::new();
    let mut image: Option<EncodedImage> = None;

    if let Some(content) = candidate.and_then(|c| c.content.as_ref()) {
        for part in &content.parts {
            if let Some(chunk) = &part.text {
                text.push_str(chunk);
            } else if let Some(inline) = &part.inline_data {
                if image.is_some() {
                    continue;
                }
                let bytes = BASE64.decode(&inline.data).map_err(|e| {
                    GenerateError::Transport(format!("Invalid image payload from model: {}", e))
                })?;
                image = Some(EncodedImage {
                    bytes,
                    mime: inline.mime_type.clone(),
                });
            }
        }
    }

    let text = if text.is_empty() { None } else { Some(text) };
    match image {
        Some(image) => Ok(GeneratedContent {
            text,
            image: Some(image),
        }),
        None => Err(GenerateError::NoImageReturned { text }),
    }
}
