//! The hosted-model client: a provider trait the session layer talks to,
//! plus the blocking HTTP implementation used by the app.  The blocking
//! client only ever runs on a background worker thread, never on the UI
//! thread.

use std::env;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::blocking::Client as HttpClient;

use super::compose::Part;
use super::interpret::{self, GenerateError};
use super::types::{
    Content, ErrorBody, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    InlineData, WirePart,
};
use crate::log_info;
use crate::session::GeneratedContent;

/// Multimodal model used for both generation and editing tasks.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image-preview";

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Image generation regularly takes tens of seconds.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Longest error-body excerpt carried into a user-facing message.
const ERROR_BODY_EXCERPT: usize = 512;

/// One fully composed request: the ordered parts plus the task's fixed
/// system instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelRequest {
    pub parts: Vec<Part>,
    pub system_instruction: &'static str,
}

/// The seam between the session layer and the hosted model.  The app
/// installs [`GeminiClient`]; tests substitute scripted implementations.
pub trait ImageModel: Send + Sync {
    fn generate(&self, request: &ModelRequest) -> Result<GeneratedContent, GenerateError>;
}

/// Blocking HTTP client for the `generateContent` endpoint.
pub struct GeminiClient {
    api_key: String,
    model: String,
    http: HttpClient,
}

impl GeminiClient {
    /// Read the credential from the environment.  Absence is a fatal
    /// startup condition handled by the caller.
    pub fn from_env() -> Result<Self, String> {
        let api_key = non_empty_env("GEMINI_API_KEY")
            .or_else(|| non_empty_env("API_KEY"))
            .ok_or_else(|| "GEMINI_API_KEY environment variable is not set".to_string())?;
        Ok(Self::new(api_key))
    }

    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            http: HttpClient::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", API_BASE, self.model)
    }

    /// Map composed parts onto the wire representation, base64-encoding
    /// inline binaries.
    fn build_payload(request: &ModelRequest) -> GenerateContentRequest {
        let parts = request
            .parts
            .iter()
            .map(|part| match part {
                Part::Text(text) => WirePart {
                    text: Some(text.clone()),
                    inline_data: None,
                },
                Part::Inline { mime, data } => WirePart {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: mime.clone(),
                        data: BASE64.encode(data),
                    }),
                },
            })
            .collect();

        GenerateContentRequest {
            contents: vec![Content { parts }],
            system_instruction: Content {
                parts: vec![WirePart {
                    text: Some(request.system_instruction.to_string()),
                    inline_data: None,
                }],
            },
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            },
        }
    }
}

impl ImageModel for GeminiClient {
    fn generate(&self, request: &ModelRequest) -> Result<GeneratedContent, GenerateError> {
        let payload = Self::build_payload(request);
        log_info!(
            "Submitting generateContent request to {} ({} part(s))",
            self.model,
            request.parts.len()
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .map_err(|e| {
                GenerateError::Transport(format!("Request to model endpoint failed: {}", e))
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            let error = classify_http_failure(status, &body);
            log_info!("generateContent failed: HTTP {}", status);
            return Err(error);
        }

        let parsed: GenerateContentResponse = response.json().map_err(|e| {
            GenerateError::Transport(format!("Failed to decode model response: {}", e))
        })?;
        let content = interpret::interpret_response(&parsed)?;
        log_info!(
            "Model returned image: {}, text: {}",
            content.image.is_some(),
            content.text.is_some()
        );
        Ok(content)
    }
}

/// Classify a non-success HTTP status using the endpoint's JSON error body
/// when present, falling back to the raw body text.
fn classify_http_failure(status: u16, body: &str) -> GenerateError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_default();
    let message = if detail.message.is_empty() {
        truncate_text(body, ERROR_BODY_EXCERPT)
    } else {
        detail.message
    };

    let unauthenticated = status == 401
        || status == 403
        || detail.status == "UNAUTHENTICATED"
        || message.contains("API key");
    if unauthenticated {
        GenerateError::Authentication(message)
    } else {
        GenerateError::Api { status, message }
    }
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_parts_in_order_with_encoded_binaries() {
        let request = ModelRequest {
            parts: vec![
                Part::Inline {
                    mime: "image/jpeg".to_string(),
                    data: vec![0xDE, 0xAD],
                },
                Part::Text("add a hat".to_string()),
            ],
            system_instruction: "edit the image",
        };
        let payload = GeminiClient::build_payload(&request);

        assert_eq!(payload.contents.len(), 1);
        let parts = &payload.contents[0].parts;
        assert_eq!(parts.len(), 2);
        let inline = parts[0].inline_data.as_ref().expect("inline first");
        assert_eq!(inline.mime_type, "image/jpeg");
        assert_eq!(inline.data, BASE64.encode([0xDE, 0xAD]));
        assert_eq!(parts[1].text.as_deref(), Some("add a hat"));

        assert_eq!(
            payload.system_instruction.parts[0].text.as_deref(),
            Some("edit the image")
        );
        assert_eq!(
            payload.generation_config.response_modalities,
            vec!["IMAGE", "TEXT"]
        );
    }

    #[test]
    fn payload_serializes_to_camel_case_json() {
        let request = ModelRequest {
            parts: vec![Part::Inline {
                mime: "image/png".to_string(),
                data: vec![1],
            }],
            system_instruction: "generate",
        };
        let json = serde_json::to_value(GeminiClient::build_payload(&request)).expect("serialize");

        assert!(json.get("systemInstruction").is_some());
        assert!(json.get("generationConfig").is_some());
        let part = &json["contents"][0]["parts"][0];
        assert!(part.get("inlineData").is_some());
        assert!(part["inlineData"].get("mimeType").is_some());
        // The unset text field is omitted entirely.
        assert!(part.get("text").is_none());
    }

    #[test]
    fn unauthenticated_status_classifies_as_authentication() {
        let body = r#"{"error":{"message":"Request had invalid credentials.","status":"UNAUTHENTICATED"}}"#;
        match classify_http_failure(400, body) {
            GenerateError::Authentication(message) => {
                assert!(message.contains("invalid credentials"));
            }
            other => panic!("expected Authentication, got {:?}", other),
        }
    }

    #[test]
    fn http_403_classifies_as_authentication() {
        match classify_http_failure(403, "forbidden") {
            GenerateError::Authentication(_) => {}
            other => panic!("expected Authentication, got {:?}", other),
        }
    }

    #[test]
    fn other_failures_keep_status_and_message() {
        let body = r#"{"error":{"message":"Resource exhausted.","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            classify_http_failure(429, body),
            GenerateError::Api {
                status: 429,
                message: "Resource exhausted.".to_string()
            }
        );
    }

    #[test]
    fn unparsable_error_bodies_fall_back_to_the_raw_text() {
        match classify_http_failure(500, "<html>oops</html>") {
            GenerateError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "<html>oops</html>");
            }
            other => panic!("expected Api, got {:?}", other),
        }
    }
}
