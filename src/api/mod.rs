// ============================================================================
// API MODULE — the hosted multimodal model boundary
// ============================================================================
//
// Architecture:
//   compose.rs   — ordered content-part assembly (pure; per-mode ordering)
//   types.rs     — serde wire types for generateContent requests/responses
//   interpret.rs — response extraction + the GenerateError taxonomy
//   client.rs    — ImageModel trait + blocking GeminiClient implementation
// ============================================================================

pub mod client;
pub mod compose;
pub mod interpret;
pub mod types;

pub use client::{GeminiClient, ImageModel, ModelRequest};
pub use compose::Part;
pub use interpret::GenerateError;
