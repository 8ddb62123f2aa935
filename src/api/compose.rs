//! Request composition: assembling the ordered content-part list for one
//! model call from the session's inputs.  Pure — the composer never fails,
//! it only assembles what it is given.

use crate::session::{EncodedImage, SourceImage, StudioMode};

/// MIME type of exported mask rasters (the mask surface encodes PNG).
pub const MASK_MIME: &str = "image/png";

/// Instruction for pure text-to-image requests.
pub const GENERATE_SYSTEM_INSTRUCTION: &str = "You are an image generation AI. \
Your task is to produce an image from the user's text prompt. Do not chat; \
generate the requested image directly.";

/// Instruction for editing requests — also used when a locked character is
/// submitted as the implicit source image.
pub const EDIT_SYSTEM_INSTRUCTION: &str = "You are an image editing AI. \
Your task is to modify the provided image according to the user's text \
prompt. Do not chat; return the edited image directly.";

/// A content part in composed order: either prompt text or raw image bytes
/// tagged with a MIME type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Part {
    Text(String),
    Inline { mime: String, data: Vec<u8> },
}

impl Part {
    pub fn is_text(&self) -> bool {
        matches!(self, Part::Text(_))
    }

    fn inline(mime: &str, data: Vec<u8>) -> Self {
        Part::Inline {
            mime: mime.to_string(),
            data,
        }
    }
}

/// Assemble the ordered part list for a request.
///
/// - Generation without a locked character: `[text]`.
/// - Generation with one: `[locked image, text]` — the locked character is
///   submitted as an implicit edit-source image.
/// - Editing: `[source image, text]`, with the exported mask appended only
///   when one was supplied.
///
/// A missing source image in editing mode is a caller-side precondition
/// (guarded by the session controller before composition).
pub fn compose_parts(
    mode: StudioMode,
    prompt: &str,
    source: Option<&SourceImage>,
    mask_png: Option<Vec<u8>>,
    locked: Option<&EncodedImage>,
) -> Vec<Part> {
    let mut parts = Vec::new();
    match mode {
        StudioMode::Generation => {
            if let Some(character) = locked {
                parts.push(Part::inline(&character.mime, character.bytes.clone()));
            }
            parts.push(Part::Text(prompt.to_string()));
        }
        StudioMode::Editing => {
            if let Some(image) = source {
                parts.push(Part::inline(&image.mime, image.bytes.clone()));
            }
            parts.push(Part::Text(prompt.to_string()));
            if let Some(mask) = mask_png {
                parts.push(Part::inline(MASK_MIME, mask));
            }
        }
    }
    parts
}

/// The fixed system instruction for a request.  Editing tasks and
/// locked-character generation both use the editing instruction, since both
/// submit an image to be transformed.
pub fn system_instruction_for(mode: StudioMode, has_locked_character: bool) -> &'static str {
    match mode {
        StudioMode::Editing => EDIT_SYSTEM_INSTRUCTION,
        StudioMode::Generation if has_locked_character => EDIT_SYSTEM_INSTRUCTION,
        StudioMode::Generation => GENERATE_SYSTEM_INSTRUCTION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_512() -> SourceImage {
        SourceImage {
            bytes: vec![1, 2, 3, 4],
            mime: "image/jpeg".to_string(),
            width: 512,
            height: 512,
        }
    }

    fn locked_character() -> EncodedImage {
        EncodedImage {
            bytes: vec![9, 9, 9],
            mime: "image/png".to_string(),
        }
    }

    #[test]
    fn generation_without_character_is_a_single_text_part() {
        let parts = compose_parts(StudioMode::Generation, "a red panda", None, None, None);
        assert_eq!(parts, vec![Part::Text("a red panda".to_string())]);
    }

    #[test]
    fn generation_with_character_leads_with_its_image() {
        let character = locked_character();
        let parts = compose_parts(
            StudioMode::Generation,
            "same panda, on a bicycle",
            None,
            None,
            Some(&character),
        );
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0],
            Part::Inline {
                mime: "image/png".to_string(),
                data: vec![9, 9, 9],
            }
        );
        assert!(parts[1].is_text());
    }

    #[test]
    fn editing_without_mask_is_image_then_text() {
        let source = source_512();
        let parts = compose_parts(StudioMode::Editing, "add a hat", Some(&source), None, None);
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0],
            Part::Inline {
                mime: "image/jpeg".to_string(),
                data: vec![1, 2, 3, 4],
            }
        );
        assert_eq!(parts[1], Part::Text("add a hat".to_string()));
    }

    #[test]
    fn editing_with_mask_appends_it_last() {
        let source = source_512();
        let parts = compose_parts(
            StudioMode::Editing,
            "replace the sofa",
            Some(&source),
            Some(vec![7, 7]),
            None,
        );
        assert_eq!(parts.len(), 3);
        assert!(!parts[0].is_text());
        assert!(parts[1].is_text());
        assert_eq!(
            parts[2],
            Part::Inline {
                mime: MASK_MIME.to_string(),
                data: vec![7, 7],
            }
        );
    }

    #[test]
    fn locked_character_in_editing_mode_is_ignored() {
        let source = source_512();
        let character = locked_character();
        let parts = compose_parts(
            StudioMode::Editing,
            "add a hat",
            Some(&source),
            None,
            Some(&character),
        );
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0],
            Part::Inline {
                mime: "image/jpeg".to_string(),
                data: vec![1, 2, 3, 4],
            }
        );
    }

    #[test]
    fn instruction_follows_the_task_kind() {
        assert_eq!(
            system_instruction_for(StudioMode::Generation, false),
            GENERATE_SYSTEM_INSTRUCTION
        );
        assert_eq!(
            system_instruction_for(StudioMode::Generation, true),
            EDIT_SYSTEM_INSTRUCTION
        );
        assert_eq!(
            system_instruction_for(StudioMode::Editing, false),
            EDIT_SYSTEM_INSTRUCTION
        );
    }
}
