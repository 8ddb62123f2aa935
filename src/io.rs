//! File IO: picking and loading the source image, and saving a generated
//! result.  The file's original bytes are kept and transmitted as-is — the
//! decode here only validates the file and probes its native dimensions.

use rfd::FileDialog;
use std::fs;
use std::path::{Path, PathBuf};

use crate::session::{EncodedImage, SourceImage};

/// Fixed suggested filename for downloaded results.
pub const GENERATED_FILE_NAME: &str = "generated-image.png";

/// Extensions offered by the source-image picker.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp"];

/// Open the native file picker for a source image.  Returns `None` when the
/// user cancels.
pub fn pick_source_image() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("Image files", IMAGE_EXTENSIONS)
        .pick_file()
}

/// Read and validate a source image file.  The returned `SourceImage`
/// carries the encoded bytes untouched plus the probed pixel dimensions
/// (used to size the mask buffer 1:1 with the source).
pub fn load_source_image(path: &Path) -> Result<SourceImage, String> {
    let bytes = fs::read(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| format!("Failed to decode {}: {}", path.display(), e))?;
    Ok(SourceImage {
        width: decoded.width(),
        height: decoded.height(),
        mime: mime_for_path(path),
        bytes,
    })
}

/// MIME type from the file extension.  PNG is the fallback — the picker
/// filter only admits the extensions above.
pub fn mime_for_path(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "image/png",
    }
    .to_string()
}

/// Save a generated image via the native save dialog, suggesting the fixed
/// download filename.  Returns `Ok(None)` when the user cancels.
pub fn save_generated_image(image: &EncodedImage) -> Result<Option<PathBuf>, String> {
    let Some(path) = FileDialog::new()
        .set_file_name(GENERATED_FILE_NAME)
        .add_filter("Image files", IMAGE_EXTENSIONS)
        .save_file()
    else {
        return Ok(None);
    };
    fs::write(&path, &image.bytes)
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    Ok(Some(path))
}

/// Decode an encoded payload to RGBA for texture upload.
pub fn decode_rgba(bytes: &[u8]) -> Result<image::RgbaImage, String> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| format!("Failed to decode image: {}", e))
}
