use egui::{Color32, ColorImage};
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, Rgba, RgbaImage};
use rayon::prelude::*;

/// Stroke color for painted mask regions (rose, 70% alpha) so the source
/// image stays visible underneath.
const MASK_COLOR: Rgba<u8> = Rgba([225, 29, 72, 179]);

/// Brush diameter limits, in buffer pixels.
pub const MIN_BRUSH_SIZE: f32 = 1.0;
pub const MAX_BRUSH_SIZE: f32 = 100.0;
pub const DEFAULT_BRUSH_SIZE: f32 = 40.0;

/// Whether strokes composite coverage or remove it.  A standing flag on the
/// surface, not a per-call argument.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BrushMode {
    /// Composite the mask color over existing content.
    #[default]
    Paint,
    /// Clear existing content along the stroke path, leaving transparency.
    Erase,
}

impl BrushMode {
    pub fn label(&self) -> &'static str {
        match self {
            BrushMode::Paint => "Brush",
            BrushMode::Erase => "Eraser",
        }
    }
}

/// A raster paint surface for authoring an inpainting mask.
///
/// The buffer always matches the loaded source image's *native* resolution,
/// so mask coordinates map 1:1 to source pixels regardless of how the image
/// is scaled on screen.  Strokes are connected polylines rendered with a
/// round cap/join by stamping circles densely along each segment.
pub struct MaskSurface {
    buffer: RgbaImage,
    mode: BrushMode,
    brush_size: f32,
    has_content: bool,
    /// Previous stroke point (buffer coordinates) while a stroke is active.
    last_point: Option<(f32, f32)>,
    /// Set by any mutation; consumed by the UI to re-upload the overlay texture.
    dirty: bool,
}

impl MaskSurface {
    pub fn new() -> Self {
        Self {
            buffer: RgbaImage::new(1, 1),
            mode: BrushMode::Paint,
            brush_size: DEFAULT_BRUSH_SIZE,
            has_content: false,
            last_point: None,
            dirty: true,
        }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn mode(&self) -> BrushMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: BrushMode) {
        self.mode = mode;
    }

    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    pub fn brush_size_mut(&mut self) -> &mut f32 {
        &mut self.brush_size
    }

    pub fn set_brush_size(&mut self, size: f32) {
        self.brush_size = size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE);
    }

    /// Reallocate the buffer to the given dimensions, discarding all content.
    /// Called whenever a new source image is loaded, with that image's native
    /// (not displayed) resolution.  Zero dimensions are clamped to 1×1.
    pub fn resize(&mut self, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        self.buffer = RgbaImage::new(width, height);
        self.has_content = false;
        self.last_point = None;
        self.dirty = true;
    }

    /// Map a point in display coordinates (relative to the drawn widget) to
    /// buffer coordinates, using the ratio of buffer resolution to displayed
    /// element size.
    pub fn display_to_buffer(&self, point: (f32, f32), display_size: (f32, f32)) -> (f32, f32) {
        let (dw, dh) = display_size;
        if dw <= 0.0 || dh <= 0.0 {
            return point;
        }
        let scale_x = self.buffer.width() as f32 / dw;
        let scale_y = self.buffer.height() as f32 / dh;
        (point.0 * scale_x, point.1 * scale_y)
    }

    /// Anchor a new stroke at `point` (buffer coordinates).  Nothing is
    /// rasterized until the stroke is extended, so a click without movement
    /// leaves the buffer untouched.
    pub fn begin_stroke(&mut self, point: (f32, f32)) {
        self.last_point = Some(point);
    }

    /// Extend the active stroke to `point`, rasterizing the connecting
    /// segment with the current mode and brush size.  In paint mode this is
    /// what commits mask content; erase movement never sets the content flag.
    pub fn extend_stroke(&mut self, point: (f32, f32)) {
        let from = self.last_point.unwrap_or(point);
        self.draw_segment(from, point);
        self.last_point = Some(point);
        if self.mode == BrushMode::Paint {
            self.has_content = true;
        }
        self.dirty = true;
    }

    /// Finish the active stroke.  The next `extend_stroke` after a bare
    /// `end_stroke` starts from its own point.
    pub fn end_stroke(&mut self) {
        self.last_point = None;
    }

    /// True once any paint stroke has been committed since the last
    /// `clear`/`resize`.  The flag is sticky: erasing — even back to a
    /// visually empty buffer — does not reset it.
    pub fn has_content(&self) -> bool {
        self.has_content
    }

    /// Reset to the fully transparent state.
    pub fn clear(&mut self) {
        for pixel in self.buffer.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
        self.has_content = false;
        self.last_point = None;
        self.dirty = true;
    }

    /// Returns true (once) after any mutation since the last call — the UI
    /// uses this to know when the overlay texture must be re-uploaded.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Serialize the current buffer as a lossless PNG for transmission.
    /// Callers skip mask inclusion entirely when `has_content()` is false.
    pub fn export_png(&self) -> Result<Vec<u8>, String> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(
                self.buffer.as_raw(),
                self.buffer.width(),
                self.buffer.height(),
                image::ColorType::Rgba8,
            )
            .map_err(|e| format!("Failed to encode mask PNG: {}", e))?;
        Ok(out)
    }

    /// Convert the buffer to an egui image for the on-canvas overlay.
    /// Row conversion is parallelised; at 4K this is a few million pixels.
    pub fn to_color_image(&self) -> ColorImage {
        let (w, h) = self.buffer.dimensions();
        let pixels: Vec<Color32> = self
            .buffer
            .as_raw()
            .par_chunks_exact(4)
            .map(|px| Color32::from_rgba_unmultiplied(px[0], px[1], px[2], px[3]))
            .collect();
        ColorImage {
            size: [w as usize, h as usize],
            pixels,
        }
    }

    // ---- rasterization ------------------------------------------------------

    /// Stamp circles densely along the segment for a round cap/join result.
    fn draw_segment(&mut self, from: (f32, f32), to: (f32, f32)) {
        let dx = to.0 - from.0;
        let dy = to.1 - from.1;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance < 0.1 {
            self.stamp_circle(to.0, to.1);
            return;
        }

        // One stamp per pixel of travel keeps the capsule edge smooth.
        let steps = distance.ceil() as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.stamp_circle(from.0 + dx * t, from.1 + dy * t);
        }
    }

    /// Rasterize one circular brush footprint at `(cx, cy)`.
    ///
    /// Paint keeps the maximum alpha seen per pixel, so overlapping stamps
    /// within a stroke do not darken beyond the mask color.  Erase clears
    /// pixels whose center falls inside the footprint.
    fn stamp_circle(&mut self, cx: f32, cy: f32) {
        let radius = (self.brush_size * 0.5).max(0.5);
        let (w, h) = self.buffer.dimensions();

        let min_x = (cx - radius - 1.0).floor().max(0.0);
        let min_y = (cy - radius - 1.0).floor().max(0.0);
        let max_x = (cx + radius + 1.0).ceil().min(w as f32 - 1.0);
        let max_y = (cy + radius + 1.0).ceil().min(h as f32 - 1.0);
        if max_x < min_x || max_y < min_y {
            return;
        }

        for y in min_y as u32..=max_y as u32 {
            for x in min_x as u32..=max_x as u32 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist > radius + 0.5 {
                    continue;
                }
                // ~1px linear falloff at the rim in place of full AA.
                let coverage = (radius + 0.5 - dist).clamp(0.0, 1.0);
                let pixel = self.buffer.get_pixel_mut(x, y);
                match self.mode {
                    BrushMode::Paint => {
                        let alpha = (MASK_COLOR[3] as f32 * coverage).round() as u8;
                        if alpha >= pixel[3] {
                            *pixel = Rgba([MASK_COLOR[0], MASK_COLOR[1], MASK_COLOR[2], alpha]);
                        }
                    }
                    BrushMode::Erase => {
                        if coverage >= 0.5 {
                            *pixel = Rgba([0, 0, 0, 0]);
                        }
                    }
                }
            }
        }
    }

    #[cfg(test)]
    fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.buffer.get_pixel(x, y)[3]
    }

    #[cfg(test)]
    fn is_fully_transparent(&self) -> bool {
        self.buffer.pixels().all(|p| p[3] == 0)
    }
}

impl Default for MaskSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(w: u32, h: u32) -> MaskSurface {
        let mut mask = MaskSurface::new();
        mask.resize(w, h);
        mask
    }

    #[test]
    fn paint_stroke_sets_content_flag_and_pixels() {
        let mut mask = surface(64, 64);
        assert!(!mask.has_content());

        mask.begin_stroke((10.0, 32.0));
        mask.extend_stroke((50.0, 32.0));
        mask.end_stroke();

        assert!(mask.has_content());
        // The capsule midpoint is fully covered at full stroke alpha.
        assert_eq!(mask.alpha_at(30, 32), 179);
        // Far corners stay transparent.
        assert_eq!(mask.alpha_at(0, 0), 0);
        assert_eq!(mask.alpha_at(63, 63), 0);
    }

    #[test]
    fn begin_without_extend_commits_nothing() {
        let mut mask = surface(32, 32);
        mask.begin_stroke((16.0, 16.0));
        mask.end_stroke();
        assert!(!mask.has_content());
        assert!(mask.is_fully_transparent());
    }

    #[test]
    fn erase_removes_pixels_but_content_flag_is_sticky() {
        let mut mask = surface(64, 64);
        mask.begin_stroke((10.0, 32.0));
        mask.extend_stroke((50.0, 32.0));
        mask.end_stroke();
        assert!(mask.has_content());

        // Erase with a brush wide enough to wipe the whole stroke.
        mask.set_mode(BrushMode::Erase);
        mask.set_brush_size(MAX_BRUSH_SIZE);
        mask.begin_stroke((0.0, 32.0));
        mask.extend_stroke((63.0, 32.0));
        mask.end_stroke();

        assert!(mask.is_fully_transparent());
        // Chosen policy: erasing back to empty does NOT reset the flag.
        assert!(mask.has_content());
    }

    #[test]
    fn erase_only_activity_never_sets_content_flag() {
        let mut mask = surface(32, 32);
        mask.set_mode(BrushMode::Erase);
        mask.begin_stroke((4.0, 4.0));
        mask.extend_stroke((28.0, 28.0));
        mask.end_stroke();
        assert!(!mask.has_content());
    }

    #[test]
    fn resize_always_clears_prior_content() {
        let mut mask = surface(64, 64);
        mask.begin_stroke((10.0, 10.0));
        mask.extend_stroke((20.0, 20.0));
        assert!(mask.has_content());

        mask.resize(128, 96);
        assert!(!mask.has_content());
        assert!(mask.is_fully_transparent());
        assert_eq!((mask.width(), mask.height()), (128, 96));
    }

    #[test]
    fn clear_resets_content_and_flag() {
        let mut mask = surface(48, 48);
        mask.begin_stroke((24.0, 24.0));
        mask.extend_stroke((30.0, 24.0));
        mask.clear();
        assert!(!mask.has_content());
        assert!(mask.is_fully_transparent());
    }

    #[test]
    fn display_points_rescale_to_buffer_resolution() {
        let mask = surface(512, 512);
        // Shown at half width and quarter height.
        let mapped = mask.display_to_buffer((128.0, 64.0), (256.0, 128.0));
        assert_eq!(mapped, (256.0, 256.0));
    }

    #[test]
    fn strokes_outside_the_buffer_are_clipped() {
        let mut mask = surface(32, 32);
        mask.begin_stroke((-50.0, -50.0));
        mask.extend_stroke((100.0, 100.0));
        mask.end_stroke();
        // Passes through the buffer diagonally without panicking.
        assert!(mask.has_content());
        assert!(mask.alpha_at(16, 16) > 0);
    }

    #[test]
    fn export_produces_decodable_png_at_native_resolution() {
        let mut mask = surface(40, 30);
        mask.begin_stroke((10.0, 15.0));
        mask.extend_stroke((30.0, 15.0));
        let png = mask.export_png().expect("encode");

        let decoded = image::load_from_memory(&png).expect("decode").to_rgba8();
        assert_eq!(decoded.dimensions(), (40, 30));
        assert_eq!(decoded.get_pixel(20, 15)[3], 179);
    }
}
