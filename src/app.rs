use eframe::egui;
use egui::{Color32, ColorImage, Rect, RichText, Stroke, TextureHandle, TextureOptions, Vec2};
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::api::client::{GeminiClient, ImageModel, ModelRequest};
use crate::components::guide::GuidePanel;
use crate::io;
use crate::log_warn;
use crate::mask::{BrushMode, MAX_BRUSH_SIZE, MIN_BRUSH_SIZE};
use crate::prompts;
use crate::session::{
    GeneratedContent, SessionController, SessionState, StudioMode, SubmitError,
};

// ============================================================================
// ASYNC GENERATION PIPELINE — one background request, channel completion
// ============================================================================

/// Outcome delivered from the background generation thread.
type GenerationOutcome = Result<GeneratedContent, crate::api::GenerateError>;

/// Largest edge of the displayed source/result images, in points.
const PREVIEW_MAX_EDGE: f32 = 512.0;

/// Edge length of the locked-character thumbnail in the banner.
const LOCKED_THUMB_EDGE: f32 = 48.0;

pub struct StudioApp {
    session: SessionController,
    model: Arc<GeminiClient>,

    // Async generation pipeline
    gen_sender: mpsc::Sender<GenerationOutcome>,
    gen_receiver: mpsc::Receiver<GenerationOutcome>,
    /// Time the in-flight request started (for the elapsed-seconds readout).
    submit_started: Option<Instant>,

    /// Inline notice: validation failures, IO errors, save confirmations.
    notice: Option<String>,

    /// Name of the currently loaded source file, shown under the canvas.
    source_name: Option<String>,

    // Texture caches — rebuilt only when the underlying bytes change.
    source_texture: Option<TextureHandle>,
    mask_texture: Option<TextureHandle>,
    result_texture: Option<TextureHandle>,
    locked_texture: Option<TextureHandle>,

    guide: GuidePanel,
}

impl StudioApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, model: GeminiClient) -> Self {
        let (gen_sender, gen_receiver) = mpsc::channel();
        Self {
            session: SessionController::new(),
            model: Arc::new(model),
            gen_sender,
            gen_receiver,
            submit_started: None,
            notice: None,
            source_name: None,
            source_texture: None,
            mask_texture: None,
            result_texture: None,
            locked_texture: None,
            guide: GuidePanel::default(),
        }
    }

    // ---- submission ---------------------------------------------------------

    fn submit(&mut self, ctx: &egui::Context) {
        match self.session.begin_submission() {
            Ok(request) => {
                self.notice = None;
                self.result_texture = None;
                self.submit_started = Some(Instant::now());
                self.spawn_generation(ctx, request);
            }
            // The button is disabled while submitting; drop stray clicks.
            Err(SubmitError::AlreadySubmitting) => {}
            Err(error) => self.notice = Some(error.to_string()),
        }
    }

    fn spawn_generation(&self, ctx: &egui::Context, request: ModelRequest) {
        let model = Arc::clone(&self.model);
        let sender = self.gen_sender.clone();
        let repaint_ctx = ctx.clone();
        std::thread::spawn(move || {
            let outcome = model.generate(&request);
            let _ = sender.send(outcome);
            repaint_ctx.request_repaint();
        });
    }

    fn poll_generation(&mut self, ctx: &egui::Context) {
        while let Ok(outcome) = self.gen_receiver.try_recv() {
            self.session.complete(outcome);
            self.submit_started = None;
            self.result_texture = self
                .session
                .result()
                .and_then(|content| content.image.as_ref())
                .and_then(|image| texture_from_bytes(ctx, "result", &image.bytes));
        }
    }

    // ---- panels -------------------------------------------------------------

    fn show_tab_bar(&mut self, ui: &mut egui::Ui) {
        let mut mode = self.session.mode();
        ui.horizontal(|ui| {
            ui.heading("StudioFE");
            ui.separator();
            ui.selectable_value(&mut mode, StudioMode::Generation, StudioMode::Generation.label());
            ui.selectable_value(&mut mode, StudioMode::Editing, StudioMode::Editing.label());
        });
        if mode != self.session.mode() {
            self.session.set_mode(mode);
            self.notice = None;
            // The mode switch may have discarded a terminal result and
            // cleared the mask; drop the matching textures.
            if self.session.result().is_none() {
                self.result_texture = None;
            }
            self.mask_texture = None;
        }
    }

    fn show_editing_inputs(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Load image…").clicked() {
                self.pick_and_load_source(ui.ctx());
            }
            if let Some(name) = &self.source_name {
                ui.label(RichText::new(name).weak());
            }
        });

        if self.session.source().is_none() {
            ui.label(
                RichText::new("Select the image to edit; paint over it to restrict the edit to a region.")
                    .weak(),
            );
            return;
        }

        ui.add_space(6.0);
        self.show_mask_toolbar(ui);
        ui.add_space(4.0);
        self.show_mask_canvas(ui);
        ui.label(RichText::new("Paint the parts of the image you want changed.").weak());
    }

    fn pick_and_load_source(&mut self, ctx: &egui::Context) {
        let Some(path) = io::pick_source_image() else {
            return;
        };
        match io::load_source_image(&path) {
            Ok(image) => {
                self.source_texture = texture_from_bytes(ctx, "source", &image.bytes);
                self.source_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned());
                self.session.set_source(image);
                self.mask_texture = None;
                self.result_texture = None;
                self.notice = None;
            }
            Err(error) => {
                log_warn!("Source image load failed: {}", error);
                self.notice = Some(error);
            }
        }
    }

    fn show_mask_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Masking tools:");
            let mask = self.session.mask_mut();
            ui.add(
                egui::Slider::new(mask.brush_size_mut(), MIN_BRUSH_SIZE..=MAX_BRUSH_SIZE)
                    .text("Brush size"),
            );
            let mode = mask.mode();
            if ui
                .selectable_label(mode == BrushMode::Paint, BrushMode::Paint.label())
                .clicked()
            {
                mask.set_mode(BrushMode::Paint);
            }
            if ui
                .selectable_label(mode == BrushMode::Erase, BrushMode::Erase.label())
                .clicked()
            {
                mask.set_mode(BrushMode::Erase);
            }
            if ui.button("Clear mask").clicked() {
                mask.clear();
            }
        });
    }

    /// The source preview with the mask overlay on top.  Drags paint into
    /// the mask buffer after rescaling to its native resolution.
    fn show_mask_canvas(&mut self, ui: &mut egui::Ui) {
        let Some(source_texture) = self.source_texture.clone() else {
            return;
        };
        let (buffer_w, buffer_h) = {
            let mask = self.session.mask();
            (mask.width() as f32, mask.height() as f32)
        };

        let display = fit_size(buffer_w, buffer_h, ui.available_width().min(PREVIEW_MAX_EDGE));
        let (rect, response) = ui.allocate_exact_size(display, egui::Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        painter.image(source_texture.id(), rect, uv_full(), Color32::WHITE);

        // Pointer events, rescaled from display to buffer coordinates.
        if let Some(pos) = response.interact_pointer_pos() {
            let local = (pos.x - rect.min.x, pos.y - rect.min.y);
            let mask = self.session.mask_mut();
            let point = mask.display_to_buffer(local, (rect.width(), rect.height()));
            if response.drag_started() {
                mask.begin_stroke(point);
            } else if response.dragged() {
                mask.extend_stroke(point);
            }
        }
        if response.drag_released() {
            self.session.mask_mut().end_stroke();
        }

        // Re-upload the overlay texture only after the buffer changed.
        if self.session.mask_mut().take_dirty() || self.mask_texture.is_none() {
            let overlay = self.session.mask().to_color_image();
            self.mask_texture =
                Some(ui.ctx()
                    .load_texture("mask-overlay", overlay, TextureOptions::LINEAR));
        }
        if let Some(mask_texture) = &self.mask_texture {
            painter.image(mask_texture.id(), rect, uv_full(), Color32::WHITE);
        }

        // Brush outline under the cursor, scaled to the display.
        if let Some(hover) = response.hover_pos() {
            let scale = rect.width() / buffer_w;
            let radius = self.session.mask().brush_size() * 0.5 * scale;
            painter.circle_stroke(hover, radius, Stroke::new(1.0, Color32::WHITE));
        }
    }

    fn show_locked_banner(&mut self, ui: &mut egui::Ui) {
        if self.session.locked_character().is_none() {
            return;
        }
        self.ensure_locked_texture(ui.ctx());
        let mut unlock = false;
        ui.group(|ui| {
            ui.horizontal(|ui| {
                if let Some(texture) = &self.locked_texture {
                    let sized = egui::load::SizedTexture::from_handle(texture);
                    ui.add(
                        egui::Image::from_texture(sized)
                            .fit_to_exact_size(Vec2::splat(LOCKED_THUMB_EDGE)),
                    );
                }
                ui.vertical(|ui| {
                    ui.label(RichText::new("Character lock active").strong());
                    ui.label(
                        RichText::new("New prompts will generate images based on this character.")
                            .weak(),
                    );
                });
                if ui.button("Unlock").clicked() {
                    unlock = true;
                }
            });
        });
        if unlock {
            self.session.unlock_character();
            self.locked_texture = None;
        }
    }

    fn ensure_locked_texture(&mut self, ctx: &egui::Context) {
        if self.locked_texture.is_some() {
            return;
        }
        self.locked_texture = self
            .session
            .locked_character()
            .and_then(|character| texture_from_bytes(ctx, "locked-character", &character.bytes));
    }

    fn show_prompt_editor(&mut self, ui: &mut egui::Ui) {
        let hint = match self.session.mode() {
            StudioMode::Generation => "Describe the image you want to generate…",
            StudioMode::Editing => "Describe how the image should be edited…",
        };
        ui.add(
            egui::TextEdit::multiline(&mut self.session.prompt)
                .hint_text(hint)
                .desired_rows(5)
                .desired_width(f32::INFINITY),
        );
    }

    fn show_submit_button(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let submitting = self.session.state() == SessionState::Submitting;
        let label = match self.session.mode() {
            StudioMode::Generation => "Generate",
            StudioMode::Editing => "Edit",
        };
        let button = egui::Button::new(RichText::new(label).strong())
            .min_size(Vec2::new(ui.available_width(), 32.0));
        if ui.add_enabled(!submitting, button).clicked() {
            self.submit(ctx);
        }
    }

    fn show_result_area(&mut self, ui: &mut egui::Ui) {
        match self.session.state() {
            SessionState::Submitting => {
                let elapsed = self
                    .submit_started
                    .map(|started| started.elapsed().as_secs())
                    .unwrap_or(0);
                let message = match self.session.mode() {
                    StudioMode::Generation => "Generating image…",
                    StudioMode::Editing => "Editing image…",
                };
                ui.vertical_centered(|ui| {
                    ui.add_space(24.0);
                    ui.add(egui::Spinner::new().size(32.0));
                    ui.label(format!("{} ({}s)", message, elapsed));
                });
            }
            SessionState::Failed => {
                if let Some(message) = self.session.error_message() {
                    ui.colored_label(Color32::from_rgb(248, 113, 113), message);
                }
            }
            SessionState::Succeeded => self.show_result_content(ui),
            SessionState::Idle => self.show_idle_placeholder(ui),
        }
    }

    fn show_result_content(&mut self, ui: &mut egui::Ui) {
        if let Some(texture) = self.result_texture.clone() {
            let size = texture.size_vec2();
            let display = fit_size(size.x, size.y, ui.available_width().min(PREVIEW_MAX_EDGE));
            ui.vertical_centered(|ui| {
                let sized = egui::load::SizedTexture::from_handle(&texture);
                ui.add(egui::Image::from_texture(sized).fit_to_exact_size(display));
            });

            ui.add_space(6.0);
            let mut lock_requested = false;
            let mut download_requested = false;
            ui.horizontal(|ui| {
                if ui.button("Download image").clicked() {
                    download_requested = true;
                }
                if self.session.can_lock_character()
                    && self.session.locked_character().is_none()
                    && ui.button("Lock character").clicked()
                {
                    lock_requested = true;
                }
            });
            if download_requested {
                self.download_result();
            }
            if lock_requested && self.session.lock_character() {
                self.result_texture = None;
                self.locked_texture = None;
            }
        }

        if let Some(text) = self.session.result().and_then(|content| content.text.clone()) {
            ui.add_space(6.0);
            ui.group(|ui| {
                ui.label(text);
            });
        }
    }

    fn download_result(&mut self) {
        let Some(image) = self
            .session
            .result()
            .and_then(|content| content.image.clone())
        else {
            return;
        };
        match io::save_generated_image(&image) {
            Ok(Some(path)) => self.notice = Some(format!("Saved to {}", path.display())),
            Ok(None) => {} // user cancelled the dialog
            Err(error) => {
                log_warn!("Image save failed: {}", error);
                self.notice = Some(error);
            }
        }
    }

    fn show_idle_placeholder(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(24.0);
            if self.session.mode() == StudioMode::Generation
                && self.session.locked_character().is_some()
            {
                self.ensure_locked_texture(ui.ctx());
                if let Some(texture) = self.locked_texture.clone() {
                    let sized = egui::load::SizedTexture::from_handle(&texture);
                    ui.add(egui::Image::from_texture(sized).fit_to_exact_size(Vec2::splat(96.0)));
                }
                ui.label("Locked character ready.");
                ui.label(RichText::new("Enter a new prompt to place it in another scene.").weak());
            } else {
                ui.label(RichText::new("Results will appear here.").weak());
            }
        });
    }
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_generation(ctx);
        if self.session.state() == SessionState::Submitting {
            // Keep the spinner and elapsed-seconds readout moving.
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::TopBottomPanel::top("tab_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            self.show_tab_bar(ui);
            ui.add_space(4.0);
        });

        egui::SidePanel::right("prompt_guide")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                let examples = match self.session.mode() {
                    StudioMode::Generation => prompts::generation_prompts(),
                    StudioMode::Editing => prompts::editing_prompts(),
                };
                if let Some(prompt) = self.guide.show(ui, examples) {
                    self.session.prompt = prompt.to_string();
                }
            });

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(RichText::new("Powered by a hosted multimodal image model.").weak());
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    match self.session.mode() {
                        StudioMode::Editing => self.show_editing_inputs(ui),
                        StudioMode::Generation => self.show_locked_banner(ui),
                    }
                    ui.add_space(8.0);
                    self.show_prompt_editor(ui);
                    ui.add_space(8.0);
                    self.show_submit_button(ui, ctx);
                    if let Some(notice) = self.notice.clone() {
                        ui.add_space(4.0);
                        ui.colored_label(Color32::from_rgb(252, 211, 77), notice);
                    }
                    ui.add_space(8.0);
                    ui.separator();
                    self.show_result_area(ui);
                });
        });
    }
}

// ---- helpers ----------------------------------------------------------------

/// Scale `(w, h)` to fit `max_edge` on its longest side, preserving aspect.
fn fit_size(w: f32, h: f32, max_edge: f32) -> Vec2 {
    if w <= 0.0 || h <= 0.0 {
        return Vec2::splat(max_edge);
    }
    let scale = (max_edge / w).min(max_edge / h).min(1.0);
    Vec2::new(w * scale, h * scale)
}

fn uv_full() -> Rect {
    Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0))
}

/// Decode an encoded image payload and upload it as an egui texture.
/// Returns `None` (with a log line) when the payload cannot be decoded.
fn texture_from_bytes(ctx: &egui::Context, name: &str, bytes: &[u8]) -> Option<TextureHandle> {
    match io::decode_rgba(bytes) {
        Ok(rgba) => {
            let size = [rgba.width() as usize, rgba.height() as usize];
            let color = ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
            Some(ctx.load_texture(name, color, TextureOptions::LINEAR))
        }
        Err(error) => {
            log_warn!("Texture upload for '{}' failed: {}", name, error);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_size_preserves_aspect_and_never_upscales() {
        let fitted = fit_size(1024.0, 512.0, 512.0);
        assert_eq!(fitted, Vec2::new(512.0, 256.0));

        // Smaller images are shown at native size.
        let native = fit_size(100.0, 60.0, 512.0);
        assert_eq!(native, Vec2::new(100.0, 60.0));
    }
}
